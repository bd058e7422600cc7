//! Kiosk Core - Shared types library.
//!
//! This crate provides common types used across the Kiosk components:
//! - `storefront` - The storefront service (state containers and JSON API)
//! - `integration-tests` - HTTP-level tests for the storefront
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage
//! access, no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product records, type-safe IDs, prices, emails, card checks, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
