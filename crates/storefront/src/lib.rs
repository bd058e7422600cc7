//! Kiosk storefront library.
//!
//! Shopper-facing state containers (cart, favorites, search, simulated
//! sign-in, checkout) behind a JSON API, plus the catalog and payment
//! processor clients they depend on. The binary in `main.rs` only wires
//! configuration, tracing, and the listener around [`routes::app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
