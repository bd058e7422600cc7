//! Core types for Kiosk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod card;
pub mod email;
pub mod id;
pub mod price;
pub mod product;
pub mod status;

pub use card::{CardBrand, CardCheck, ExpiryDate};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use product::{Product, Rating};
pub use status::*;
