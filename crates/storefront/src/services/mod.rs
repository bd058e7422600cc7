//! Shopper state containers.
//!
//! # Services
//!
//! - `cart` - Cart lines aggregated by product, persisted
//! - `favorites` - Saved products with set semantics, persisted
//! - `search` - Last query and its results, memory-only
//! - `auth` - Simulated sign-in, persisted user
//! - `checkout` - Checkout step machine and the last order
//!
//! Each container is a plain synchronous object. [`AppState`](crate::state::AppState)
//! owns one of each behind a mutex; handlers never hold a guard across an
//! `.await`.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod favorites;
pub mod search;

pub use auth::{AuthError, AuthService, AuthState, AuthStatus};
pub use cart::{CartService, CartState};
pub use checkout::{
    CartSnapshot, CheckoutError, CheckoutService, CheckoutStep, CheckoutView, FieldErrors,
};
pub use favorites::FavoritesService;
pub use search::{SearchService, SearchState};
