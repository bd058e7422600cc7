//! Domain models for the storefront.
//!
//! These are the records the state containers own and persist: cart lines,
//! favorites, the simulated user, and checkout/order records.

pub mod cart;
pub mod order;
pub mod user;

pub use cart::{CartItem, CartProduct, FavoriteItem};
pub use order::{Order, OrderTotals, ShippingAddress};
pub use user::AuthUser;
