//! Shopping cart module.
//!
//! The cart lives on the client; these types mirror its operations so the
//! server can price and validate what the client submits.

mod cart;
mod pricing;

pub use cart::{Cart, CartItem, MAX_QUANTITY_PER_ITEM};
pub use pricing::{CartPricing, LineItemPricing};
