//! Domain types and logic for the storefront.
//!
//! This crate has no I/O. It provides:
//!
//! - **Catalog**: products with variants, filtering and search
//! - **Cart**: the client-owned cart and its pricing
//! - **Checkout**: customer details validation and the Chilean region directory
//! - **Order**: order ids, pending orders and normalised payment confirmations
//! - **Sheet**: the spreadsheet row written for every paid order
//!
//! # Example
//!
//! ```rust
//! use storefront_commerce::prelude::*;
//!
//! let catalog = Catalog::builtin();
//! let product = catalog.get("1").unwrap();
//!
//! let mut cart = Cart::new();
//! cart.add_item(CartItem::for_product(product, Some("M")));
//! cart.add_item(CartItem::for_product(product, Some("M")));
//!
//! assert_eq!(cart.item_count(), 2);
//! assert_eq!(format_clp(cart.subtotal().unwrap().amount_minor as f64), "59.980");
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod order;
pub mod sheet;

pub use error::CommerceError;
pub use ids::*;
pub use money::{format_clp, Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::{format_clp, Currency, Money};

    // Catalog
    pub use crate::catalog::{Catalog, Product, VariantType};

    // Cart
    pub use crate::cart::{Cart, CartItem, CartPricing, MAX_QUANTITY_PER_ITEM};

    // Checkout
    pub use crate::checkout::{
        regions, CheckoutRequest, CustomerDetails, FieldErrors, FlowCheckoutRequest,
        PreferenceItem,
    };

    // Orders
    pub use crate::order::{Gateway, OrderId, PaymentConfirmation, PaymentStatus, PendingOrder};

    // Spreadsheet rows
    pub use crate::sheet::{CellValue, SheetColumn, SheetRow, MISSING_VALUE};
}
