//! Temp order store.
//!
//! Checkout data has to survive until the payment gateway calls back, which
//! may be minutes later. Each pending order is one pretty-printed JSON file
//! named after its order id.
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_store::TempOrderStore;
//!
//! let store = TempOrderStore::new(".temp_orders");
//!
//! store.save(&order).await?;
//! let order = store.get("AstroShop-1712590000000-abc123").await?;
//! store.delete("AstroShop-1712590000000-abc123").await?;
//! ```

mod error;
mod store;

pub use error::StoreError;
pub use store::{StoredOrder, TempOrderStore, DEFAULT_TEMP_DIR};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{StoreError, StoredOrder, TempOrderStore};
}
