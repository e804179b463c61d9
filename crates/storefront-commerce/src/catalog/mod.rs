//! Product catalog module.
//!
//! Contains the product type and the in-memory catalog the storefront
//! serves.

mod catalog;
mod product;

pub use catalog::Catalog;
pub use product::{Product, VariantType};
