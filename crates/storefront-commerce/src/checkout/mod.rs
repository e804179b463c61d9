//! Checkout module.
//!
//! Customer details entered at checkout, their validation, and the request
//! bodies the two payment endpoints accept.

mod customer;
pub mod regions;
mod request;

pub use customer::{normalize_phone, CustomerDetails, FieldErrors, MIN_PHONE_DIGITS};
pub use request::{CheckoutRequest, FlowCheckoutRequest, PreferenceItem};
