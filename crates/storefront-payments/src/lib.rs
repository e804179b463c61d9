//! Payment gateway integrations for the storefront.
//!
//! This crate provides:
//! - `MercadoPagoClient` - checkout preferences and payment lookups
//! - `FlowClient` - signed payment creation and status lookups
//! - `WebhookVerifier` - signature checks for gateway notifications
//! - `WebhookEvent` - what a notification asks us to do
//! - `PaymentLookup` - the seam the reconciler fetches payments through
//!
//! # Example
//!
//! ```ignore
//! use storefront_payments::prelude::*;
//!
//! let verifier = WebhookVerifier::new()
//!     .with_mercadopago_secret(std::env::var("MP_WEBHOOK_SECRET")?)
//!     .with_flow_secret(std::env::var("FLOW_SECRET_KEY")?);
//!
//! let payload = parse_body(content_type, &body)?;
//! let source = verifier.verify(&headers, query, &payload)?;
//! match WebhookEvent::from_payload(source, &payload, query) {
//!     WebhookEvent::MercadoPagoPayment { payment_id } => { /* fetch and reconcile */ }
//!     _ => {}
//! }
//! ```

mod error;
mod lookup;
mod serde_util;
mod signature;
mod transport;

pub mod flow;
pub mod mercadopago;
pub mod webhook;

pub use error::{GatewayError, SignatureError, WebhookError};
pub use lookup::PaymentLookup;
pub use signature::{hmac_sha256_hex, verify_hmac_sha256_hex};
pub use transport::{BackoffStrategy, RetryPolicy, DEFAULT_TIMEOUT};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{GatewayError, WebhookError};
    pub use crate::flow::{
        FlowClient, FlowCredentials, FlowPaymentLink, FlowPaymentRequest, FLOW_API_BASE,
    };
    pub use crate::lookup::PaymentLookup;
    pub use crate::mercadopago::{
        MercadoPagoClient, PreferencePayer, PreferenceRequest, MERCADOPAGO_API_BASE,
    };
    pub use crate::transport::RetryPolicy;
    pub use crate::webhook::{parse_body, WebhookEvent, WebhookSource, WebhookVerifier};
}
