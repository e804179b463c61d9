use crate::error::GatewayError;
use async_trait::async_trait;
use storefront_commerce::order::{Gateway, PaymentConfirmation};

/// Fetches the authoritative state of a payment from its gateway.
///
/// `reference` is whatever the gateway's notification carried: a payment
/// id for Mercado Pago, a payment token for Flow.
#[async_trait]
pub trait PaymentLookup: Send + Sync {
    fn gateway(&self) -> Gateway;

    async fn confirmation(&self, reference: &str) -> Result<PaymentConfirmation, GatewayError>;
}
