//! Orders waiting for a payment confirmation.

use crate::checkout::{CustomerDetails, PreferenceItem};
use crate::money::{self, Money};
use crate::order::OrderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment gateway an order was sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gateway {
    #[serde(alias = "mercado_pago")]
    MercadoPago,
    Flow,
}

impl Gateway {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gateway::MercadoPago => "mercadopago",
            Gateway::Flow => "flow",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Gateway::MercadoPago => "Mercado Pago",
            Gateway::Flow => "Flow",
        }
    }
}

impl fmt::Display for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the temp order store keeps for an order between checkout and the
/// gateway's payment notification.
///
/// Customer fields are stored flat, next to the order metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingOrder {
    pub order_id: OrderId,
    pub gateway: Gateway,
    #[serde(flatten)]
    pub customer: CustomerDetails,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<PreferenceItem>,
    /// Amount the customer was asked to pay, shipping included.
    #[serde(with = "money::clp")]
    pub amount: Money,
    #[serde(with = "money::clp", default)]
    pub shipping_cost: Money,
    pub created_at: DateTime<Utc>,
}

impl PendingOrder {
    pub fn new(
        order_id: OrderId,
        gateway: Gateway,
        customer: CustomerDetails,
        amount: Money,
    ) -> Self {
        Self {
            order_id,
            gateway,
            customer: customer.normalized(),
            items: Vec::new(),
            amount,
            shipping_cost: Money::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_items(mut self, items: Vec<PreferenceItem>) -> Self {
        self.items = items;
        self
    }

    pub fn with_shipping_cost(mut self, shipping_cost: Money) -> Self {
        self.shipping_cost = shipping_cost;
        self
    }
}
