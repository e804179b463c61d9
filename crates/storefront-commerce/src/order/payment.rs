//! Normalised payment outcomes.

use crate::ids::PaymentId;
use crate::order::Gateway;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment state as reported by a gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Rejected,
    Cancelled,
    /// Anything else, kept verbatim for logs.
    Other(String),
}

impl PaymentStatus {
    /// Map Flow's numeric status code.
    pub fn from_flow_code(code: i64) -> Self {
        match code {
            1 => PaymentStatus::Pending,
            2 => PaymentStatus::Paid,
            3 => PaymentStatus::Rejected,
            4 => PaymentStatus::Cancelled,
            other => PaymentStatus::Other(format!("UNKNOWN ({other})")),
        }
    }

    /// Map Flow's status sent as a form field.
    pub fn from_flow_str(status: &str) -> Self {
        match status.trim().parse::<i64>() {
            Ok(code) => Self::from_flow_code(code),
            Err(_) => PaymentStatus::Other(format!("UNKNOWN ({status})")),
        }
    }

    /// Map a Mercado Pago payment `status`.
    pub fn from_mercadopago(status: &str) -> Self {
        match status {
            "approved" => PaymentStatus::Paid,
            "pending" | "in_process" | "authorized" | "in_mediation" => PaymentStatus::Pending,
            "rejected" => PaymentStatus::Rejected,
            "cancelled" | "refunded" | "charged_back" => PaymentStatus::Cancelled,
            other => PaymentStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Rejected => "REJECTED",
            PaymentStatus::Cancelled => "CANCELLED",
            PaymentStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for PaymentStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "PENDING" => PaymentStatus::Pending,
            "PAID" => PaymentStatus::Paid,
            "REJECTED" => PaymentStatus::Rejected,
            "CANCELLED" => PaymentStatus::Cancelled,
            _ => PaymentStatus::Other(s),
        }
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Outcome of a payment after any deferred lookup at the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    pub gateway: Gateway,
    /// Our order id as echoed by the gateway; unvalidated.
    pub order_id: Option<String>,
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub payer_email: Option<String>,
    pub payment_method: Option<String>,
    /// Payment time as the gateway formatted it.
    pub timestamp: Option<String>,
}

impl PaymentConfirmation {
    pub fn new(gateway: Gateway, payment_id: impl Into<PaymentId>, status: PaymentStatus) -> Self {
        Self {
            gateway,
            order_id: None,
            payment_id: payment_id.into(),
            status,
            amount: None,
            currency: None,
            payer_email: None,
            payment_method: None,
            timestamp: None,
        }
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_payer_email(mut self, email: impl Into<String>) -> Self {
        self.payer_email = Some(email.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Only paid payments are reconciled.
    pub fn is_success(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}
