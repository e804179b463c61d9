//! Order identifiers.

use crate::error::CommerceError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Prefix used when none is configured.
pub const DEFAULT_ORDER_PREFIX: &str = "AstroShop";

/// Longest accepted order id.
pub const MAX_ORDER_ID_LEN: usize = 128;

/// Identifier we assign to an order before handing the customer to a
/// gateway. Gateways echo it back (`external_reference`, `commerceOrder`).
///
/// Only ASCII letters, digits, `-` and `_` are allowed, so an id is always
/// a safe file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderId(String);

impl OrderId {
    /// Generate `{prefix}-{unix_millis}-{6 hex chars}`.
    ///
    /// Characters not allowed in ids are dropped from the prefix; an empty
    /// prefix falls back to [`DEFAULT_ORDER_PREFIX`].
    pub fn generate(prefix: &str) -> Self {
        let mut prefix: String = prefix.chars().filter(|c| is_id_char(*c)).take(32).collect();
        if prefix.is_empty() {
            prefix = DEFAULT_ORDER_PREFIX.to_string();
        }
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}-{}-{}",
            prefix,
            Utc::now().timestamp_millis(),
            &suffix[..6]
        ))
    }

    /// Validate an id received from a client or a gateway.
    pub fn parse(id: &str) -> Result<Self, CommerceError> {
        let id = id.trim();
        if id.is_empty() || id.len() > MAX_ORDER_ID_LEN || !id.chars().all(is_id_char) {
            return Err(CommerceError::InvalidOrderId(id.to_string()));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for OrderId {
    type Error = CommerceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<OrderId> for String {
    fn from(id: OrderId) -> Self {
        id.0
    }
}

impl AsRef<str> for OrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
