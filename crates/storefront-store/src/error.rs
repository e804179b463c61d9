//! Store error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when using the temp order store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The order id is empty or not a safe file name.
    #[error("Invalid order id: {0:?}")]
    InvalidOrderId(String),

    /// Failed to serialize an order.
    #[error("Serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// A stored file exists but does not hold a valid order.
    #[error("Corrupt order file for {order_id}: {source}")]
    Corrupt {
        order_id: String,
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
