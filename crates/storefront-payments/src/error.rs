//! Payment error types.

use thiserror::Error;

/// Errors talking to a payment gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Credentials for the gateway are not configured.
    #[error("{0} credentials are not configured")]
    NotConfigured(&'static str),

    /// Failed to send the request.
    #[error("Request failed: {0}")]
    Request(String),

    /// Request timed out.
    #[error("Request to {0} timed out")]
    Timeout(String),

    /// The gateway answered with an error.
    #[error("Gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The requested payment does not exist.
    #[error("Payment not found: {0}")]
    NotFound(String),

    /// The gateway answered with something we could not use.
    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),

    /// Request signing failed.
    #[error(transparent)]
    Signature(#[from] SignatureError),
}

impl GatewayError {
    /// HTTP status to report to our own client for this failure.
    ///
    /// A gateway rejection keeps the gateway's status unless it was a 200
    /// without the expected fields.
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::Rejected { status, .. } if *status != 200 && *status >= 400 => *status,
            GatewayError::NotFound(_) => 404,
            _ => 500,
        }
    }

    pub(crate) fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout(url.to_string())
        } else if e.is_decode() {
            GatewayError::InvalidResponse(e.to_string())
        } else {
            GatewayError::Request(e.to_string())
        }
    }
}

/// Errors computing a signature.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),
}

/// Errors handling a webhook delivery.
#[derive(Error, Debug)]
pub enum WebhookError {
    /// The body could not be parsed.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// No recognised signature header.
    #[error("No Flow or Mercado Pago signature header")]
    UnknownSource,

    /// A signature header is present but the matching secret is not configured.
    #[error("Webhook secret for {0} is not configured")]
    MissingSecret(&'static str),

    /// The signature header is incomplete.
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    /// The signature timestamp is outside the accepted window.
    #[error("Signature timestamp is too old")]
    Expired,

    /// The signature does not match.
    #[error("Signature mismatch")]
    Mismatch,

    #[error(transparent)]
    Signature(#[from] SignatureError),
}

impl WebhookError {
    /// HTTP status answered to the gateway.
    pub fn status_code(&self) -> u16 {
        match self {
            WebhookError::InvalidBody(_) => 400,
            WebhookError::Signature(_) => 500,
            _ => 401,
        }
    }
}
