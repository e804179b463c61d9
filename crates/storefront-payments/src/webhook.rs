//! Payment notifications: source detection, body parsing, signature
//! verification and event extraction.

use crate::error::WebhookError;
use crate::flow::signing_message;
use crate::serde_util::value_to_string;
use crate::signature::verify_hmac_sha256_hex;
use chrono::{DateTime, Utc};
use http::HeaderMap;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use storefront_commerce::order::{Gateway, PaymentConfirmation, PaymentStatus};
use tracing::{debug, warn};

/// Mercado Pago signature header (`ts=...,v1=...`).
pub const MERCADOPAGO_SIGNATURE_HEADER: &str = "x-signature";
/// Mercado Pago request id header, part of the signed manifest.
pub const MERCADOPAGO_REQUEST_ID_HEADER: &str = "x-request-id";
/// Flow signature header.
pub const FLOW_SIGNATURE_HEADER: &str = "x-flow-signature";

/// Default maximum age of a Mercado Pago signature timestamp.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

/// Which gateway sent a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookSource {
    MercadoPago,
    Flow,
}

impl WebhookSource {
    /// Identify the sender by its signature header. Mercado Pago wins if both are present.
    pub fn detect(headers: &HeaderMap) -> Option<Self> {
        if headers.contains_key(MERCADOPAGO_SIGNATURE_HEADER) {
            Some(WebhookSource::MercadoPago)
        } else if headers.contains_key(FLOW_SIGNATURE_HEADER) {
            Some(WebhookSource::Flow)
        } else {
            None
        }
    }

    pub fn gateway(&self) -> Gateway {
        match self {
            WebhookSource::MercadoPago => Gateway::MercadoPago,
            WebhookSource::Flow => Gateway::Flow,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.gateway().as_str()
    }
}

impl fmt::Display for WebhookSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse a notification body according to its content type.
///
/// Form bodies become a JSON object of strings. Without a known content
/// type the body must be JSON.
pub fn parse_body(content_type: Option<&str>, raw: &[u8]) -> Result<Value, WebhookError> {
    let content_type = content_type.unwrap_or("").to_ascii_lowercase();
    if content_type.starts_with("application/x-www-form-urlencoded") {
        let fields: Map<String, Value> = url::form_urlencoded::parse(raw)
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect();
        return Ok(Value::Object(fields));
    }
    serde_json::from_slice(raw).map_err(|e| WebhookError::InvalidBody(e.to_string()))
}

/// Checks notification signatures against the configured secrets.
#[derive(Clone)]
pub struct WebhookVerifier {
    flow_secret: Option<String>,
    mercadopago_secret: Option<String>,
    tolerance: Option<Duration>,
}

impl fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("flow_secret", &self.flow_secret.as_ref().map(|_| "***"))
            .field("mercadopago_secret", &self.mercadopago_secret.as_ref().map(|_| "***"))
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

impl WebhookVerifier {
    pub fn new() -> Self {
        Self {
            flow_secret: None,
            mercadopago_secret: None,
            tolerance: Some(DEFAULT_TOLERANCE),
        }
    }

    /// Flow merchant secret key; Flow signs notifications with it.
    pub fn with_flow_secret(mut self, secret: impl Into<String>) -> Self {
        self.flow_secret = Some(secret.into()).filter(|s: &String| !s.is_empty());
        self
    }

    /// Mercado Pago webhook secret from the integration settings.
    pub fn with_mercadopago_secret(mut self, secret: impl Into<String>) -> Self {
        self.mercadopago_secret = Some(secret.into()).filter(|s: &String| !s.is_empty());
        self
    }

    /// Maximum signature age; zero disables the check.
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = Some(tolerance).filter(|t| !t.is_zero());
        self
    }

    /// Verify a delivery, returning which gateway sent it.
    pub fn verify(
        &self,
        headers: &HeaderMap,
        query: Option<&str>,
        payload: &Value,
    ) -> Result<WebhookSource, WebhookError> {
        self.verify_at(headers, query, payload, Utc::now())
    }

    pub fn verify_at(
        &self,
        headers: &HeaderMap,
        query: Option<&str>,
        payload: &Value,
        now: DateTime<Utc>,
    ) -> Result<WebhookSource, WebhookError> {
        let source = WebhookSource::detect(headers).ok_or(WebhookError::UnknownSource)?;
        match source {
            WebhookSource::Flow => self.verify_flow(headers, payload)?,
            WebhookSource::MercadoPago => self.verify_mercadopago(headers, query, payload, now)?,
        }
        debug!(%source, "webhook signature verified");
        Ok(source)
    }

    fn verify_flow(&self, headers: &HeaderMap, payload: &Value) -> Result<(), WebhookError> {
        let secret = self
            .flow_secret
            .as_deref()
            .ok_or(WebhookError::MissingSecret("Flow"))?;
        let signature = header_str(headers, FLOW_SIGNATURE_HEADER)
            .ok_or_else(|| WebhookError::MalformedSignature("empty Flow signature".into()))?;

        let params: Vec<(&str, String)> = payload
            .as_object()
            .map(|fields| {
                fields
                    .iter()
                    .map(|(k, v)| (k.as_str(), scalar_string(v)))
                    .collect()
            })
            .unwrap_or_default();
        if verify_hmac_sha256_hex(secret, &signing_message(&params), signature)? {
            Ok(())
        } else {
            warn!("Flow signature mismatch");
            Err(WebhookError::Mismatch)
        }
    }

    fn verify_mercadopago(
        &self,
        headers: &HeaderMap,
        query: Option<&str>,
        payload: &Value,
        now: DateTime<Utc>,
    ) -> Result<(), WebhookError> {
        let secret = self
            .mercadopago_secret
            .as_deref()
            .ok_or(WebhookError::MissingSecret("Mercado Pago"))?;
        let header = header_str(headers, MERCADOPAGO_SIGNATURE_HEADER).unwrap_or("");
        let parts = SignatureHeader::parse(header)?;
        let request_id = header_str(headers, MERCADOPAGO_REQUEST_ID_HEADER)
            .ok_or_else(|| WebhookError::MalformedSignature("missing x-request-id".into()))?;
        let data_id = notification_data_id(payload, query)
            .ok_or_else(|| WebhookError::MalformedSignature("missing data.id".into()))?;

        if let Some(tolerance) = self.tolerance {
            let age = now.timestamp() - parts.timestamp_secs();
            if age.unsigned_abs() > tolerance.as_secs() {
                warn!(age, "Mercado Pago signature outside tolerance");
                return Err(WebhookError::Expired);
            }
        }

        let manifest = format!(
            "id:{};request-id:{};ts:{};",
            data_id.to_lowercase(),
            request_id,
            parts.ts
        );
        if verify_hmac_sha256_hex(secret, &manifest, &parts.v1)? {
            Ok(())
        } else {
            warn!(request_id, "Mercado Pago signature mismatch");
            Err(WebhookError::Mismatch)
        }
    }
}

impl Default for WebhookVerifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Parts of an `x-signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SignatureHeader {
    ts: String,
    v1: String,
}

impl SignatureHeader {
    fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut ts = None;
        let mut v1 = None;
        for part in header.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "ts" => ts = Some(value.to_string()),
                "v1" | "sig1" => v1 = Some(value.to_string()),
                _ => {}
            }
        }
        match (ts, v1) {
            (Some(ts), Some(v1))
                if !v1.is_empty() && !ts.is_empty() && ts.chars().all(|c| c.is_ascii_digit()) =>
            {
                Ok(Self { ts, v1 })
            }
            _ => Err(WebhookError::MalformedSignature(
                "x-signature needs ts and v1".into(),
            )),
        }
    }

    /// Seconds since the epoch; millisecond timestamps are scaled down.
    fn timestamp_secs(&self) -> i64 {
        let ts: i64 = self.ts.parse().unwrap_or(0);
        if ts > 1_000_000_000_000 {
            ts / 1000
        } else {
            ts
        }
    }
}

/// A decoded notification.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    /// Flow posted the full payment state.
    FlowStatus(PaymentConfirmation),
    /// Flow posted only a token; the state must be fetched.
    FlowToken { token: String },
    /// A Mercado Pago payment changed; details must be fetched.
    MercadoPagoPayment { payment_id: String },
    /// Anything else (merchant orders, test pings).
    Unrecognized,
}

impl WebhookEvent {
    pub fn from_payload(source: WebhookSource, payload: &Value, query: Option<&str>) -> Self {
        match source {
            WebhookSource::Flow => Self::from_flow(payload),
            WebhookSource::MercadoPago => Self::from_mercadopago(payload, query),
        }
    }

    fn from_flow(payload: &Value) -> Self {
        let field = |name: &str| value_to_string(payload.get(name));
        let Some(token) = field("token") else {
            return WebhookEvent::Unrecognized;
        };
        let Some(status) = field("status") else {
            return WebhookEvent::FlowToken { token };
        };

        let mut confirmation = PaymentConfirmation::new(
            Gateway::Flow,
            field("flowOrder").unwrap_or_else(|| "N/A".to_string()),
            PaymentStatus::from_flow_str(&status),
        );
        confirmation.order_id = field("commerceOrder");
        confirmation.amount = field("amount").and_then(|a| a.trim().parse().ok());
        confirmation.currency = Some(field("currency").unwrap_or_else(|| "CLP".to_string()));
        confirmation.payer_email = field("payer");
        confirmation.payment_method = Some(field("media").unwrap_or_else(|| "N/A".to_string()));
        confirmation.timestamp = field("paymentDate");
        WebhookEvent::FlowStatus(confirmation)
    }

    fn from_mercadopago(payload: &Value, query: Option<&str>) -> Self {
        let action = payload.get("action").and_then(Value::as_str).unwrap_or("");
        let kind = payload
            .get("type")
            .or_else(|| payload.get("topic"))
            .and_then(Value::as_str)
            .or_else(|| query.and_then(|q| query_param(q, "type")))
            .unwrap_or("");
        if !(action.starts_with("payment.") || kind == "payment") {
            return WebhookEvent::Unrecognized;
        }
        match payment_data_id(payload, query) {
            Some(payment_id) => WebhookEvent::MercadoPagoPayment { payment_id },
            None => WebhookEvent::Unrecognized,
        }
    }

    /// Gateway reference to fetch the payment by, when one is needed.
    pub fn lookup_reference(&self) -> Option<&str> {
        match self {
            WebhookEvent::FlowToken { token } => Some(token),
            WebhookEvent::MercadoPagoPayment { payment_id } => Some(payment_id),
            _ => None,
        }
    }
}

/// Payment id of a notification: `data.id`, then the `data.id` query parameter.
fn payment_data_id(payload: &Value, query: Option<&str>) -> Option<String> {
    value_to_string(payload.get("data").and_then(|d| d.get("id")))
        .or_else(|| query.and_then(|q| query_param(q, "data.id")).map(str::to_string))
}

/// Id signed into the `x-signature` manifest. The top-level `id` is the
/// notification id and only counts here.
fn notification_data_id(payload: &Value, query: Option<&str>) -> Option<String> {
    value_to_string(payload.get("data").and_then(|d| d.get("id")))
        .or_else(|| value_to_string(payload.get("id")))
        .or_else(|| query.and_then(|q| query_param(q, "data.id")).map(str::to_string))
}

fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
        .filter(|v| !v.is_empty())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
