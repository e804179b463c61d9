//! Flow (flow.cl) client.
//!
//! Every Flow call carries `apiKey` plus a signature `s`: the HMAC-SHA256
//! of all other parameters sorted by name and concatenated as
//! `name1value1name2value2...`, keyed with the merchant secret.

use crate::error::GatewayError;
use crate::lookup::PaymentLookup;
use crate::serde_util::{lenient_f64, lenient_string};
use crate::signature::hmac_sha256_hex;
use crate::transport::{build_http_client, endpoint, error_message, RetryPolicy, DEFAULT_TIMEOUT};
use async_trait::async_trait;
use serde::Deserialize;
use storefront_commerce::money::Money;
use storefront_commerce::order::{Gateway, OrderId, PaymentConfirmation, PaymentStatus};
use tracing::{debug, error, info};

/// Production API base.
pub const FLOW_API_BASE: &str = "https://www.flow.cl/api";

/// Sandbox API base.
pub const FLOW_SANDBOX_API_BASE: &str = "https://sandbox.flow.cl/api";

/// Flow's code for "all payment methods".
const ALL_PAYMENT_METHODS: &str = "9";

/// Merchant credentials.
#[derive(Clone)]
pub struct FlowCredentials {
    pub api_key: String,
    pub secret_key: String,
}

impl FlowCredentials {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
        }
    }
}

impl std::fmt::Debug for FlowCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowCredentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &"***")
            .finish()
    }
}

/// Sign a parameter list the way Flow expects. Any existing `s` is ignored.
pub fn sign_params(params: &[(&str, String)], secret_key: &str) -> Result<String, GatewayError> {
    Ok(hmac_sha256_hex(secret_key, &signing_message(params))?)
}

/// The string Flow signs: `s` dropped, names sorted, `name value` pairs joined.
pub(crate) fn signing_message(params: &[(&str, String)]) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(k, _)| *k != "s").collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    sorted.iter().map(|(k, v)| format!("{k}{v}")).collect()
}

/// Data for `payment/create`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowPaymentRequest {
    pub commerce_order: OrderId,
    pub subject: String,
    pub amount: Money,
    pub email: String,
    pub url_confirmation: String,
    pub url_return: String,
}

impl FlowPaymentRequest {
    /// Request with the storefront's default subject and callback URLs under `origin`.
    pub fn new(order_id: OrderId, amount: Money, email: impl Into<String>, origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            subject: format!("Pago Orden {order_id}"),
            commerce_order: order_id,
            amount,
            email: email.into(),
            url_confirmation: format!("{origin}/api/flow-confirmation"),
            url_return: format!("{origin}/orden-confirmada-flow"),
        }
    }
}

/// Where to send the customer to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowPaymentLink {
    pub url: String,
    pub token: String,
    pub flow_order: Option<String>,
}

impl FlowPaymentLink {
    /// `{url}?token={token}`.
    pub fn redirect_url(&self) -> String {
        format!("{}?token={}", self.url, self.token)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResponse {
    url: Option<String>,
    token: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    flow_order: Option<String>,
}

/// Extra payment details from `payment/getStatus`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowPaymentData {
    pub date: Option<String>,
    pub media: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: Option<f64>,
}

/// Response of `payment/getStatus`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowPaymentStatus {
    #[serde(default, deserialize_with = "lenient_string")]
    pub flow_order: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub commerce_order: Option<String>,
    pub request_date: Option<String>,
    pub status: i64,
    pub subject: Option<String>,
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: Option<f64>,
    pub payer: Option<String>,
    #[serde(default)]
    pub payment_data: Option<FlowPaymentData>,
}

impl FlowPaymentStatus {
    pub fn to_confirmation(&self) -> PaymentConfirmation {
        let payment_id = self.flow_order.clone().unwrap_or_else(|| "N/A".to_string());
        let data = self.payment_data.clone().unwrap_or_default();
        let mut confirmation = PaymentConfirmation::new(
            Gateway::Flow,
            payment_id,
            PaymentStatus::from_flow_code(self.status),
        );
        confirmation.order_id = self.commerce_order.clone();
        confirmation.amount = self.amount.or(data.amount);
        confirmation.currency = Some(self.currency.clone().unwrap_or_else(|| "CLP".to_string()));
        confirmation.payer_email = self.payer.clone().filter(|p| !p.is_empty());
        confirmation.payment_method = data.media;
        confirmation.timestamp = data.date.or_else(|| self.request_date.clone());
        confirmation
    }
}

/// HTTP client for the Flow API.
#[derive(Debug, Clone)]
pub struct FlowClient {
    http: reqwest::Client,
    api_base: String,
    credentials: FlowCredentials,
    retry: RetryPolicy,
}

impl FlowClient {
    pub fn new(api_base: impl Into<String>, credentials: FlowCredentials) -> Result<Self, GatewayError> {
        if credentials.api_key.is_empty() || credentials.secret_key.is_empty() {
            return Err(GatewayError::NotConfigured("Flow"));
        }
        Ok(Self {
            http: build_http_client(DEFAULT_TIMEOUT)?,
            api_base: api_base.into(),
            credentials,
            retry: RetryPolicy::default(),
        })
    }

    /// Set the retry policy used for status lookups.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn signed(&self, mut params: Vec<(&'static str, String)>) -> Result<Vec<(&'static str, String)>, GatewayError> {
        params.push(("apiKey", self.credentials.api_key.clone()));
        let signature = sign_params(&params, &self.credentials.secret_key)?;
        params.push(("s", signature));
        Ok(params)
    }

    /// Create a payment and return the checkout link.
    ///
    /// Not retried: a repeated create would open a second payment.
    pub async fn create_payment(&self, request: &FlowPaymentRequest) -> Result<FlowPaymentLink, GatewayError> {
        let params = self.signed(vec![
            ("commerceOrder", request.commerce_order.to_string()),
            ("subject", request.subject.clone()),
            ("currency", "CLP".to_string()),
            ("amount", request.amount.amount_minor.to_string()),
            ("email", request.email.clone()),
            ("paymentMethod", ALL_PAYMENT_METHODS.to_string()),
            ("urlConfirmation", request.url_confirmation.clone()),
            ("urlReturn", request.url_return.clone()),
        ])?;

        let url = endpoint(&self.api_base, "payment/create");
        debug!(order_id = %request.commerce_order, "creating Flow payment");
        let response = self
            .http
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(&url, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::from_reqwest(&url, e))?;
        if !(200..300).contains(&status) {
            let message = error_message(&body, status);
            error!(status, %message, "Flow rejected payment/create");
            return Err(GatewayError::Rejected { status, message });
        }

        let parsed: CreateResponse = serde_json::from_str(&body)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        match (parsed.url, parsed.token) {
            (Some(url), Some(token)) if !url.is_empty() && !token.is_empty() => {
                info!(order_id = %request.commerce_order, flow_order = ?parsed.flow_order, "Flow payment created");
                Ok(FlowPaymentLink {
                    url,
                    token,
                    flow_order: parsed.flow_order,
                })
            }
            _ => Err(GatewayError::Rejected {
                status,
                message: error_message(&body, status),
            }),
        }
    }

    /// Fetch the state of the payment behind `token`.
    pub async fn payment_status(&self, token: &str) -> Result<FlowPaymentStatus, GatewayError> {
        let params = self.signed(vec![("token", token.to_string())])?;
        let url = endpoint(&self.api_base, "payment/getStatus");

        let (http, url, params) = (&self.http, url.as_str(), &params);

        self.retry
            .run("flow.payment_status", move || async move {
                let response = http
                    .get(url)
                    .query(params)
                    .send()
                    .await
                    .map_err(|e| GatewayError::from_reqwest(url, e))?;
                let status = response.status().as_u16();
                let body = response
                    .text()
                    .await
                    .map_err(|e| GatewayError::from_reqwest(url, e))?;
                if !(200..300).contains(&status) {
                    return Err(GatewayError::Rejected {
                        status,
                        message: error_message(&body, status),
                    });
                }
                serde_json::from_str(&body).map_err(|e| GatewayError::InvalidResponse(e.to_string()))
            })
            .await
    }
}

#[async_trait]
impl PaymentLookup for FlowClient {
    fn gateway(&self) -> Gateway {
        Gateway::Flow
    }

    async fn confirmation(&self, token: &str) -> Result<PaymentConfirmation, GatewayError> {
        Ok(self.payment_status(token).await?.to_confirmation())
    }
}
