//! Mercado Pago client: checkout preferences and payment lookups.

use crate::error::GatewayError;
use crate::lookup::PaymentLookup;
use crate::serde_util::{lenient_f64, lenient_string};
use crate::transport::{build_http_client, endpoint, error_message, RetryPolicy, DEFAULT_TIMEOUT};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storefront_commerce::checkout::{CustomerDetails, PreferenceItem};
use storefront_commerce::money::Money;
use storefront_commerce::order::{Gateway, OrderId, PaymentConfirmation, PaymentStatus};
use tracing::{debug, error, info, warn};

/// Production API base.
pub const MERCADOPAGO_API_BASE: &str = "https://api.mercadopago.com";

/// Where Mercado Pago sends the customer after paying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

impl BackUrls {
    /// The storefront's result pages under `origin`.
    pub fn for_origin(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            success: format!("{origin}/orden-confirmada"),
            failure: format!("{origin}/orden-fallida"),
            pending: format!("{origin}/orden-pendiente"),
        }
    }
}

/// Payer block of a preference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreferencePayer {
    pub name: String,
    pub surname: String,
    pub email: String,
}

impl From<&CustomerDetails> for PreferencePayer {
    fn from(customer: &CustomerDetails) -> Self {
        Self {
            name: customer.first_name.trim().to_string(),
            surname: customer.last_name.trim().to_string(),
            email: customer.email.trim().to_string(),
        }
    }
}

/// Data for a new checkout preference.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceRequest {
    pub order_id: OrderId,
    pub items: Vec<PreferenceItem>,
    pub payer: Option<PreferencePayer>,
    pub back_urls: BackUrls,
    pub notification_url: Option<String>,
    pub shipping_cost: Money,
}

impl PreferenceRequest {
    pub fn new(order_id: OrderId, items: Vec<PreferenceItem>, origin: &str) -> Self {
        Self {
            order_id,
            items,
            payer: None,
            back_urls: BackUrls::for_origin(origin),
            notification_url: None,
            shipping_cost: Money::default(),
        }
    }

    pub fn with_payer(mut self, payer: PreferencePayer) -> Self {
        self.payer = Some(payer);
        self
    }

    pub fn with_notification_url(mut self, url: impl Into<String>) -> Self {
        self.notification_url = Some(url.into());
        self
    }

    pub fn with_shipping_cost(mut self, shipping_cost: Money) -> Self {
        self.shipping_cost = shipping_cost;
        self
    }

    fn to_body(&self) -> serde_json::Value {
        let items: Vec<serde_json::Value> = self
            .items
            .iter()
            .map(|item| {
                serde_json::json!({
                    "id": item.id,
                    "title": item.title,
                    "quantity": item.quantity,
                    "unit_price": item.unit_price_money().amount_minor,
                    "currency_id": "CLP",
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "items": items,
            "back_urls": self.back_urls,
            "auto_return": "approved",
            "external_reference": self.order_id.as_str(),
        });
        if let Some(url) = &self.notification_url {
            body["notification_url"] = serde_json::json!(url);
        }
        if let Some(payer) = &self.payer {
            body["payer"] = serde_json::json!(payer);
        }
        if self.shipping_cost.is_positive() {
            body["shipments"] = serde_json::json!({
                "mode": "not_specified",
                "cost": self.shipping_cost.amount_minor,
            });
        }
        body
    }
}

/// A created preference.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Preference {
    pub id: String,
    pub init_point: Option<String>,
    pub sandbox_init_point: Option<String>,
}

impl Preference {
    /// Checkout URL, preferring production.
    pub fn checkout_url(&self) -> Option<&str> {
        self.init_point
            .as_deref()
            .or(self.sandbox_init_point.as_deref())
    }
}

/// Payer of a payment.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MercadoPagoPayer {
    pub email: Option<String>,
}

/// The fields of `GET /v1/payments/{id}` we use.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MercadoPagoPayment {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    pub status: String,
    pub status_detail: Option<String>,
    pub external_reference: Option<String>,
    #[serde(default)]
    pub payer: Option<MercadoPagoPayer>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub transaction_amount: Option<f64>,
    pub currency_id: Option<String>,
    pub payment_method_id: Option<String>,
    pub date_approved: Option<String>,
    pub date_created: Option<String>,
}

impl MercadoPagoPayment {
    pub fn to_confirmation(&self) -> PaymentConfirmation {
        let mut confirmation = PaymentConfirmation::new(
            Gateway::MercadoPago,
            self.id.clone().unwrap_or_else(|| "N/A".to_string()),
            PaymentStatus::from_mercadopago(&self.status),
        );
        confirmation.order_id = self.external_reference.clone().filter(|r| !r.is_empty());
        confirmation.amount = self.transaction_amount;
        confirmation.currency = self.currency_id.clone();
        confirmation.payer_email = self
            .payer
            .as_ref()
            .and_then(|p| p.email.clone())
            .filter(|e| !e.is_empty());
        confirmation.payment_method = self.payment_method_id.clone();
        confirmation.timestamp = self
            .date_approved
            .clone()
            .or_else(|| self.date_created.clone());
        confirmation
    }
}

/// HTTP client for the Mercado Pago API.
#[derive(Clone)]
pub struct MercadoPagoClient {
    http: reqwest::Client,
    api_base: String,
    access_token: String,
    retry: RetryPolicy,
}

impl std::fmt::Debug for MercadoPagoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MercadoPagoClient")
            .field("api_base", &self.api_base)
            .field("access_token", &"***")
            .finish()
    }
}

impl MercadoPagoClient {
    pub fn new(api_base: impl Into<String>, access_token: impl Into<String>) -> Result<Self, GatewayError> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(GatewayError::NotConfigured("Mercado Pago"));
        }
        Ok(Self {
            http: build_http_client(DEFAULT_TIMEOUT)?,
            api_base: api_base.into(),
            access_token,
            retry: RetryPolicy::default(),
        })
    }

    /// Set the retry policy used for payment lookups.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Create a checkout preference.
    pub async fn create_preference(&self, request: &PreferenceRequest) -> Result<Preference, GatewayError> {
        let url = endpoint(&self.api_base, "checkout/preferences");
        debug!(order_id = %request.order_id, items = request.items.len(), "creating preference");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&request.to_body())
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
            error!(status, %message, "Mercado Pago rejected the preference");
            return Err(GatewayError::Rejected { status, message });
        }

        let preference: Preference = serde_json::from_str(&body)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        info!(order_id = %request.order_id, preference_id = %preference.id, "preference created");
        Ok(preference)
    }

    /// Fetch a payment by id.
    pub async fn get_payment(&self, payment_id: &str) -> Result<MercadoPagoPayment, GatewayError> {
        let url = payment_url(&self.api_base, payment_id)?;
        let (http, url, token) = (&self.http, url.as_str(), self.access_token.as_str());

        self.retry
            .run("mercadopago.get_payment", move || async move {
                let response = http
                    .get(url)
                    .bearer_auth(token)
                    .send()
                    .await
                    .map_err(|e| GatewayError::from_reqwest(url, e))?;
                let status = response.status().as_u16();
                let body = response
                    .text()
                    .await
                    .map_err(|e| GatewayError::from_reqwest(url, e))?;
                if status == 404 {
                    warn!(payment_id, "payment not found at Mercado Pago");
                    return Err(GatewayError::NotFound(payment_id.to_string()));
                }
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

/// `{base}/v1/payments/{id}` with the id percent-encoded as one segment.
fn payment_url(api_base: &str, payment_id: &str) -> Result<url::Url, GatewayError> {
    let mut url = url::Url::parse(&endpoint(api_base, "v1/payments"))
        .map_err(|e| GatewayError::Request(format!("invalid API base {api_base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| GatewayError::Request(format!("invalid API base {api_base}")))?
        .push(payment_id);
    Ok(url)
}

#[async_trait]
impl PaymentLookup for MercadoPagoClient {
    fn gateway(&self) -> Gateway {
        Gateway::MercadoPago
    }

    async fn confirmation(&self, payment_id: &str) -> Result<PaymentConfirmation, GatewayError> {
        Ok(self.get_payment(payment_id).await?.to_confirmation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base: &str) -> MercadoPagoClient {
        MercadoPagoClient::new(base, "TEST-token")
            .unwrap()
            .with_retry(RetryPolicy::none())
    }

    fn request() -> PreferenceRequest {
        PreferenceRequest::new(
            OrderId::parse("AstroShop-1").unwrap(),
            vec![PreferenceItem {
                id: "1-M".into(),
                title: "Camiseta Minimal (M)".into(),
                quantity: 2,
                unit_price: 29990.4,
            }],
            "https://tienda.example",
        )
        .with_notification_url("https://tienda.example/api/payment-webhook")
    }

    #[test]
    fn test_back_urls() {
        let urls = BackUrls::for_origin("https://tienda.example/");
        assert_eq!(urls.success, "https://tienda.example/orden-confirmada");
        assert_eq!(urls.failure, "https://tienda.example/orden-fallida");
        assert_eq!(urls.pending, "https://tienda.example/orden-pendiente");
    }

    #[test]
    fn test_body_shape() {
        let body = request().with_shipping_cost(Money::clp(3990)).to_body();
        assert_eq!(body["items"][0]["unit_price"], 29990);
        assert_eq!(body["items"][0]["currency_id"], "CLP");
        assert_eq!(body["auto_return"], "approved");
        assert_eq!(body["external_reference"], "AstroShop-1");
        assert_eq!(body["shipments"]["cost"], 3990);
        assert!(body.get("payer").is_none());

        let body = request().to_body();
        assert!(body.get("shipments").is_none());
    }

    #[test]
    fn test_payment_url_encodes_id() {
        let url = payment_url("https://api.mercadopago.com", "../v2/x").unwrap();
        assert_eq!(url.as_str(), "https://api.mercadopago.com/v1/payments/..%2Fv2%2Fx");
    }

    #[test]
    fn test_missing_token() {
        assert!(matches!(
            MercadoPagoClient::new(MERCADOPAGO_API_BASE, " "),
            Err(GatewayError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn test_create_preference() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkout/preferences"))
            .and(header("authorization", "Bearer TEST-token"))
            .and(body_partial_json(serde_json::json!({
                "external_reference": "AstroShop-1",
                "notification_url": "https://tienda.example/api/payment-webhook"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "123-abc",
                "init_point": "https://www.mercadopago.cl/checkout/v1/redirect?pref_id=123-abc"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let preference = client(&server.uri()).create_preference(&request()).await.unwrap();
        assert_eq!(preference.id, "123-abc");
        assert!(preference.checkout_url().unwrap().ends_with("pref_id=123-abc"));
    }

    #[tokio::test]
    async fn test_create_preference_requires_only_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkout/preferences"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "pref-1"})),
            )
            .mount(&server)
            .await;

        let preference = client(&server.uri()).create_preference(&request()).await.unwrap();
        assert_eq!(preference.id, "pref-1");
        assert_eq!(preference.checkout_url(), None);
    }

    #[tokio::test]
    async fn test_create_preference_without_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkout/preferences"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "init_point": "https://www.mercadopago.cl/checkout/v1/redirect"
            })))
            .mount(&server)
            .await;

        let err = client(&server.uri()).create_preference(&request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_create_preference_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkout/preferences"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "message": "items.unit_price must be a number",
                "status": 400
            })))
            .mount(&server)
            .await;

        let err = client(&server.uri()).create_preference(&request()).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("unit_price"));
    }

    #[tokio::test]
    async fn test_get_payment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/payments/987654"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 987654,
                "status": "approved",
                "status_detail": "accredited",
                "external_reference": "AstroShop-1",
                "transaction_amount": 59980,
                "currency_id": "CLP",
                "payment_method_id": "visa",
                "date_approved": "2025-04-08T10:00:00.000-04:00",
                "payer": {"email": "payer@mp.example"}
            })))
            .mount(&server)
            .await;

        let confirmation = client(&server.uri()).confirmation("987654").await.unwrap();
        assert!(confirmation.is_success());
        assert_eq!(confirmation.payment_id, "987654");
        assert_eq!(confirmation.order_id.as_deref(), Some("AstroShop-1"));
        assert_eq!(confirmation.amount, Some(59980.0));
        assert_eq!(confirmation.payer_email.as_deref(), Some("payer@mp.example"));
    }

    #[tokio::test]
    async fn test_get_payment_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/payments/1"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "message": "Payment not found"
            })))
            .mount(&server)
            .await;

        let err = client(&server.uri()).get_payment("1").await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(ref id) if id == "1"));
    }

    #[tokio::test]
    async fn test_get_payment_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/payments/2"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let client = client(&server.uri()).with_retry(
            RetryPolicy::new(1).with_backoff(crate::transport::BackoffStrategy::None),
        );
        let err = client.get_payment("2").await.unwrap_err();
        assert!(matches!(err, GatewayError::Rejected { status: 503, .. }));
    }
}
