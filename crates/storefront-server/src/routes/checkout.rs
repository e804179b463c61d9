//! Checkout handlers: Mercado Pago preferences and Flow payments.
//!
//! Both persist the customer's details as a pending order before calling
//! the gateway, so the payment notification can be matched to them later.

use crate::error::{ApiError, ApiResult};
use crate::routes::{request_origin, require_json};
use crate::state::ServiceState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;
use storefront_commerce::checkout::{CheckoutRequest, FlowCheckoutRequest};
use storefront_commerce::order::{Gateway, OrderId, PendingOrder};
use storefront_commerce::CommerceError;
use storefront_payments::flow::FlowPaymentRequest;
use storefront_payments::mercadopago::{PreferencePayer, PreferenceRequest};
use tracing::{info, warn};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceResponse {
    pub preference_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
    pub order_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowPaymentResponse {
    pub redirect_url: String,
    pub order_id: String,
}

pub async fn create_preference(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<PreferenceResponse>> {
    let client = state
        .mercadopago
        .as_ref()
        .ok_or_else(|| ApiError::internal("Server configuration error: Access Token missing."))?;
    require_json(&headers)?;

    let request: CheckoutRequest = parse_json(&body)?;
    request.validate_items().map_err(item_error)?;
    request.customer.validate().map_err(ApiError::Validation)?;
    let amount = request.total()?;

    let shipping = request.shipping();
    let order_id = OrderId::generate(&state.settings.order_prefix);
    let pending = PendingOrder::new(order_id.clone(), Gateway::MercadoPago, request.customer, amount)
        .with_items(request.items.clone())
        .with_shipping_cost(shipping);
    state.store.save(&pending).await?;

    let origin = request_origin(&headers, &state.settings);
    let mut preference = PreferenceRequest::new(order_id.clone(), request.items, &origin)
        .with_payer(PreferencePayer::from(&pending.customer))
        .with_shipping_cost(pending.shipping_cost);
    if origin.starts_with("https://") {
        preference = preference.with_notification_url(format!("{origin}/api/payment-webhook"));
    }

    match client.create_preference(&preference).await {
        Ok(created) => {
            info!(order_id = %order_id, preference_id = %created.id, amount = %amount, "checkout started");
            Ok(Json(PreferenceResponse {
                checkout_url: created.checkout_url().map(str::to_string),
                preference_id: created.id,
                order_id: order_id.into_inner(),
            }))
        }
        Err(e) => {
            discard(&state, &order_id).await;
            Err(e.into())
        }
    }
}

pub async fn create_flow_payment(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<FlowPaymentResponse>> {
    let client = state
        .flow
        .as_ref()
        .ok_or_else(|| ApiError::internal("Server configuration error: Flow credentials missing."))?;
    require_json(&headers)?;

    let request: FlowCheckoutRequest = parse_json(&body)?;
    let amount = request.amount().map_err(|_| {
        ApiError::bad_request("Invalid request body: Missing or invalid amount or email.")
    })?;
    request.customer.validate().map_err(ApiError::Validation)?;

    let order_id = OrderId::generate(&state.settings.order_prefix);
    let pending = PendingOrder::new(order_id.clone(), Gateway::Flow, request.customer, amount);
    state.store.save(&pending).await?;

    let origin = request_origin(&headers, &state.settings);
    let payment = FlowPaymentRequest::new(order_id.clone(), amount, pending.customer.email.clone(), &origin);

    match client.create_payment(&payment).await {
        Ok(link) => {
            info!(order_id = %order_id, amount = %amount, "Flow checkout started");
            Ok(Json(FlowPaymentResponse {
                redirect_url: link.redirect_url(),
                order_id: order_id.into_inner(),
            }))
        }
        Err(e) => {
            discard(&state, &order_id).await;
            Err(e.into())
        }
    }
}

fn parse_json<T: DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request("Invalid request body").with_details(e.to_string()))
}

fn item_error(e: CommerceError) -> ApiError {
    match e {
        CommerceError::ValidationError(message) => ApiError::bad_request(message),
        other => ApiError::bad_request("Invalid item structure in request body")
            .with_details(other.to_string()),
    }
}

/// Drop the pending order of a checkout the gateway refused.
async fn discard(state: &ServiceState, order_id: &OrderId) {
    if let Err(e) = state.store.delete(order_id).await {
        warn!(order_id = %order_id, error = %e, "failed to discard pending order");
    }
}

#[cfg(test)]
mod tests {
    use crate::routes::build_router;
    use crate::routes::test_support::{json, post_json, send, state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use storefront_payments::flow::{FlowClient, FlowCredentials};
    use storefront_payments::mercadopago::MercadoPagoClient;
    use storefront_payments::RetryPolicy;
    use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn customer() -> serde_json::Value {
        json!({
            "firstName": "Ana",
            "lastName": "Rojas",
            "email": "ana@example.cl",
            "phone": "+56 9 1234 5678",
            "address": "Av. Providencia 1234",
            "region": "Metropolitana",
            "commune": "Providencia",
            "observations": "Dejar en conserjería"
        })
    }

    fn checkout_body() -> serde_json::Value {
        let mut body = customer();
        body["items"] = json!([
            {"id": "1-M", "title": "Camiseta Minimal (M)", "quantity": 2, "unit_price": 29990}
        ]);
        body["shippingCost"] = json!(3990);
        body
    }

    fn mercadopago(server: &MockServer) -> MercadoPagoClient {
        MercadoPagoClient::new(server.uri(), "TEST-token")
            .unwrap()
            .with_retry(RetryPolicy::none())
    }

    fn flow(server: &MockServer) -> FlowClient {
        FlowClient::new(server.uri(), FlowCredentials::new("api-key", "secret"))
            .unwrap()
            .with_retry(RetryPolicy::none())
    }

    #[tokio::test]
    async fn test_create_preference_persists_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkout/preferences"))
            .and(body_partial_json(json!({
                "back_urls": {"success": "http://tienda.example/orden-confirmada"},
                "shipments": {"cost": 3990}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "pref-1",
                "init_point": "https://www.mercadopago.cl/checkout/v1/redirect?pref_id=pref-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (_dir, state) = state();
        let store = state.store.clone();
        let app = build_router(state.with_mercadopago(mercadopago(&server)));

        let (status, body) = post_json(app, "/api/create-preference", checkout_body()).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let body = json(&body);
        assert_eq!(body["preferenceId"], "pref-1");
        let order_id = body["orderId"].as_str().unwrap();
        assert!(order_id.starts_with("AstroShop-"));

        let pending = store.get(order_id).await.unwrap().unwrap();
        assert_eq!(pending.amount.amount_minor, 2 * 29990 + 3990);
        assert_eq!(pending.customer.phone, "56912345678");
        assert_eq!(pending.items.len(), 1);
        assert_eq!(pending.shipping_cost.amount_minor, 3990);
        assert_eq!(
            body["checkoutUrl"],
            "https://www.mercadopago.cl/checkout/v1/redirect?pref_id=pref-1"
        );
    }

    #[tokio::test]
    async fn test_create_preference_without_checkout_url_keeps_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkout/preferences"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "pref-2"})))
            .mount(&server)
            .await;

        let (_dir, state) = state();
        let store = state.store.clone();
        let app = build_router(state.with_mercadopago(mercadopago(&server)));

        let (status, body) = post_json(app, "/api/create-preference", checkout_body()).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let body = json(&body);
        assert_eq!(body["preferenceId"], "pref-2");
        assert!(body.get("checkoutUrl").is_none());
        let order_id = body["orderId"].as_str().unwrap();
        assert!(store.exists(order_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_preference_requires_token() {
        let (_dir, state) = state();
        let (status, body) =
            post_json(build_router(state), "/api/create-preference", checkout_body()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json(&body)["error"],
            "Server configuration error: Access Token missing."
        );
    }

    #[tokio::test]
    async fn test_create_preference_rejects_bad_input() {
        let server = MockServer::start().await;
        let (_dir, state) = state();
        let app = build_router(state.with_mercadopago(mercadopago(&server)));

        let request = Request::builder()
            .method("POST")
            .uri("/api/create-preference")
            .header("content-type", "text/plain")
            .body(Body::from(checkout_body().to_string()))
            .unwrap();
        let (status, body) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&body)["error"], "Invalid content type, expected application/json");

        let mut no_items = checkout_body();
        no_items["items"] = json!([]);
        let (status, body) = post_json(app.clone(), "/api/create-preference", no_items).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&body)["error"], "Invalid or empty items array in request body");

        let mut bad_quantity = checkout_body();
        bad_quantity["items"][0]["quantity"] = json!(0);
        let (status, body) = post_json(app.clone(), "/api/create-preference", bad_quantity).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&body)["error"], "Invalid item structure in request body");

        let mut bad_customer = checkout_body();
        bad_customer["email"] = json!("not-an-email");
        bad_customer["commune"] = json!("Quilpue");
        let (status, body) = post_json(app, "/api/create-preference", bad_customer).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body = json(&body);
        assert!(body["fields"]["email"].is_string());
        assert!(body["fields"]["commune"].is_string());
        assert!(body["fields"]["firstName"].is_null());
    }

    #[tokio::test]
    async fn test_create_preference_gateway_failure_discards_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkout/preferences"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "invalid access token"
            })))
            .mount(&server)
            .await;

        let (_dir, state) = state();
        let store = state.store.clone();
        let app = build_router(state.with_mercadopago(mercadopago(&server)));

        let (status, body) = post_json(app, "/api/create-preference", checkout_body()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json(&body)["error"], "invalid access token");
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_flow_payment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payment/create"))
            .and(body_string_contains("amount=63970"))
            .and(body_string_contains("email=ana%40example.cl"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "url": "https://sandbox.flow.cl/app/web/pay.php",
                "token": "tok123",
                "flowOrder": 8765
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (_dir, state) = state();
        let store = state.store.clone();
        let app = build_router(state.with_flow(flow(&server)));

        let mut body = customer();
        body["amount"] = json!(63970);
        let (status, body) = post_json(app, "/api/create-flow-payment", body).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let body = json(&body);
        assert_eq!(
            body["redirectUrl"],
            "https://sandbox.flow.cl/app/web/pay.php?token=tok123"
        );
        let pending = store.get(body["orderId"].as_str().unwrap()).await.unwrap().unwrap();
        assert_eq!(pending.amount.amount_minor, 63970);
    }

    #[tokio::test]
    async fn test_create_flow_payment_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payment/create"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": 1620,
                "message": "The amount is invalid"
            })))
            .mount(&server)
            .await;

        let (_dir, state) = state();
        let (status, _) =
            post_json(build_router(state.clone()), "/api/create-flow-payment", customer()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let app = build_router(state.with_flow(flow(&server)));
        let (status, body) = post_json(app.clone(), "/api/create-flow-payment", customer()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json(&body)["error"],
            "Invalid request body: Missing or invalid amount or email."
        );

        let mut body = customer();
        body["amount"] = json!(1000);
        let (status, body) = post_json(app, "/api/create-flow-payment", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&body)["error"], "The amount is invalid");
    }
}
