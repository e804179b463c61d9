//! Payment notification handlers.
//!
//! Gateways read only the status code, so responses are plain text.

use crate::reconcile::ReconcileOutcome;
use crate::state::ServiceState;
use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use storefront_payments::webhook::{parse_body, WebhookEvent};
use tracing::{info, warn};

const RECEIVED: &str = "Webhook received successfully";

pub async fn webhook_status() -> &'static str {
    "Webhook endpoint is active. Use POST for notifications."
}

/// Verified notifications from either gateway.
pub async fn payment_webhook(
    State(state): State<ServiceState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let payload = match parse_body(content_type, &body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "unreadable webhook body");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let source = match state.verifier.verify(&headers, query.as_deref(), &payload) {
        Ok(source) => source,
        Err(e) => {
            warn!(error = %e, "webhook rejected");
            return verification_failure(e.status_code());
        }
    };

    let event = WebhookEvent::from_payload(source, &payload, query.as_deref());
    info!(%source, ?event, "webhook received");
    reconcile(&state, event).await
}

fn verification_failure(status: u16) -> Response {
    match StatusCode::from_u16(status) {
        Ok(StatusCode::UNAUTHORIZED) => (StatusCode::UNAUTHORIZED, "Invalid signature").into_response(),
        Ok(status) => (status, "Webhook processing error: signature check failed").into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// Flow's `urlConfirmation` callback: a form with the payment token.
///
/// The token alone proves nothing, so the payment state is always fetched
/// from Flow before anything is recorded.
pub async fn flow_confirmation(State(state): State<ServiceState>, body: Bytes) -> Response {
    let token = url::form_urlencoded::parse(&body)
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.trim().to_string())
        .filter(|token| !token.is_empty());
    let Some(token) = token else {
        warn!("Flow confirmation without token");
        return (StatusCode::BAD_REQUEST, "Missing token").into_response();
    };
    reconcile(&state, WebhookEvent::FlowToken { token }).await
}

async fn reconcile(state: &ServiceState, event: WebhookEvent) -> Response {
    match state.reconciler.reconcile(event).await {
        Ok(outcome) => {
            if let ReconcileOutcome::Recorded { order_id, range } = &outcome {
                info!(order_id = %order_id, range = ?range, "webhook processed");
            }
            (StatusCode::OK, RECEIVED).into_response()
        }
        Err(e) => {
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            warn!(status = status.as_u16(), error = %e, "webhook processing failed");
            (status, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::reconcile::testing::{MemorySink, StaticLookup};
    use crate::reconcile::Reconciler;
    use crate::routes::build_router;
    use crate::routes::test_support::{get, send, state};
    use crate::state::ServiceState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Arc;
    use storefront_commerce::checkout::CustomerDetails;
    use storefront_commerce::money::Money;
    use storefront_commerce::order::{
        Gateway, OrderId, PaymentConfirmation, PaymentStatus, PendingOrder,
    };
    use storefront_payments::hmac_sha256_hex;
    use storefront_payments::webhook::WebhookVerifier;
    use tempfile::TempDir;

    const ORDER: &str = "AstroShop-1712590000000-abc123";
    const FLOW_SECRET: &str = "flow-secret";
    const MP_SECRET: &str = "mp-secret";

    fn pending(gateway: Gateway) -> PendingOrder {
        PendingOrder::new(
            OrderId::parse(ORDER).unwrap(),
            gateway,
            CustomerDetails {
                first_name: "Ana".into(),
                last_name: "Rojas".into(),
                email: "ana@example.cl".into(),
                phone: "912345678".into(),
                address: "Av. Providencia 1234".into(),
                region: "Metropolitana".into(),
                commune: "Providencia".into(),
                observations: String::new(),
            },
            Money::clp(29990),
        )
    }

    fn paid(gateway: Gateway) -> PaymentConfirmation {
        PaymentConfirmation::new(gateway, "98765", PaymentStatus::Paid)
            .with_order_id(ORDER)
            .with_amount(29990.0)
    }

    /// State with both secrets, in-memory sheet and fixed lookups.
    async fn setup(sink: Arc<MemorySink>) -> (TempDir, ServiceState) {
        let (dir, state) = state();
        state.store.save(&pending(Gateway::MercadoPago)).await.unwrap();

        let mercadopago = StaticLookup {
            gateway: Gateway::MercadoPago,
            payments: HashMap::from([("98765".to_string(), paid(Gateway::MercadoPago))]),
        };
        let flow = StaticLookup {
            gateway: Gateway::Flow,
            payments: HashMap::from([("tok123".to_string(), paid(Gateway::Flow))]),
        };
        let reconciler = Reconciler::new(state.store.clone())
            .with_sheets(sink)
            .with_lookup(Arc::new(mercadopago))
            .with_lookup(Arc::new(flow));
        let verifier = WebhookVerifier::new()
            .with_flow_secret(FLOW_SECRET)
            .with_mercadopago_secret(MP_SECRET);
        (dir, state.with_reconciler(reconciler).with_verifier(verifier))
    }

    fn flow_request(fields: &[(&str, &str)], signature: &str) -> Request<Body> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        Request::builder()
            .method("POST")
            .uri("/api/payment-webhook")
            .header("content-type", "application/x-www-form-urlencoded")
            .header("x-flow-signature", signature)
            .body(Body::from(body))
            .unwrap()
    }

    fn flow_signature(fields: &[(&str, &str)]) -> String {
        let mut sorted = fields.to_vec();
        sorted.sort();
        let message: String = sorted.iter().map(|(k, v)| format!("{k}{v}")).collect();
        hmac_sha256_hex(FLOW_SECRET, &message).unwrap()
    }

    fn mercadopago_request(payment_id: &str, ts: i64, secret: &str) -> Request<Body> {
        let manifest = format!("id:{payment_id};request-id:req-1;ts:{ts};");
        let v1 = hmac_sha256_hex(secret, &manifest).unwrap();
        let body = serde_json::json!({
            "action": "payment.updated",
            "type": "payment",
            "data": {"id": payment_id}
        });
        Request::builder()
            .method("POST")
            .uri(format!("/api/payment-webhook?data.id={payment_id}&type=payment"))
            .header("content-type", "application/json")
            .header("x-signature", format!("ts={ts},v1={v1}"))
            .header("x-request-id", "req-1")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let (_dir, state) = state();
        let (status, body) = get(build_router(state), "/api/payment-webhook").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Webhook endpoint is active. Use POST for notifications.");
    }

    #[tokio::test]
    async fn test_mercadopago_payment_recorded() {
        let sink = Arc::new(MemorySink::default());
        let (_dir, state) = setup(sink.clone()).await;
        let store = state.store.clone();
        let app = build_router(state);

        let request = mercadopago_request("98765", Utc::now().timestamp(), MP_SECRET);
        let (status, body) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body, "Webhook received successfully");
        assert_eq!(sink.len(), 1);
        assert!(!store.exists(ORDER).await.unwrap());

        // A redelivery finds no pending order.
        let request = mercadopago_request("98765", Utc::now().timestamp(), MP_SECRET);
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, format!("Order data not found for {ORDER}"));
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_mercadopago_bad_signature() {
        let sink = Arc::new(MemorySink::default());
        let (_dir, state) = setup(sink.clone()).await;
        let app = build_router(state);

        let forged = mercadopago_request("98765", Utc::now().timestamp(), "wrong");
        let (status, body) = send(app.clone(), forged).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "Invalid signature");

        let stale = mercadopago_request("98765", Utc::now().timestamp() - 3600, MP_SECRET);
        let (status, _) = send(app, stale).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(sink.len(), 0);
    }

    #[tokio::test]
    async fn test_unknown_payment_is_not_found() {
        let sink = Arc::new(MemorySink::default());
        let (_dir, state) = setup(sink).await;
        let request = mercadopago_request("11111", Utc::now().timestamp(), MP_SECRET);
        let (status, body) = send(build_router(state), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Failed to fetch details for Mercado Pago payment 11111");
    }

    #[tokio::test]
    async fn test_unsigned_request_rejected() {
        let (_dir, state) = state();
        let request = Request::builder()
            .method("POST")
            .uri("/api/payment-webhook")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"type":"payment","data":{"id":"1"}}"#))
            .unwrap();
        let (status, body) = send(build_router(state), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "Invalid signature");
    }

    #[tokio::test]
    async fn test_invalid_json_body() {
        let (_dir, state) = state();
        let request = Request::builder()
            .method("POST")
            .uri("/api/payment-webhook")
            .header("content-type", "application/json")
            .header("x-flow-signature", "abc")
            .body(Body::from("{ nope"))
            .unwrap();
        let (status, _) = send(build_router(state), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_flow_status_notification() {
        let sink = Arc::new(MemorySink::default());
        let (_dir, state) = setup(sink.clone()).await;
        let app = build_router(state);

        let fields = [
            ("token", "tok999"),
            ("status", "2"),
            ("commerceOrder", ORDER),
            ("flowOrder", "8765"),
            ("amount", "29990"),
            ("paymentDate", "2025-04-08 10:00:00"),
        ];
        let (status, body) = send(app, flow_request(&fields, &flow_signature(&fields))).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_flow_pending_keeps_order() {
        let sink = Arc::new(MemorySink::default());
        let (_dir, state) = setup(sink.clone()).await;
        let store = state.store.clone();
        let app = build_router(state);

        let fields = [("token", "tok999"), ("status", "1"), ("commerceOrder", ORDER)];
        let (status, _) = send(app, flow_request(&fields, &flow_signature(&fields))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sink.len(), 0);
        assert!(store.exists(ORDER).await.unwrap());
    }

    #[tokio::test]
    async fn test_flow_tampered_payload() {
        let sink = Arc::new(MemorySink::default());
        let (_dir, state) = setup(sink.clone()).await;
        let fields = [("token", "tok999"), ("status", "2"), ("commerceOrder", ORDER)];
        let signature = flow_signature(&fields);
        let tampered = [("token", "tok999"), ("status", "2"), ("commerceOrder", "AstroShop-2")];
        let (status, _) = send(build_router(state), flow_request(&tampered, &signature)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(sink.len(), 0);
    }

    #[tokio::test]
    async fn test_flow_confirmation_fetches_status() {
        let sink = Arc::new(MemorySink::default());
        let (_dir, state) = setup(sink.clone()).await;
        let app = build_router(state);

        let request = Request::builder()
            .method("POST")
            .uri("/api/flow-confirmation")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("token=tok123"))
            .unwrap();
        let (status, body) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(sink.len(), 1);

        let request = Request::builder()
            .method("POST")
            .uri("/api/flow-confirmation")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("other=1"))
            .unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Missing token");
    }

    #[tokio::test]
    async fn test_sheet_failure_keeps_order_for_retry() {
        let sink = Arc::new(MemorySink::failing());
        let (_dir, state) = setup(sink).await;
        let store = state.store.clone();

        let request = mercadopago_request("98765", Utc::now().timestamp(), MP_SECRET);
        let (status, body) = send(build_router(state), request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("Webhook processing error:"), "{body}");
        assert!(store.exists(ORDER).await.unwrap());
    }

    #[test]
    fn test_verification_failure_status() {
        assert_eq!(super::verification_failure(401).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            super::verification_failure(500).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
