//! API router configuration

mod catalog;
mod checkout;
mod health;
mod sheets;
mod webhook;

use crate::error::{ApiError, ApiResult};
use crate::state::{ServerSettings, ServiceState};
use axum::http::{header, HeaderMap};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the storefront router
pub fn build_router(state: ServiceState) -> Router {
    let api_routes = Router::new()
        // Catalog
        .route("/products", get(catalog::list_products))
        .route("/products/:id", get(catalog::get_product))
        .route("/categories", get(catalog::list_categories))
        .route("/regions", get(catalog::list_regions))
        .route("/regions/:region/communes", get(catalog::list_communes))
        // Checkout
        .route("/create-preference", post(checkout::create_preference))
        .route("/create-flow-payment", post(checkout::create_flow_payment))
        // Payment notifications
        .route(
            "/payment-webhook",
            get(webhook::webhook_status).post(webhook::payment_webhook),
        )
        .route("/flow-confirmation", post(webhook::flow_confirmation))
        // Spreadsheet
        .route("/test-sheets", get(sheets::test_sheets));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Base URL the gateways should send the customer and notifications back to.
pub(crate) fn request_origin(headers: &HeaderMap, settings: &ServerSettings) -> String {
    if let Some(origin) = settings.public_origin.as_deref().filter(|o| !o.is_empty()) {
        return origin.trim_end_matches('/').to_string();
    }
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    let proto = header_value("x-forwarded-proto").unwrap_or("http");
    let host = header_value("x-forwarded-host")
        .or_else(|| header_value(header::HOST.as_str()))
        .unwrap_or("localhost");
    format!("{proto}://{host}")
}

/// Reject bodies that are not declared as JSON.
pub(crate) fn require_json(headers: &HeaderMap) -> ApiResult<()> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_ascii_lowercase().starts_with("application/json"))
        .unwrap_or(false);
    if is_json {
        Ok(())
    } else {
        Err(ApiError::bad_request(
            "Invalid content type, expected application/json",
        ))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_origin() {
        let mut headers = HeaderMap::new();
        let settings = ServerSettings::default();
        assert_eq!(request_origin(&headers, &settings), "http://localhost");

        headers.insert(header::HOST, HeaderValue::from_static("tienda.example"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https, http"));
        assert_eq!(request_origin(&headers, &settings), "https://tienda.example");

        let fixed = ServerSettings {
            public_origin: Some("https://shop.example/".into()),
            ..ServerSettings::default()
        };
        assert_eq!(request_origin(&headers, &fixed), "https://shop.example");
    }

    #[test]
    fn test_require_json() {
        let mut headers = HeaderMap::new();
        assert!(require_json(&headers).is_err());
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        assert!(require_json(&headers).is_ok());
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(require_json(&headers).is_err());
    }
}
