use crate::state::ServiceState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use storefront_commerce::order::Gateway;

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub uptime_secs: i64,
    pub products: usize,
    pub integrations: Integrations,
}

/// Which integrations are configured.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Integrations {
    pub mercado_pago: bool,
    pub flow: bool,
    pub sheets: bool,
    pub payment_lookups: Vec<&'static str>,
}

pub async fn health_check(State(state): State<ServiceState>) -> Json<HealthResponse> {
    let payment_lookups = [Gateway::MercadoPago, Gateway::Flow]
        .into_iter()
        .filter(|g| state.reconciler.has_lookup(*g))
        .map(|g| g.as_str())
        .collect();

    Json(HealthResponse {
        status: "ok",
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        products: state.catalog.len(),
        integrations: Integrations {
            mercado_pago: state.mercadopago.is_some(),
            flow: state.flow.is_some(),
            sheets: state.reconciler.has_sheets(),
            payment_lookups,
        },
    })
}
