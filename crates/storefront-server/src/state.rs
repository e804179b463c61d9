//! Shared application state for the handlers.

use crate::reconcile::Reconciler;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use storefront_commerce::catalog::Catalog;
use storefront_commerce::order::DEFAULT_ORDER_PREFIX;
use storefront_payments::flow::FlowClient;
use storefront_payments::mercadopago::MercadoPagoClient;
use storefront_payments::webhook::WebhookVerifier;
use storefront_sheets::RowSink;
use storefront_store::TempOrderStore;

/// Settings the handlers need that do not belong to a client.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Public base URL (`https://tienda.example`). When unset, callback URLs
    /// are derived from the request's `Host` and `X-Forwarded-Proto`.
    pub public_origin: Option<String>,
    /// Prefix of generated order ids.
    pub order_prefix: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            public_origin: None,
            order_prefix: DEFAULT_ORDER_PREFIX.to_string(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct ServiceState {
    pub catalog: Arc<Catalog>,
    pub store: TempOrderStore,
    pub mercadopago: Option<MercadoPagoClient>,
    pub flow: Option<FlowClient>,
    pub verifier: Arc<WebhookVerifier>,
    pub reconciler: Reconciler,
    pub settings: Arc<ServerSettings>,
    pub version: String,
    pub started_at: DateTime<Utc>,
}

impl ServiceState {
    /// State with no gateways, no webhook secrets and no spreadsheet.
    pub fn new(catalog: Catalog, store: TempOrderStore) -> Self {
        Self {
            catalog: Arc::new(catalog),
            reconciler: Reconciler::new(store.clone()),
            store,
            mercadopago: None,
            flow: None,
            verifier: Arc::new(WebhookVerifier::new()),
            settings: Arc::new(ServerSettings::default()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
        }
    }

    /// Enable Mercado Pago checkout and payment lookups.
    pub fn with_mercadopago(mut self, client: MercadoPagoClient) -> Self {
        self.reconciler = self.reconciler.with_lookup(Arc::new(client.clone()));
        self.mercadopago = Some(client);
        self
    }

    /// Enable Flow checkout and status lookups.
    pub fn with_flow(mut self, client: FlowClient) -> Self {
        self.reconciler = self.reconciler.with_lookup(Arc::new(client.clone()));
        self.flow = Some(client);
        self
    }

    pub fn with_sheets(mut self, sheets: Arc<dyn RowSink>) -> Self {
        self.reconciler = self.reconciler.with_sheets(sheets);
        self
    }

    pub fn with_verifier(mut self, verifier: WebhookVerifier) -> Self {
        self.verifier = Arc::new(verifier);
        self
    }

    pub fn with_settings(mut self, settings: ServerSettings) -> Self {
        self.settings = Arc::new(settings);
        self
    }

    /// Replace the reconciler, e.g. to plug in custom payment lookups.
    pub fn with_reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    /// Seconds since the state was created.
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
