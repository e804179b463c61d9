//! Turns a verified payment notification into a spreadsheet row.
//!
//! Only paid orders are recorded. The pending order is read from the temp
//! store, appended to the sheet and then deleted, so a repeated delivery
//! for the same order finds nothing and records nothing. Deliveries for
//! the same order are serialised.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use storefront_commerce::order::{Gateway, OrderId, PaymentConfirmation, PaymentStatus};
use storefront_commerce::sheet::SheetRow;
use storefront_payments::webhook::WebhookEvent;
use storefront_payments::{GatewayError, PaymentLookup};
use storefront_sheets::{RowSink, SheetsError};
use storefront_store::{StoreError, TempOrderStore};
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{error, info, warn};

/// What happened to a notification.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// Not a payment notification.
    Ignored,
    /// The payment is not (yet) paid; the pending order is kept.
    NotPaid { order_id: String, status: PaymentStatus },
    /// The order was written to the sheet and removed from the store.
    Recorded {
        order_id: OrderId,
        range: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Server configuration error: {} credentials missing.", .0.display_name())]
    LookupNotConfigured(Gateway),

    #[error("Failed to fetch details for {} payment {reference}", .gateway.display_name())]
    PaymentNotFound { gateway: Gateway, reference: String },

    #[error("Error fetching {} payment details: {source}", .gateway.display_name())]
    Lookup {
        gateway: Gateway,
        #[source]
        source: GatewayError,
    },

    #[error("Order data not found for {0}")]
    OrderNotFound(String),

    #[error("Webhook processing error: {0}")]
    Store(#[from] StoreError),

    #[error("Webhook processing error: Google Sheets is not configured")]
    SheetsNotConfigured,

    #[error("Webhook processing error: {0}")]
    Sheets(#[from] SheetsError),
}

impl ReconcileError {
    /// HTTP status answered to the gateway. 5xx makes it retry.
    pub fn status_code(&self) -> u16 {
        match self {
            ReconcileError::PaymentNotFound { .. } | ReconcileError::OrderNotFound(_) => 404,
            _ => 500,
        }
    }
}

/// Per-order async locks. Idle entries are dropped on the next acquire.
#[derive(Debug, Default)]
struct OrderLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl OrderLocks {
    async fn acquire(&self, order_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(order_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Reconciles payment notifications against the temp order store.
#[derive(Clone)]
pub struct Reconciler {
    store: TempOrderStore,
    sheets: Option<Arc<dyn RowSink>>,
    lookups: HashMap<Gateway, Arc<dyn PaymentLookup>>,
    locks: Arc<OrderLocks>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("store", &self.store)
            .field("sheets", &self.sheets.is_some())
            .field("lookups", &self.lookups.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Reconciler {
    pub fn new(store: TempOrderStore) -> Self {
        Self {
            store,
            sheets: None,
            lookups: HashMap::new(),
            locks: Arc::new(OrderLocks::default()),
        }
    }

    pub fn with_sheets(mut self, sheets: Arc<dyn RowSink>) -> Self {
        self.sheets = Some(sheets);
        self
    }

    /// Register how payments of a gateway are fetched.
    pub fn with_lookup(mut self, lookup: Arc<dyn PaymentLookup>) -> Self {
        self.lookups.insert(lookup.gateway(), lookup);
        self
    }

    pub fn has_sheets(&self) -> bool {
        self.sheets.is_some()
    }

    pub fn sheets(&self) -> Option<&Arc<dyn RowSink>> {
        self.sheets.as_ref()
    }

    pub fn has_lookup(&self, gateway: Gateway) -> bool {
        self.lookups.contains_key(&gateway)
    }

    pub async fn reconcile(&self, event: WebhookEvent) -> Result<ReconcileOutcome, ReconcileError> {
        let confirmation = match event {
            WebhookEvent::Unrecognized => {
                warn!("unrecognised webhook payload");
                return Ok(ReconcileOutcome::Ignored);
            }
            WebhookEvent::FlowStatus(confirmation) => confirmation,
            WebhookEvent::FlowToken { token } => self.lookup(Gateway::Flow, &token).await?,
            WebhookEvent::MercadoPagoPayment { payment_id } => {
                self.lookup(Gateway::MercadoPago, &payment_id).await?
            }
        };
        self.record(confirmation).await
    }

    async fn lookup(
        &self,
        gateway: Gateway,
        reference: &str,
    ) -> Result<PaymentConfirmation, ReconcileError> {
        let lookup = self
            .lookups
            .get(&gateway)
            .ok_or(ReconcileError::LookupNotConfigured(gateway))?;
        info!(%gateway, reference, "fetching payment details");
        lookup.confirmation(reference).await.map_err(|e| match e {
            GatewayError::NotFound(_) => ReconcileError::PaymentNotFound {
                gateway,
                reference: reference.to_string(),
            },
            GatewayError::NotConfigured(_) => ReconcileError::LookupNotConfigured(gateway),
            source => ReconcileError::Lookup { gateway, source },
        })
    }

    /// Record a confirmed payment.
    pub async fn record(
        &self,
        confirmation: PaymentConfirmation,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let order_ref = confirmation
            .order_id
            .clone()
            .unwrap_or_else(|| "N/A".to_string());

        if !confirmation.is_success() {
            info!(
                order_id = %order_ref,
                status = %confirmation.status,
                "payment not successful, order left pending"
            );
            return Ok(ReconcileOutcome::NotPaid {
                order_id: order_ref,
                status: confirmation.status,
            });
        }

        let order_id =
            OrderId::parse(&order_ref).map_err(|_| ReconcileError::OrderNotFound(order_ref))?;
        let _guard = self.locks.acquire(order_id.as_str()).await;

        let Some(pending) = self.store.get(&order_id).await? else {
            error!(order_id = %order_id, "paid order has no pending record");
            return Err(ReconcileError::OrderNotFound(order_id.into_inner()));
        };
        let sheets = self
            .sheets
            .as_ref()
            .ok_or(ReconcileError::SheetsNotConfigured)?;

        let row = SheetRow::build(&pending, &confirmation, Utc::now());
        let range = sheets.append(&row).await?;
        info!(order_id = %order_id, payment_id = %confirmation.payment_id, "order recorded");

        // The row is written; a failed delete must not make the gateway retry.
        if let Err(e) = self.store.delete(&order_id).await {
            error!(order_id = %order_id, error = %e, "failed to delete pending order");
        }
        Ok(ReconcileOutcome::Recorded { order_id, range })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    /// Sheet stand-in that keeps appended rows in memory.
    #[derive(Default)]
    pub struct MemorySink {
        pub rows: StdMutex<Vec<SheetRow>>,
        pub fail: bool,
    }

    impl MemorySink {
        pub fn failing() -> Self {
            Self {
                rows: StdMutex::default(),
                fail: true,
            }
        }

        pub fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RowSink for MemorySink {
        async fn append(&self, row: &SheetRow) -> Result<Option<String>, SheetsError> {
            if self.fail {
                return Err(SheetsError::Rejected {
                    status: 403,
                    message: "The caller does not have permission".into(),
                });
            }
            tokio::task::yield_now().await;
            let mut rows = self.rows.lock().unwrap();
            rows.push(row.clone());
            Ok(Some(format!("'Hoja 1'!A{0}:K{0}", rows.len() + 1)))
        }
    }

    /// Gateway stand-in answering from a fixed table.
    pub struct StaticLookup {
        pub gateway: Gateway,
        pub payments: HashMap<String, PaymentConfirmation>,
    }

    #[async_trait]
    impl PaymentLookup for StaticLookup {
        fn gateway(&self) -> Gateway {
            self.gateway
        }

        async fn confirmation(&self, reference: &str) -> Result<PaymentConfirmation, GatewayError> {
            self.payments
                .get(reference)
                .cloned()
                .ok_or_else(|| GatewayError::NotFound(reference.to_string()))
        }
    }
}
