//! HTTP API for the storefront.
//!
//! Serves the product catalog and the Chilean region directory, starts
//! checkouts at Mercado Pago or Flow, and reconciles their payment
//! notifications into the orders spreadsheet.
//!
//! # Example
//!
//! ```ignore
//! use storefront_server::{Server, ServiceState};
//!
//! let state = ServiceState::new(Catalog::builtin(), TempOrderStore::default())
//!     .with_mercadopago(MercadoPagoClient::new(MERCADOPAGO_API_BASE, token)?)
//!     .with_sheets(Arc::new(sheets));
//!
//! Server::new(state).run("0.0.0.0:3000".parse()?).await?;
//! ```

pub mod error;
pub mod reconcile;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use reconcile::{ReconcileError, ReconcileOutcome, Reconciler};
pub use routes::build_router;
pub use server::{PurgeSchedule, Server, ServerError};
pub use state::{ServerSettings, ServiceState};
