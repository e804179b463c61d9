//! Server setup and lifecycle management

use crate::routes::build_router;
use crate::state::ServiceState;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// How often and how aggressively abandoned checkouts are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeSchedule {
    pub every: Duration,
    pub max_age: Duration,
}

impl Default for PurgeSchedule {
    fn default() -> Self {
        Self {
            every: Duration::from_secs(60 * 60),
            max_age: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Storefront HTTP server
pub struct Server {
    state: ServiceState,
    purge: Option<PurgeSchedule>,
}

impl Server {
    pub fn new(state: ServiceState) -> Self {
        Self { state, purge: None }
    }

    /// Periodically delete pending orders nobody paid for.
    pub fn with_purge(mut self, schedule: PurgeSchedule) -> Self {
        self.purge = Some(schedule);
        self
    }

    /// Bind `addr` and serve until Ctrl+C or SIGTERM.
    pub async fn run(self, addr: SocketAddr) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        if let Ok(addr) = listener.local_addr() {
            info!("storefront listening on {}", addr);
        }
        info!(
            store = %self.state.store.dir().display(),
            mercadopago = self.state.mercadopago.is_some(),
            flow = self.state.flow.is_some(),
            sheets = self.state.reconciler.has_sheets(),
            "integrations"
        );

        let (stop_tx, stop_rx) = watch::channel(false);
        let purger = self
            .purge
            .map(|schedule| tokio::spawn(purge_loop(self.state.clone(), schedule, stop_rx)));

        let app = build_router(self.state);
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(ServerError::Serve);

        info!("storefront shutting down");
        let _ = stop_tx.send(true);
        if let Some(purger) = purger {
            if let Err(e) = purger.await {
                warn!(error = %e, "purge task ended abnormally");
            }
        }
        result
    }
}

async fn purge_loop(state: ServiceState, schedule: PurgeSchedule, mut stop: watch::Receiver<bool>) {
    let max_age = match chrono::Duration::from_std(schedule.max_age) {
        Ok(max_age) => max_age,
        Err(e) => {
            error!(error = %e, "invalid purge age, stale orders will not be removed");
            return;
        }
    };
    let mut interval = tokio::time::interval(schedule.every);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = state.store.purge_older_than(max_age).await {
                    warn!(error = %e, "failed to purge stale orders");
                }
            }
            _ = stop.changed() => break,
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
