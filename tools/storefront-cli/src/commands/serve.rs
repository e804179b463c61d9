//! Run the HTTP API.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use storefront_server::{PurgeSchedule, Server};
use tracing::{debug, info};

use super::ServeArgs;
use crate::context::Context;

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    let report = ctx.config.validate();
    for warning in &report.warnings {
        ctx.output.warn(warning);
    }
    if !report.is_ok() {
        for error in &report.errors {
            ctx.output.error(error);
        }
        bail!("Configuration has {} error(s)", report.errors.len());
    }

    let listen = args.listen.as_deref().unwrap_or(&ctx.config.server.listen);
    let addr: SocketAddr = listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", listen))?;

    debug!(%addr, config = ?ctx.config_path, "starting server");
    let state = ctx.service_state().await?;
    let mut server = Server::new(state);
    let purge_hours = ctx.config.server.purge_after_hours;
    if !args.no_purge && purge_hours > 0 {
        server = server.with_purge(PurgeSchedule {
            every: Duration::from_secs(60 * 60),
            max_age: Duration::from_secs(purge_hours * 60 * 60),
        });
    }

    ctx.output.info(&format!("Serving on http://{}", addr));
    server.run(addr).await?;
    info!("server stopped");
    ctx.output.success("Server stopped");
    Ok(())
}
