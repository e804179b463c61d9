//! Storefront CLI - run and operate the storefront.
//!
//! Commands:
//! - `storefront serve` - Run the HTTP API
//! - `storefront config` - Manage configuration
//! - `storefront catalog` - Inspect the product catalog
//! - `storefront orders` - Inspect and clean up pending orders
//! - `storefront sheets` - Check the orders spreadsheet

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::{CatalogArgs, ConfigArgs, OrdersArgs, ServeArgs, SheetsArgs};

/// Storefront CLI - catalog, checkout and payment reconciliation
#[derive(Parser)]
#[command(name = "storefront")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),

    /// Manage configuration
    Config(ConfigArgs),

    /// Inspect the product catalog
    Catalog(CatalogArgs),

    /// Inspect and clean up pending orders
    Orders(OrdersArgs),

    /// Check the orders spreadsheet
    Sheets(SheetsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = match context::Context::load(config_path, output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Serve(args) => commands::serve::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
        Commands::Catalog(args) => commands::catalog::run(args, &ctx).await,
        Commands::Orders(args) => commands::orders::run(args, &ctx).await,
        Commands::Sheets(args) => commands::sheets::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

/// Logs go to stderr so `--json` command output stays parseable.
fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose {
        "storefront=debug,storefront_server=debug,storefront_payments=debug,storefront_sheets=debug,storefront_store=debug,tower_http=debug"
    } else {
        "storefront=info,storefront_server=info,storefront_payments=info,storefront_sheets=info,storefront_store=info"
    };
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
