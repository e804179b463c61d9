//! CLI command implementations.

pub mod catalog;
pub mod config;
pub mod orders;
pub mod serve;
pub mod sheets;

use clap::{Args, Subcommand};

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on (overrides server.listen).
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Do not purge stale pending orders while serving.
    #[arg(long)]
    pub no_purge: bool,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration (secrets masked).
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,

        /// Skip prompts and write the defaults.
        #[arg(short, long)]
        yes: bool,
    },
    /// Validate the configuration.
    Validate,
}

/// Arguments for the catalog command.
#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: Option<CatalogCommand>,
}

#[derive(Subcommand)]
pub enum CatalogCommand {
    /// List products.
    List {
        /// Only products in this category.
        #[arg(short, long)]
        category: Option<String>,

        /// Case-insensitive search on name, description and tags.
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one product.
    Show {
        /// Product id.
        id: String,
    },
}

/// Arguments for the orders command.
#[derive(Args)]
pub struct OrdersArgs {
    #[command(subcommand)]
    pub command: Option<OrdersCommand>,
}

#[derive(Subcommand)]
pub enum OrdersCommand {
    /// List pending orders, oldest first.
    List,
    /// Show a pending order.
    Show {
        /// Order id.
        id: String,
    },
    /// Delete a pending order.
    Delete {
        /// Order id.
        id: String,
        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete pending orders older than a number of hours.
    Purge {
        /// Age in hours.
        #[arg(long, default_value = "168")]
        older_than: u64,
        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the sheets command.
#[derive(Args)]
pub struct SheetsArgs {
    #[command(subcommand)]
    pub command: SheetsCommand,
}

#[derive(Subcommand)]
pub enum SheetsCommand {
    /// Append a test row to the spreadsheet.
    Test,
    /// Print the expected header row.
    Header,
}
