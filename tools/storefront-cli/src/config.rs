//! CLI configuration.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use storefront_commerce::order::DEFAULT_ORDER_PREFIX;
use storefront_payments::flow::FLOW_API_BASE;
use storefront_payments::mercadopago::MERCADOPAGO_API_BASE;
use storefront_sheets::{DEFAULT_SHEET_NAME, SHEETS_API_BASE};
use storefront_store::DEFAULT_TEMP_DIR;

/// Config file names, in lookup order.
pub const CONFIG_NAMES: [&str; 3] = ["storefront.toml", ".storefront.toml", "storefront.json"];

/// Environment variables that override secrets in the config file.
pub const ENV_MERCADOPAGO_ACCESS_TOKEN: &str = "MERCADO_PAGO_ACCESS_TOKEN";
pub const ENV_MERCADOPAGO_WEBHOOK_SECRET: &str = "MP_WEBHOOK_SECRET";
pub const ENV_FLOW_API_KEY: &str = "FLOW_API_KEY";
pub const ENV_FLOW_SECRET_KEY: &str = "FLOW_SECRET_KEY";
pub const ENV_GOOGLE_SHEET_ID: &str = "GOOGLE_SHEET_ID";
pub const ENV_GOOGLE_CREDENTIALS_PATH: &str = "GOOGLE_CREDENTIALS_PATH";

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Temp order store configuration.
    #[serde(default)]
    pub store: StoreConfig,

    /// Mercado Pago configuration.
    #[serde(default)]
    pub mercadopago: MercadoPagoConfig,

    /// Flow configuration.
    #[serde(default)]
    pub flow: FlowConfig,

    /// Google Sheets configuration.
    #[serde(default)]
    pub sheets: SheetsConfig,

    /// Catalog configuration.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::parse(path, &content)
    }

    /// Parse config text; `.json` paths are JSON, anything else TOML.
    pub fn parse(path: &str, content: &str) -> Result<Self> {
        if path.ends_with(".json") {
            serde_json::from_str(content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(content).with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Override secrets from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Override secrets from `lookup`. Empty values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = var(ENV_MERCADOPAGO_ACCESS_TOKEN) {
            self.mercadopago.access_token = Some(v);
        }
        if let Some(v) = var(ENV_MERCADOPAGO_WEBHOOK_SECRET) {
            self.mercadopago.webhook_secret = Some(v);
        }
        if let Some(v) = var(ENV_FLOW_API_KEY) {
            self.flow.api_key = Some(v);
        }
        if let Some(v) = var(ENV_FLOW_SECRET_KEY) {
            self.flow.secret_key = Some(v);
        }
        if let Some(v) = var(ENV_GOOGLE_SHEET_ID) {
            self.sheets.spreadsheet_id = Some(v);
        }
        if let Some(v) = var(ENV_GOOGLE_CREDENTIALS_PATH) {
            self.sheets.credentials_path = Some(v);
        }
    }

    /// Check the configuration. Missing integrations are warnings; the
    /// affected endpoints answer 500 until they are configured.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        if self.server.listen.parse::<SocketAddr>().is_err() {
            report.errors.push(format!(
                "server.listen '{}' is not a socket address (e.g. 0.0.0.0:3000)",
                self.server.listen
            ));
        }
        if let Some(origin) = self.server.public_origin.as_deref() {
            if !origin.starts_with("http://") && !origin.starts_with("https://") {
                report
                    .errors
                    .push("server.public_origin must start with http:// or https://".to_string());
            } else if origin.starts_with("http://") {
                report.warnings.push(
                    "server.public_origin is not https; Mercado Pago notifications are disabled"
                        .to_string(),
                );
            }
        }
        if self.server.order_prefix.trim().is_empty() {
            report.errors.push("server.order_prefix must not be empty".to_string());
        }
        if self.store.dir.trim().is_empty() {
            report.errors.push("store.dir must not be empty".to_string());
        }

        for (key, base) in [
            ("mercadopago.api_base", &self.mercadopago.api_base),
            ("flow.api_base", &self.flow.api_base),
            ("sheets.api_base", &self.sheets.api_base),
        ] {
            if !base.starts_with("http://") && !base.starts_with("https://") {
                report.errors.push(format!("{} must be an http(s) URL", key));
            }
        }

        if !self.mercadopago.is_configured() {
            report.warnings.push(format!(
                "Mercado Pago access token missing (set mercadopago.access_token or {})",
                ENV_MERCADOPAGO_ACCESS_TOKEN
            ));
        } else if self.mercadopago.webhook_secret.is_none() {
            report.warnings.push(format!(
                "Mercado Pago webhook secret missing; its notifications will be rejected (set {})",
                ENV_MERCADOPAGO_WEBHOOK_SECRET
            ));
        }

        match (&self.flow.api_key, &self.flow.secret_key) {
            (Some(_), Some(_)) => {}
            (None, None) => report.warnings.push(format!(
                "Flow credentials missing (set {} and {})",
                ENV_FLOW_API_KEY, ENV_FLOW_SECRET_KEY
            )),
            _ => report
                .errors
                .push("flow.api_key and flow.secret_key must be set together".to_string()),
        }

        match (&self.sheets.spreadsheet_id, &self.sheets.credentials_path) {
            (Some(_), Some(_)) => {}
            (None, None) => report.warnings.push(format!(
                "Google Sheets not configured; paid orders cannot be recorded (set {} and {})",
                ENV_GOOGLE_SHEET_ID, ENV_GOOGLE_CREDENTIALS_PATH
            )),
            _ => report.errors.push(
                "sheets.spreadsheet_id and sheets.credentials_path must be set together".to_string(),
            ),
        }
        if self.sheets.sheet_name.trim().is_empty() {
            report.errors.push("sheets.sheet_name must not be empty".to_string());
        }

        report
    }
}

/// Result of [`CliConfig::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Public base URL used for gateway callbacks. Derived from request
    /// headers when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_origin: Option<String>,

    /// Prefix of generated order ids.
    #[serde(default = "default_order_prefix")]
    pub order_prefix: String,

    /// Pending orders older than this many hours are purged while serving.
    /// Zero disables purging.
    #[serde(default = "default_purge_after_hours")]
    pub purge_after_hours: u64,
}

fn default_listen() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_order_prefix() -> String {
    DEFAULT_ORDER_PREFIX.to_string()
}

fn default_purge_after_hours() -> u64 {
    7 * 24
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            public_origin: None,
            order_prefix: default_order_prefix(),
            purge_after_hours: default_purge_after_hours(),
        }
    }
}

/// Temp order store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one JSON file per pending order.
    #[serde(default = "default_store_dir")]
    pub dir: String,
}

fn default_store_dir() -> String {
    DEFAULT_TEMP_DIR.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
        }
    }
}

/// Mercado Pago configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MercadoPagoConfig {
    #[serde(default = "default_mercadopago_api_base")]
    pub api_base: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Secret from the integration's webhook settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,

    /// Maximum notification age in seconds. Zero disables the check.
    #[serde(default = "default_signature_tolerance_secs")]
    pub signature_tolerance_secs: u64,
}

fn default_mercadopago_api_base() -> String {
    MERCADOPAGO_API_BASE.to_string()
}

fn default_signature_tolerance_secs() -> u64 {
    300
}

impl MercadoPagoConfig {
    pub fn is_configured(&self) -> bool {
        self.access_token.is_some()
    }
}

impl Default for MercadoPagoConfig {
    fn default() -> Self {
        Self {
            api_base: default_mercadopago_api_base(),
            access_token: None,
            webhook_secret: None,
            signature_tolerance_secs: default_signature_tolerance_secs(),
        }
    }
}

/// Flow configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    #[serde(default = "default_flow_api_base")]
    pub api_base: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
}

fn default_flow_api_base() -> String {
    FLOW_API_BASE.to_string()
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            api_base: default_flow_api_base(),
            api_key: None,
            secret_key: None,
        }
    }
}

/// Google Sheets configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    #[serde(default = "default_sheets_api_base")]
    pub api_base: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,

    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    /// Path to the service account JSON key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<String>,
}

fn default_sheets_api_base() -> String {
    SHEETS_API_BASE.to_string()
}

fn default_sheet_name() -> String {
    DEFAULT_SHEET_NAME.to_string()
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            api_base: default_sheets_api_base(),
            spreadsheet_id: None,
            sheet_name: default_sheet_name(),
            credentials_path: None,
        }
    }
}

/// Catalog configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON product list replacing the built-in catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Generate a default storefront.toml config file.
pub fn generate_default_config(spreadsheet_id: Option<&str>, public_origin: Option<&str>) -> String {
    let spreadsheet_id = match spreadsheet_id {
        Some(id) => format!("spreadsheet_id = \"{}\"", id),
        None => "# spreadsheet_id = \"\"".to_string(),
    };
    let public_origin = match public_origin {
        Some(origin) => format!("public_origin = \"{}\"", origin),
        None => "# public_origin = \"https://tienda.example\"".to_string(),
    };

    format!(
        r#"# Storefront configuration
#
# Secrets are best kept out of this file; these environment variables
# override it: MERCADO_PAGO_ACCESS_TOKEN, MP_WEBHOOK_SECRET, FLOW_API_KEY,
# FLOW_SECRET_KEY, GOOGLE_SHEET_ID, GOOGLE_CREDENTIALS_PATH.

[server]
listen = "0.0.0.0:3000"
{public_origin}
order_prefix = "{order_prefix}"
purge_after_hours = 168

[store]
dir = "{store_dir}"

[mercadopago]
api_base = "{mercadopago}"
signature_tolerance_secs = 300

[flow]
# Use {flow_sandbox} for testing.
api_base = "{flow}"

[sheets]
{spreadsheet_id}
sheet_name = "{sheet_name}"
# credentials_path = "credentials.json"

[catalog]
# path = "products.json"
"#,
        public_origin = public_origin,
        order_prefix = DEFAULT_ORDER_PREFIX,
        store_dir = DEFAULT_TEMP_DIR,
        mercadopago = MERCADOPAGO_API_BASE,
        flow = FLOW_API_BASE,
        flow_sandbox = storefront_payments::flow::FLOW_SANDBOX_API_BASE,
        spreadsheet_id = spreadsheet_id,
        sheet_name = DEFAULT_SHEET_NAME,
    )
}
