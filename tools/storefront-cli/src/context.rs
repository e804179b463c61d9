//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use storefront_commerce::catalog::Catalog;
use storefront_payments::flow::{FlowClient, FlowCredentials};
use storefront_payments::mercadopago::MercadoPagoClient;
use storefront_payments::webhook::WebhookVerifier;
use storefront_server::{ServerSettings, ServiceState};
use storefront_sheets::{ServiceAccountKey, SheetsClient};
use storefront_store::TempOrderStore;

use crate::config::{CliConfig, CONFIG_NAMES};
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration, environment overrides applied.
    pub config: CliConfig,
    /// File the configuration was read from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (mut config, config_path) = if let Some(path) = config_path {
            (CliConfig::load(path)?, Some(PathBuf::from(path)))
        } else {
            // Try to find config in current directory or parent directories
            match Self::find_config(&cwd)? {
                Some(path) => {
                    let config = CliConfig::load(&path.to_string_lossy())?;
                    (config, Some(path))
                }
                None => (CliConfig::default(), None),
            }
        };
        config.apply_env();

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Result<Option<PathBuf>> {
        let mut current = start.to_path_buf();
        loop {
            for name in CONFIG_NAMES {
                let candidate = current.join(name);
                if candidate.is_file() {
                    return Ok(Some(candidate));
                }
            }
            if !current.pop() {
                return Ok(None);
            }
        }
    }

    /// Resolve a path relative to the config file, else the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = PathBuf::from(path);
        if path.is_absolute() {
            return path;
        }
        let base = self
            .config_path
            .as_deref()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(&self.cwd);
        base.join(path)
    }

    pub fn store(&self) -> TempOrderStore {
        TempOrderStore::new(self.resolve_path(&self.config.store.dir))
    }

    /// The configured catalog, or the built-in one.
    pub fn catalog(&self) -> Result<Catalog> {
        let Some(path) = self.config.catalog.path.as_deref() else {
            return Ok(Catalog::builtin());
        };
        let path = self.resolve_path(path);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
        Catalog::from_json(&content)
            .with_context(|| format!("Invalid catalog: {}", path.display()))
    }

    pub fn mercadopago(&self) -> Result<Option<MercadoPagoClient>> {
        let mp = &self.config.mercadopago;
        let Some(token) = mp.access_token.as_deref() else {
            return Ok(None);
        };
        let client = MercadoPagoClient::new(&mp.api_base, token)
            .context("Failed to create Mercado Pago client")?;
        Ok(Some(client))
    }

    pub fn flow(&self) -> Result<Option<FlowClient>> {
        let flow = &self.config.flow;
        let (Some(api_key), Some(secret_key)) = (&flow.api_key, &flow.secret_key) else {
            return Ok(None);
        };
        let client = FlowClient::new(&flow.api_base, FlowCredentials::new(api_key, secret_key))
            .context("Failed to create Flow client")?;
        Ok(Some(client))
    }

    pub fn verifier(&self) -> WebhookVerifier {
        let mut verifier = WebhookVerifier::new().with_tolerance(Duration::from_secs(
            self.config.mercadopago.signature_tolerance_secs,
        ));
        if let Some(secret) = self.config.mercadopago.webhook_secret.as_deref() {
            verifier = verifier.with_mercadopago_secret(secret);
        }
        if let Some(secret) = self.config.flow.secret_key.as_deref() {
            verifier = verifier.with_flow_secret(secret);
        }
        verifier
    }

    /// Sheets client, or `None` when the spreadsheet is not configured.
    pub async fn sheets(&self) -> Result<Option<SheetsClient>> {
        let sheets = &self.config.sheets;
        let (Some(spreadsheet_id), Some(credentials)) =
            (&sheets.spreadsheet_id, &sheets.credentials_path)
        else {
            return Ok(None);
        };
        let key = ServiceAccountKey::from_file(self.resolve_path(credentials))
            .await
            .context("Failed to load Google service account key")?;
        let client = SheetsClient::new(spreadsheet_id, key)
            .context("Failed to create Google Sheets client")?
            .with_api_base(&sheets.api_base)
            .with_sheet_name(&sheets.sheet_name);
        Ok(Some(client))
    }

    /// Sheets client, failing when the spreadsheet is not configured.
    pub async fn require_sheets(&self) -> Result<SheetsClient> {
        match self.sheets().await? {
            Some(client) => Ok(client),
            None => bail!(
                "Google Sheets is not configured. Set sheets.spreadsheet_id and sheets.credentials_path."
            ),
        }
    }

    /// Everything the HTTP API needs, built from the configuration.
    pub async fn service_state(&self) -> Result<ServiceState> {
        let mut state = ServiceState::new(self.catalog()?, self.store())
            .with_verifier(self.verifier())
            .with_settings(ServerSettings {
                public_origin: self.config.server.public_origin.clone(),
                order_prefix: self.config.server.order_prefix.clone(),
            });

        if let Some(client) = self.mercadopago()? {
            state = state.with_mercadopago(client);
        }
        if let Some(client) = self.flow()? {
            state = state.with_flow(client);
        }
        if let Some(client) = self.sheets().await? {
            state = state.with_sheets(Arc::new(client));
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_commerce::order::Gateway;
    use tempfile::TempDir;

    fn context(dir: &Path, config: CliConfig, config_path: Option<PathBuf>) -> Context {
        Context {
            config,
            config_path,
            output: Output::new(false, true),
            cwd: dir.to_path_buf(),
        }
    }

    #[test]
    fn test_find_config_in_parent() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("storefront.toml"), "[server]\n").unwrap();

        let found = Context::find_config(&nested).unwrap();
        assert_eq!(found, Some(dir.path().join("storefront.toml")));
    }

    #[test]
    fn test_resolve_path_relative_to_config() {
        let dir = TempDir::new().unwrap();
        let ctx = context(
            &dir.path().join("elsewhere"),
            CliConfig::default(),
            Some(dir.path().join("storefront.toml")),
        );
        assert_eq!(ctx.store().dir(), dir.path().join(".temp_orders"));
        assert_eq!(ctx.resolve_path("/abs/path"), PathBuf::from("/abs/path"));
    }

    #[test]
    fn test_catalog_from_file() {
        let dir = TempDir::new().unwrap();
        let mut config = CliConfig::default();
        assert_eq!(context(dir.path(), config.clone(), None).catalog().unwrap().len(), 1);

        config.catalog.path = Some("missing.json".into());
        assert!(context(dir.path(), config, None).catalog().is_err());
    }

    #[tokio::test]
    async fn test_state_without_integrations() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path(), CliConfig::default(), None);
        let state = ctx.service_state().await.unwrap();
        assert!(state.mercadopago.is_none());
        assert!(state.flow.is_none());
        assert!(!state.reconciler.has_sheets());
        assert_eq!(state.settings.order_prefix, "AstroShop");
    }

    #[tokio::test]
    async fn test_state_with_gateways() {
        let dir = TempDir::new().unwrap();
        let mut config = CliConfig::default();
        config.mercadopago.access_token = Some("TEST-token".into());
        config.flow.api_key = Some("key".into());
        config.flow.secret_key = Some("secret".into());

        let state = context(dir.path(), config, None).service_state().await.unwrap();
        assert!(state.mercadopago.is_some());
        assert!(state.flow.is_some());
        assert!(state.reconciler.has_lookup(Gateway::MercadoPago));
        assert!(state.reconciler.has_lookup(Gateway::Flow));
    }
}
