//! Configuration management commands.

use std::fs;

use anyhow::{bail, Context as _, Result};
use dialoguer::Input;

use super::{ConfigArgs, ConfigCommand};
use crate::config::generate_default_config;
use crate::context::Context;
use crate::output::status_badge;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Init { force, yes } => init_config(force, yes, ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    let config = &ctx.config;
    let mut masked = config.clone();
    masked.mercadopago.access_token = masked.mercadopago.access_token.as_deref().map(mask);
    masked.mercadopago.webhook_secret = masked.mercadopago.webhook_secret.as_deref().map(mask);
    masked.flow.api_key = masked.flow.api_key.as_deref().map(mask);
    masked.flow.secret_key = masked.flow.secret_key.as_deref().map(mask);

    if ctx.output.is_json() {
        ctx.output.json(&masked);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    ctx.output.info("");
    ctx.output.info("[server]");
    ctx.output.kv("listen", &config.server.listen);
    ctx.output.kv(
        "public_origin",
        config.server.public_origin.as_deref().unwrap_or("(from request headers)"),
    );
    ctx.output.kv("order_prefix", &config.server.order_prefix);
    ctx.output.kv("purge_after_hours", &config.server.purge_after_hours.to_string());

    ctx.output.info("");
    ctx.output.info("[store]");
    ctx.output.kv("dir", &ctx.store().dir().display().to_string());

    ctx.output.info("");
    ctx.output.info("[mercadopago]");
    ctx.output.kv("api_base", &config.mercadopago.api_base);
    ctx.output.kv("access_token", &secret_state(&masked.mercadopago.access_token));
    ctx.output.kv("webhook_secret", &secret_state(&masked.mercadopago.webhook_secret));
    ctx.output.kv(
        "signature_tolerance_secs",
        &config.mercadopago.signature_tolerance_secs.to_string(),
    );

    ctx.output.info("");
    ctx.output.info("[flow]");
    ctx.output.kv("api_base", &config.flow.api_base);
    ctx.output.kv("api_key", &secret_state(&masked.flow.api_key));
    ctx.output.kv("secret_key", &secret_state(&masked.flow.secret_key));

    ctx.output.info("");
    ctx.output.info("[sheets]");
    ctx.output.kv("api_base", &config.sheets.api_base);
    ctx.output.kv(
        "spreadsheet_id",
        config.sheets.spreadsheet_id.as_deref().unwrap_or("(not set)"),
    );
    ctx.output.kv("sheet_name", &config.sheets.sheet_name);
    ctx.output.kv(
        "credentials_path",
        config.sheets.credentials_path.as_deref().unwrap_or("(not set)"),
    );

    ctx.output.info("");
    ctx.output.info("[catalog]");
    ctx.output.kv("path", config.catalog.path.as_deref().unwrap_or("(built-in)"));

    Ok(())
}

async fn init_config(force: bool, yes: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join("storefront.toml");

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let (spreadsheet_id, public_origin) = if yes || ctx.output.is_json() {
        (None, None)
    } else {
        let spreadsheet_id: String = Input::new()
            .with_prompt("Google spreadsheet id (empty to skip)")
            .allow_empty(true)
            .interact_text()?;
        let public_origin: String = Input::new()
            .with_prompt("Public URL of the store (empty to derive from requests)")
            .allow_empty(true)
            .interact_text()?;
        (non_empty(spreadsheet_id), non_empty(public_origin))
    };

    let content = generate_default_config(spreadsheet_id.as_deref(), public_origin.as_deref());
    fs::write(&config_path, content)
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

    ctx.output.success(&format!("Created: {}", config_path.display()));
    ctx.output
        .info("Set secrets through MERCADO_PAGO_ACCESS_TOKEN, FLOW_API_KEY and friends.");

    Ok(())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    let report = ctx.config.validate();

    if ctx.output.is_json() {
        ctx.output.json(&report);
        if !report.is_ok() {
            bail!("Configuration has {} error(s)", report.errors.len());
        }
        return Ok(());
    }

    ctx.output.header("Validating configuration");

    let integrations = [
        ("Mercado Pago", ctx.config.mercadopago.is_configured()),
        (
            "Flow",
            ctx.config.flow.api_key.is_some() && ctx.config.flow.secret_key.is_some(),
        ),
        (
            "Google Sheets",
            ctx.config.sheets.spreadsheet_id.is_some()
                && ctx.config.sheets.credentials_path.is_some(),
        ),
    ];
    for (name, configured) in integrations {
        let state = if configured { "configured" } else { "missing" };
        ctx.output.kv(name, &status_badge(state));
    }

    if report.errors.is_empty() && report.warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &report.errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &report.warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !report.is_ok() {
        bail!("Configuration has {} error(s)", report.errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}

/// Keep the last four characters of a secret.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

fn secret_state(masked: &Option<String>) -> String {
    masked.clone().unwrap_or_else(|| "(not set)".to_string())
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
