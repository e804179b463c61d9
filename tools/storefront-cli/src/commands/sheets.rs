//! Spreadsheet commands.

use anyhow::{Context as _, Result};
use chrono::Utc;
use storefront_commerce::sheet::{SheetColumn, SheetRow};

use super::{SheetsArgs, SheetsCommand};
use crate::context::Context;

/// Run the sheets command.
pub async fn run(args: SheetsArgs, ctx: &Context) -> Result<()> {
    match args.command {
        SheetsCommand::Test => test_row(ctx).await,
        SheetsCommand::Header => header(ctx),
    }
}

async fn test_row(ctx: &Context) -> Result<()> {
    let client = ctx.require_sheets().await?;

    let spinner = ctx.output.spinner("Appending test row...");
    let result = client
        .append_row(SheetRow::test_row(Utc::now()).cells())
        .await;
    spinner.finish_and_clear();
    let result = result.context("Failed to append the test row")?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "spreadsheetId": client.spreadsheet_id(),
            "updatedRange": result.updated_range(),
        }));
        return Ok(());
    }

    ctx.output
        .success("Test row written. Check the spreadsheet and delete it afterwards.");
    if let Some(range) = result.updated_range() {
        ctx.output.kv("range", range);
    }
    Ok(())
}

fn header(ctx: &Context) -> Result<()> {
    let headers: Vec<&str> = SheetColumn::ALL.iter().map(|c| c.header()).collect();
    if ctx.output.is_json() {
        ctx.output.json(&headers);
    } else {
        println!("{}", headers.join("\t"));
    }
    Ok(())
}
