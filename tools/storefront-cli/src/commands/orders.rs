//! Pending order commands.
//!
//! Pending orders are checkouts whose payment notification has not been
//! reconciled yet. Abandoned checkouts stay here until purged.

use anyhow::{bail, Context as _, Result};
use chrono::Utc;
use dialoguer::Confirm;
use serde::Serialize;
use tracing::info;

use super::{OrdersArgs, OrdersCommand};
use crate::context::Context;
use crate::output::format_age;

/// Run the orders command.
pub async fn run(args: OrdersArgs, ctx: &Context) -> Result<()> {
    match args.command {
        Some(OrdersCommand::List) | None => list_orders(ctx).await,
        Some(OrdersCommand::Show { id }) => show_order(&id, ctx).await,
        Some(OrdersCommand::Delete { id, yes }) => delete_order(&id, yes, ctx).await,
        Some(OrdersCommand::Purge { older_than, yes }) => purge_orders(older_than, yes, ctx).await,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderSummary {
    order_id: String,
    age_secs: i64,
    path: String,
}

async fn list_orders(ctx: &Context) -> Result<()> {
    let store = ctx.store();
    let now = Utc::now();
    let orders: Vec<OrderSummary> = store
        .list()
        .await?
        .into_iter()
        .map(|stored| OrderSummary {
            age_secs: (now - stored.modified).num_seconds(),
            path: stored.path.display().to_string(),
            order_id: stored.order_id.into_inner(),
        })
        .collect();

    if ctx.output.is_json() {
        ctx.output.json(&orders);
        return Ok(());
    }

    ctx.output.header(&format!("Pending orders in {}", store.dir().display()));
    if orders.is_empty() {
        ctx.output.info("No pending orders.");
        return Ok(());
    }

    ctx.output.table_row(&["ORDER", "AGE"], &[40, 10]);
    for order in &orders {
        ctx.output
            .table_row(&[&order.order_id, &format_age(order.age_secs)], &[40, 10]);
    }
    Ok(())
}

async fn show_order(id: &str, ctx: &Context) -> Result<()> {
    let Some(order) = ctx.store().get(id).await? else {
        bail!("Order not found: {}", id);
    };

    if ctx.output.is_json() {
        ctx.output.json(&order);
        return Ok(());
    }

    let customer = &order.customer;
    ctx.output.header(&format!("Order {}", order.order_id));
    ctx.output.kv("gateway", order.gateway.display_name());
    ctx.output.kv("amount", &order.amount.to_string());
    if !order.shipping_cost.is_zero() {
        ctx.output.kv("shipping", &order.shipping_cost.to_string());
    }
    ctx.output.kv("created", &order.created_at.to_rfc3339());
    ctx.output.kv("customer", &customer.full_name());
    ctx.output.kv("email", &customer.email);
    ctx.output.kv("phone", &customer.phone);
    ctx.output.kv(
        "address",
        &format!("{}, {}, {}", customer.address, customer.commune, customer.region),
    );
    if !customer.observations.is_empty() {
        ctx.output.kv("notes", &customer.observations);
    }
    for item in &order.items {
        ctx.output.list_item(&format!(
            "{} x {} @ {}",
            item.quantity,
            item.title,
            item.unit_price_money()
        ));
    }
    Ok(())
}

async fn delete_order(id: &str, yes: bool, ctx: &Context) -> Result<()> {
    let store = ctx.store();
    if !store.exists(id).await? {
        bail!("Order not found: {}", id);
    }

    if !yes && !ctx.output.is_json() {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete pending order {}? A later payment for it cannot be recorded.",
                id
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            ctx.output.warn("Delete cancelled");
            return Ok(());
        }
    }

    store.delete(id).await?;
    info!(order_id = %id, "pending order deleted from the CLI");
    ctx.output.success(&format!("Deleted {}", id));
    Ok(())
}

async fn purge_orders(hours: u64, yes: bool, ctx: &Context) -> Result<()> {
    let store = ctx.store();
    let max_age = purge_age(hours)?;

    if !yes && !ctx.output.is_json() {
        let cutoff = Utc::now() - max_age;
        let stale = store
            .list()
            .await?
            .into_iter()
            .filter(|stored| stored.modified < cutoff)
            .count();
        if stale == 0 {
            ctx.output.info(&format!("No pending orders older than {}h.", hours));
            return Ok(());
        }

        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {} pending order(s) older than {}h?", stale, hours))
            .default(false)
            .interact()?;

        if !confirmed {
            ctx.output.warn("Purge cancelled");
            return Ok(());
        }
    }

    let removed = store.purge_older_than(max_age).await?;
    info!(hours, removed = removed.len(), "purged pending orders");
    if ctx.output.is_json() {
        let ids: Vec<&str> = removed.iter().map(|id| id.as_str()).collect();
        ctx.output.json(&ids);
        return Ok(());
    }
    ctx.output
        .success(&format!("Purged {} pending order(s)", removed.len()));
    for id in &removed {
        ctx.output.debug(id.as_str());
    }
    Ok(())
}

fn purge_age(hours: u64) -> Result<chrono::Duration> {
    i64::try_from(hours)
        .ok()
        .and_then(chrono::Duration::try_hours)
        .with_context(|| format!("Purge age of {} hours is out of range", hours))
}
