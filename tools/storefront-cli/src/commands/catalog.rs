//! Catalog inspection commands.

use anyhow::Result;
use storefront_commerce::catalog::Product;

use super::{CatalogArgs, CatalogCommand};
use crate::context::Context;

/// Run the catalog command.
pub async fn run(args: CatalogArgs, ctx: &Context) -> Result<()> {
    match args.command {
        Some(CatalogCommand::List { category, search }) => {
            list_products(category.as_deref(), search.as_deref(), ctx)
        }
        None => list_products(None, None, ctx),
        Some(CatalogCommand::Show { id }) => show_product(&id, ctx),
    }
}

fn list_products(category: Option<&str>, search: Option<&str>, ctx: &Context) -> Result<()> {
    let catalog = ctx.catalog()?;
    let products: Vec<&Product> = catalog
        .iter()
        .filter(|p| category.map_or(true, |c| p.category == c))
        .filter(|p| search.map_or(true, |term| p.matches(term)))
        .collect();

    if ctx.output.is_json() {
        ctx.output.json(&products);
        return Ok(());
    }

    ctx.output.header(&format!("Products ({})", products.len()));
    if products.is_empty() {
        ctx.output.info("No products match.");
        return Ok(());
    }

    ctx.output.table_row(&["ID", "NAME", "PRICE", "CATEGORY"], &[6, 30, 12, 12]);
    for product in products {
        let price = product.price.to_string();
        ctx.output.table_row(
            &[product.id.as_str(), &product.name, &price, &product.category],
            &[6, 30, 12, 12],
        );
    }
    ctx.output.info("");
    ctx.output
        .info(&format!("Categories: {}", catalog.categories().join(", ")));

    Ok(())
}

fn show_product(id: &str, ctx: &Context) -> Result<()> {
    let catalog = ctx.catalog()?;
    let product = catalog.require(id)?;

    if ctx.output.is_json() {
        ctx.output.json(product);
        return Ok(());
    }

    ctx.output.header(&product.name);
    ctx.output.kv("id", product.id.as_str());
    ctx.output.kv("price", &product.price.to_string());
    if let Some(compare_at) = product.compare_at_price {
        ctx.output.kv("compare at", &compare_at.to_string());
    }
    if let Some(discount) = product.discount_percent() {
        ctx.output.kv("discount", &format!("{}%", discount));
    }
    ctx.output.kv("category", &product.category);
    if !product.description.is_empty() {
        ctx.output.kv("description", &product.description);
    }
    for variant in &product.variants {
        ctx.output.kv(&variant.name, &variant.options.join(", "));
    }
    if !product.tags.is_empty() {
        ctx.output.kv("tags", &product.tags.join(", "));
    }
    for image in &product.images {
        ctx.output.list_item(image);
    }

    Ok(())
}
