//! Catalog and region directory handlers.

use crate::error::{ApiError, ApiResult};
use crate::state::ServiceState;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use storefront_commerce::catalog::Product;
use storefront_commerce::checkout::regions;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub q: Option<String>,
}

pub async fn list_products(
    State(state): State<ServiceState>,
    Query(query): Query<ProductQuery>,
) -> Json<Vec<Product>> {
    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let term = query.q.as_deref().map(str::trim).filter(|t| !t.is_empty());

    let catalog = &state.catalog;
    let products: Vec<Product> = match (category, term) {
        (Some(c), Some(t)) => catalog.by_category(c).filter(|p| p.matches(t)).cloned().collect(),
        (Some(c), None) => catalog.by_category(c).cloned().collect(),
        (None, Some(t)) => catalog.search(t).cloned().collect(),
        (None, None) => catalog.iter().cloned().collect(),
    };
    Json(products)
}

pub async fn get_product(
    State(state): State<ServiceState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.catalog.require(&id)?.clone()))
}

pub async fn list_categories(State(state): State<ServiceState>) -> Json<Vec<String>> {
    Json(
        state
            .catalog
            .categories()
            .into_iter()
            .map(str::to_string)
            .collect(),
    )
}

pub async fn list_regions() -> Json<Vec<&'static str>> {
    Json(regions::regions())
}

pub async fn list_communes(Path(region): Path<String>) -> ApiResult<Json<Vec<&'static str>>> {
    regions::communes(&region)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Region not found: {region}")))
}
