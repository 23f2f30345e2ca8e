use crate::errors::ApiError;
use crate::handlers::common::success_response;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SortQuery {
    pub sort: Option<String>,
}

/// GET / - root categories for the storefront navigation.
pub async fn index(State(state): State<AppState>) -> Result<Response, ApiError> {
    let categories = state.services.catalog.list_root_categories().await?;
    Ok(success_response(categories))
}

/// GET /category/{slug}/ - category with subcategories and products,
/// optionally sorted (`?sort=price`, `-price`, `color`, ...).
pub async fn category_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<SortQuery>,
) -> Result<Response, ApiError> {
    let page = state
        .services
        .catalog
        .category_page(&slug, query.sort.as_deref())
        .await?;
    Ok(success_response(page))
}

/// GET /product/{slug}/ - product detail with gallery and reviews.
pub async fn product_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let page = state.services.catalog.product_page(&slug).await?;
    Ok(success_response(page))
}
