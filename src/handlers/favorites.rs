use crate::auth::AuthenticatedUser;
use crate::errors::ApiError;
use crate::handlers::common::success_response;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::Response,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ToggleResult {
    pub product_id: i64,
    pub favored: bool,
}

/// POST /favorite/{product_id}/ - flips the favorite mark.
pub async fn toggle_favorite(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(product_id): Path<i64>,
) -> Result<Response, ApiError> {
    let favored = state
        .services
        .favorites
        .toggle(user.user_id, product_id)
        .await?;
    Ok(success_response(ToggleResult {
        product_id,
        favored,
    }))
}

/// GET /favorites/ - the user's favorite products.
pub async fn list_favorites(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Response, ApiError> {
    let products = state.services.favorites.list(user.user_id).await?;
    Ok(success_response(products))
}
