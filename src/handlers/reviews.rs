use crate::auth::AuthenticatedUser;
use crate::errors::ApiError;
use crate::handlers::common::created_response;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub text: String,
    pub grade: Option<i16>,
}

/// POST /product/{slug}/review/ - appends a review to a product.
pub async fn add_review(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(slug): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Result<Response, ApiError> {
    let review = state
        .services
        .reviews
        .add_review(user.user_id, &slug, request.text, request.grade)
        .await?;
    Ok(created_response(review))
}
