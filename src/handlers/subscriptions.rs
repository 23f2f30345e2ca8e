use crate::auth::USER_ID_HEADER;
use crate::errors::{ApiError, ServiceError};
use crate::handlers::common::created_response;
use crate::AppState;
use axum::{extract::State, http::HeaderMap, response::Response, Json};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SubscribeRequest {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
}

/// POST /subscribe/ - stores a newsletter address. Works for anonymous
/// visitors; a signed-in user gets linked to the subscription.
pub async fn subscribe(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SubscribeRequest>,
) -> Result<Response, ApiError> {
    request.validate().map_err(ServiceError::from)?;

    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|id| *id > 0);

    let subscriber = state
        .services
        .subscriptions
        .subscribe(request.email, user_id)
        .await?;
    Ok(created_response(subscriber))
}
