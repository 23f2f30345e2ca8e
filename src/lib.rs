pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use crate::config::AppConfig;
use crate::events::EventSender;
use crate::handlers::AppServices;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

/// Shared application state available to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: AppConfig,
    pub event_sender: Arc<EventSender>,
    pub services: AppServices,
}

/// Standard success envelope for API responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn message(message: &str) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.to_string()),
        }
    }
}

/// Builds the full application router.
pub fn routes(state: AppState) -> Router {
    Router::new()
        // Catalog
        .route("/", get(handlers::catalog::index))
        .route("/category/{slug}/", get(handlers::catalog::category_detail))
        .route("/product/{slug}/", get(handlers::catalog::product_detail))
        // Cart
        .route(
            "/to_cart/{product_id}/{action}",
            post(handlers::cart::apply_cart_action),
        )
        .route("/cart/", get(handlers::cart::view_cart))
        // Checkout and payment callbacks
        .route("/checkout/", get(handlers::checkout::checkout_page))
        .route(
            "/create_checkout_session/",
            post(handlers::checkout::create_checkout_session),
        )
        .route("/success/", get(handlers::checkout::payment_success))
        .route("/cancel/", get(handlers::checkout::payment_cancel))
        // Reviews, favorites, newsletter
        .route("/product/{slug}/review/", post(handlers::reviews::add_review))
        .route(
            "/favorite/{product_id}/",
            post(handlers::favorites::toggle_favorite),
        )
        .route("/favorites/", get(handlers::favorites::list_favorites))
        .route("/subscribe/", post(handlers::subscriptions::subscribe))
        // Operational
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state)
}

/// Liveness probe that also pings the database.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ok" })),
        ),
        Err(e) => {
            tracing::error!("health check database ping failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "degraded" })),
            )
        }
    }
}
