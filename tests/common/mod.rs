#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use shop_api::config::AppConfig;
use shop_api::db::{establish_connection_from_app_config, run_migrations};
use shop_api::entities::{category, product};
use shop_api::events::{process_events, EventSender};
use shop_api::handlers::AppServices;
use shop_api::{routes, AppState};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::util::ServiceExt;

/// In-process application wired to a fresh in-memory database.
pub struct TestApp {
    pub router: Router,
    pub db: Arc<DatabaseConnection>,
    pub services: AppServices,
    pub config: AppConfig,
}

impl TestApp {
    pub async fn spawn() -> Self {
        // Unroutable gateway base: any accidental gateway call fails fast.
        Self::spawn_with_gateway("http://127.0.0.1:1").await
    }

    /// Spawns the app pointing the payment gateway at `gateway_base`
    /// (a wiremock server in the checkout tests).
    pub async fn spawn_with_gateway(gateway_base: &str) -> Self {
        let mut config = AppConfig::new(
            "sqlite::memory:",
            "127.0.0.1",
            0,
            "test",
            "sk_test_dummy",
            "http://localhost:8080",
        );
        config.stripe_api_base = gateway_base.to_string();
        // A single connection keeps every query on the same in-memory
        // SQLite database.
        config.db_max_connections = 1;
        config.db_min_connections = 1;

        let db = Arc::new(
            establish_connection_from_app_config(&config)
                .await
                .expect("failed to open test database"),
        );
        run_migrations(&db).await.expect("migrations failed");

        let (tx, rx) = mpsc::channel(64);
        let event_sender = Arc::new(EventSender::new(tx));
        tokio::spawn(process_events(rx));

        let services = AppServices::new(db.clone(), event_sender.clone(), config.clone())
            .expect("failed to build services");

        let state = AppState {
            db: db.clone(),
            config: config.clone(),
            event_sender,
            services: services.clone(),
        };

        Self {
            router: routes(state),
            db,
            services,
            config,
        }
    }

    pub async fn seed_category(&self, title: &str, slug: &str) -> i64 {
        category::ActiveModel {
            title: Set(title.to_string()),
            image: Set(None),
            slug: Set(slug.to_string()),
            parent_id: Set(None),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("failed to seed category")
        .id
    }

    pub async fn seed_product(
        &self,
        title: &str,
        slug: &str,
        price: Decimal,
        category_id: i64,
    ) -> i64 {
        product::ActiveModel {
            title: Set(title.to_string()),
            price: Set(price),
            created_at: Set(Utc::now()),
            watched: Set(0),
            quantity: Set(10),
            description: Set(format!("{} description", title)),
            info: Set(format!("{} info", title)),
            category_id: Set(category_id),
            slug: Set(slug.to_string()),
            size: Set(42),
            color: Set("black".to_string()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("failed to seed product")
        .id
    }

    /// Fires one request through the router. `user` becomes the
    /// identity header when present.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        user: Option<i64>,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = user {
            builder = builder.header("x-user-id", id.to_string());
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("failed to build request"),
            None => builder.body(Body::empty()).expect("failed to build request"),
        };
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed")
    }
}

pub async fn read_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("body was not valid JSON")
}

pub fn location_header(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("missing location header")
        .to_str()
        .expect("location header was not UTF-8")
        .to_string()
}

pub fn assert_redirect(response: &Response<Body>, target: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_header(response), target);
}
