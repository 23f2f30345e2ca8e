pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod common;
pub mod favorites;
pub mod reviews;
pub mod subscriptions;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::events::EventSender;
use crate::services::{
    CartService, CatalogService, CheckoutService, FavoritesService, ReviewsService,
    StripeGateway, SubscriptionsService,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;

/// All services the handlers reach through `AppState`.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub cart: Arc<CartService>,
    pub checkout: Arc<CheckoutService>,
    pub reviews: Arc<ReviewsService>,
    pub favorites: Arc<FavoritesService>,
    pub subscriptions: Arc<SubscriptionsService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: AppConfig,
    ) -> Result<Self, ServiceError> {
        let gateway = Arc::new(StripeGateway::new(
            config.stripe_api_base.clone(),
            config.stripe_secret_key.clone(),
            Duration::from_secs(config.gateway_timeout_secs),
        )?);

        let cart = Arc::new(CartService::new(db.clone(), event_sender.clone()));
        let checkout = Arc::new(CheckoutService::new(
            db.clone(),
            event_sender.clone(),
            cart.clone(),
            gateway,
            config,
        ));

        Ok(Self {
            catalog: Arc::new(CatalogService::new(db.clone())),
            cart,
            checkout,
            reviews: Arc::new(ReviewsService::new(db.clone(), event_sender.clone())),
            favorites: Arc::new(FavoritesService::new(db.clone(), event_sender.clone())),
            subscriptions: Arc::new(SubscriptionsService::new(db, event_sender)),
        })
    }
}
