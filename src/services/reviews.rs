use crate::entities::{product, review, Product, ReviewModel};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct ReviewsService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ReviewsService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Adds a review to a product. The grade, when given, must be a
    /// whole star count from 1 to 5.
    #[instrument(skip(self, text))]
    pub async fn add_review(
        &self,
        user_id: i64,
        product_slug: &str,
        text: String,
        grade: Option<i16>,
    ) -> Result<ReviewModel, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Review text must not be empty".to_string(),
            ));
        }
        if let Some(g) = grade {
            if !(1..=5).contains(&g) {
                return Err(ServiceError::ValidationError(
                    "Grade must be between 1 and 5".to_string(),
                ));
            }
        }

        let product = Product::find()
            .filter(product::Column::Slug.eq(product_slug))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product '{}' not found", product_slug))
            })?;

        let created = review::ActiveModel {
            text: Set(text),
            grade: Set(grade),
            user_id: Set(user_id),
            product_id: Set(product.id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        info!(review_id = created.id, product_id = created.product_id, "review created");
        self.event_sender
            .send_or_log(Event::ReviewCreated(created.id))
            .await;

        Ok(created)
    }
}
