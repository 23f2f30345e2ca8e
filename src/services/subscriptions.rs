use crate::entities::{subscriber, SubscriberModel};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::cart::is_unique_violation;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct SubscriptionsService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl SubscriptionsService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Registers an email for the newsletter. Each address subscribes
    /// at most once.
    #[instrument(skip(self))]
    pub async fn subscribe(
        &self,
        email: String,
        user_id: Option<i64>,
    ) -> Result<SubscriberModel, ServiceError> {
        let insert = subscriber::ActiveModel {
            email: Set(email.clone()),
            user_id: Set(user_id),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await;

        match insert {
            Ok(created) => {
                info!(subscriber_id = created.id, "subscriber added");
                self.event_sender
                    .send_or_log(Event::SubscriberAdded(created.id))
                    .await;
                Ok(created)
            }
            Err(e) if is_unique_violation(&e) => Err(ServiceError::Conflict(format!(
                "{} is already subscribed",
                email
            ))),
            Err(e) => Err(e.into()),
        }
    }
}
