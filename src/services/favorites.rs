use crate::entities::{favorite, Favorite, Product, ProductModel};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::cart::is_unique_violation;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::instrument;

#[derive(Clone)]
pub struct FavoritesService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl FavoritesService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Flips the favorite mark for a product. Returns true when the
    /// product ends up favored.
    #[instrument(skip(self))]
    pub async fn toggle(&self, user_id: i64, product_id: i64) -> Result<bool, ServiceError> {
        let product = Product::find_by_id(product_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let existing = Favorite::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .filter(favorite::Column::ProductId.eq(product.id))
            .one(self.db.as_ref())
            .await?;

        let favored = match existing {
            Some(row) => {
                Favorite::delete_by_id(row.id).exec(self.db.as_ref()).await?;
                false
            }
            None => {
                let insert = favorite::ActiveModel {
                    user_id: Set(user_id),
                    product_id: Set(product.id),
                    ..Default::default()
                }
                .insert(self.db.as_ref())
                .await;
                match insert {
                    Ok(_) => true,
                    // A concurrent toggle won the insert; the mark is set
                    // either way.
                    Err(e) if is_unique_violation(&e) => true,
                    Err(e) => return Err(e.into()),
                }
            }
        };

        self.event_sender
            .send_or_log(Event::FavoriteToggled {
                user_id,
                product_id: product.id,
                favored,
            })
            .await;

        Ok(favored)
    }

    /// All products the user has favored.
    #[instrument(skip(self))]
    pub async fn list(&self, user_id: i64) -> Result<Vec<ProductModel>, ServiceError> {
        let rows = Favorite::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .find_also_related(Product)
            .all(self.db.as_ref())
            .await?;

        Ok(rows.into_iter().filter_map(|(_, p)| p).collect())
    }
}
