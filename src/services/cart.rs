use crate::entities::{
    order, order_product, Customer, CustomerModel, Order, OrderModel, OrderProduct,
    OrderProductModel, Product, ProductModel,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// A mutation applied to one cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartAction {
    /// Add one unit, creating the line at quantity 1 if absent.
    Add,
    /// Remove one unit, deleting the line when it reaches zero.
    Reduce,
    /// Remove the line outright.
    Delete,
}

/// Pure line-quantity transition. `None` means the line does not exist
/// (before) or must not exist (after).
pub fn next_quantity(current: Option<i32>, action: CartAction) -> Option<i32> {
    match (current, action) {
        (None, CartAction::Add) => Some(1),
        (Some(q), CartAction::Add) => Some(q + 1),
        (Some(q), CartAction::Reduce) if q > 1 => Some(q - 1),
        (Some(_), CartAction::Reduce) => None,
        (Some(_), CartAction::Delete) => None,
        (None, CartAction::Reduce) | (None, CartAction::Delete) => None,
    }
}

/// One rendered cart line with its product (if it still exists) and
/// the line subtotal.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub line: OrderProductModel,
    pub product: Option<ProductModel>,
    pub total: Decimal,
}

/// The customer's open cart with derived totals. Totals are computed
/// on read, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub order: Option<OrderModel>,
    pub lines: Vec<CartLine>,
    pub total_quantity: i64,
    pub total_price: Decimal,
}

impl CartView {
    fn empty() -> Self {
        Self {
            order: None,
            lines: Vec::new(),
            total_quantity: 0,
            total_price: Decimal::ZERO,
        }
    }
}

#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Resolves a user to their customer record and open order,
    /// creating either on first touch. Concurrent first touches race
    /// against unique indexes; the loser re-reads the winner's row.
    #[instrument(skip(self))]
    pub async fn resolve(&self, user_id: i64) -> Result<(CustomerModel, OrderModel), ServiceError> {
        let customer = self.get_or_create_customer(user_id).await?;
        let order = self.get_open_order(&customer).await?;
        Ok((customer, order))
    }

    /// Applies a single cart action for the user. The whole mutation
    /// runs in one transaction; the line read takes a row lock so two
    /// concurrent adds on the same line serialize instead of
    /// overwriting each other's quantity.
    #[instrument(skip(self))]
    pub async fn apply(
        &self,
        user_id: i64,
        product_id: i64,
        action: CartAction,
    ) -> Result<(), ServiceError> {
        let (_, order) = self.resolve(user_id).await?;

        let mut retried = false;
        let (before, after) = loop {
            match self.apply_in_txn(order.id, product_id, action).await {
                Ok(outcome) => break outcome,
                // A concurrent first add created the line between our
                // read and insert, aborting the transaction. A rerun
                // takes the locked update path and merges.
                Err(ServiceError::DatabaseError(e)) if !retried && is_unique_violation(&e) => {
                    retried = true;
                }
                Err(e) => return Err(e),
            }
        };

        match after {
            Some(q) => {
                self.event_sender
                    .send_or_log(Event::CartItemAdded {
                        order_id: order.id,
                        product_id,
                        quantity: q,
                    })
                    .await;
            }
            None => {
                if before.is_some() {
                    self.event_sender
                        .send_or_log(Event::CartItemRemoved {
                            order_id: order.id,
                            product_id,
                        })
                        .await;
                }
            }
        }

        Ok(())
    }

    /// One transactional attempt at a line mutation. Returns the line
    /// quantity before and after.
    async fn apply_in_txn(
        &self,
        order_id: i64,
        product_id: i64,
        action: CartAction,
    ) -> Result<(Option<i32>, Option<i32>), ServiceError> {
        let txn = self.db.begin().await?;

        let product = Product::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        // Re-check inside the transaction: a payment callback may have
        // completed the order since resolve().
        let order = Order::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;
        if order.is_completed {
            return Err(ServiceError::OrderCompleted(order.id));
        }

        // SELECT ... FOR UPDATE on the line row. SQLite ignores the
        // lock clause and serializes writers on its own.
        let existing = OrderProduct::find()
            .filter(order_product::Column::OrderId.eq(order.id))
            .filter(order_product::Column::ProductId.eq(product.id))
            .lock_exclusive()
            .one(&txn)
            .await?;

        let before = existing.as_ref().map(|l| l.quantity);
        let after = next_quantity(before, action);

        match (existing, after) {
            (None, Some(q)) => {
                order_product::ActiveModel {
                    product_id: Set(Some(product.id)),
                    order_id: Set(order.id),
                    quantity: Set(q),
                    added_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
            }
            (Some(line), Some(q)) => {
                let mut active: order_product::ActiveModel = line.into();
                active.quantity = Set(q);
                active.update(&txn).await?;
            }
            (Some(line), None) => {
                OrderProduct::delete_by_id(line.id).exec(&txn).await?;
            }
            // Reducing or deleting a line that never existed is a no-op.
            (None, None) => {}
        }

        txn.commit().await?;
        Ok((before, after))
    }

    /// Reads the user's cart with per-line and grand totals. Purely a
    /// read: a user with no customer row or no open order gets an
    /// empty view and nothing is created. Lines whose product was
    /// deleted stay visible but contribute zero.
    #[instrument(skip(self))]
    pub async fn view(&self, user_id: i64) -> Result<CartView, ServiceError> {
        let customer = Customer::find()
            .filter(crate::entities::customer::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await?;
        let Some(customer) = customer else {
            return Ok(CartView::empty());
        };

        let order = Order::find()
            .filter(order::Column::CustomerId.eq(customer.id))
            .filter(order::Column::IsCompleted.eq(false))
            .one(self.db.as_ref())
            .await?;
        let Some(order) = order else {
            return Ok(CartView::empty());
        };

        let rows = OrderProduct::find()
            .filter(order_product::Column::OrderId.eq(order.id))
            .find_also_related(Product)
            .order_by_asc(order_product::Column::AddedAt)
            .order_by_asc(order_product::Column::Id)
            .all(self.db.as_ref())
            .await?;

        let mut total_quantity: i64 = 0;
        let mut total_price = Decimal::ZERO;
        let mut lines = Vec::with_capacity(rows.len());

        for (line, product) in rows {
            let total = product
                .as_ref()
                .map(|p| p.price * Decimal::from(line.quantity))
                .unwrap_or(Decimal::ZERO);
            total_quantity += i64::from(line.quantity);
            total_price += total;
            lines.push(CartLine {
                line,
                product,
                total,
            });
        }

        Ok(CartView {
            order: Some(order),
            lines,
            total_quantity,
            total_price,
        })
    }

    /// Completes the user's open order and removes its lines, so the
    /// next cart access starts a fresh order. Idempotent: with no open
    /// order this does nothing.
    #[instrument(skip(self))]
    pub async fn clear_open_order(&self, user_id: i64) -> Result<(), ServiceError> {
        let Some(customer) = Customer::find()
            .filter(crate::entities::customer::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await?
        else {
            return Ok(());
        };

        let Some(open) = Order::find()
            .filter(order::Column::CustomerId.eq(customer.id))
            .filter(order::Column::IsCompleted.eq(false))
            .one(self.db.as_ref())
            .await?
        else {
            return Ok(());
        };

        let txn = self.db.begin().await?;

        OrderProduct::delete_many()
            .filter(order_product::Column::OrderId.eq(open.id))
            .exec(&txn)
            .await?;

        let mut active: order::ActiveModel = open.clone().into();
        active.is_completed = Set(true);
        active.update(&txn).await?;

        txn.commit().await?;

        info!(order_id = open.id, "order completed and cart cleared");
        self.event_sender
            .send_or_log(Event::OrderCompleted(open.id))
            .await;

        Ok(())
    }

    async fn get_or_create_customer(&self, user_id: i64) -> Result<CustomerModel, ServiceError> {
        use crate::entities::customer;

        if let Some(existing) = Customer::find()
            .filter(customer::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await?
        {
            return Ok(existing);
        }

        let insert = customer::ActiveModel {
            user_id: Set(Some(user_id)),
            first_name: Set(String::new()),
            last_name: Set(String::new()),
            email: Set(String::new()),
            phone: Set(String::new()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await;

        match insert {
            Ok(created) => {
                info!(customer_id = created.id, user_id, "customer created");
                self.event_sender
                    .send_or_log(Event::CustomerCreated(created.id))
                    .await;
                Ok(created)
            }
            Err(e) if is_unique_violation(&e) => Customer::find()
                .filter(customer::Column::UserId.eq(user_id))
                .one(self.db.as_ref())
                .await?
                .ok_or(ServiceError::DatabaseError(e)),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_open_order(&self, customer: &CustomerModel) -> Result<OrderModel, ServiceError> {
        if let Some(existing) = Order::find()
            .filter(order::Column::CustomerId.eq(customer.id))
            .filter(order::Column::IsCompleted.eq(false))
            .one(self.db.as_ref())
            .await?
        {
            return Ok(existing);
        }

        let insert = order::ActiveModel {
            customer_id: Set(Some(customer.id)),
            created_at: Set(Utc::now()),
            is_completed: Set(false),
            shipping: Set(true),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await;

        match insert {
            Ok(created) => {
                info!(order_id = created.id, customer_id = customer.id, "order opened");
                self.event_sender
                    .send_or_log(Event::OrderOpened(created.id))
                    .await;
                Ok(created)
            }
            // Lost the race against the partial unique index; the
            // winner's open order is the one to use.
            Err(e) if is_unique_violation(&e) => Order::find()
                .filter(order::Column::CustomerId.eq(customer.id))
                .filter(order::Column::IsCompleted.eq(false))
                .one(self.db.as_ref())
                .await?
                .ok_or(ServiceError::DatabaseError(e)),
            Err(e) => Err(e.into()),
        }
    }
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_creates_line_at_one() {
        assert_eq!(next_quantity(None, CartAction::Add), Some(1));
    }

    #[test]
    fn add_increments_existing_line() {
        assert_eq!(next_quantity(Some(3), CartAction::Add), Some(4));
    }

    #[test]
    fn reduce_decrements_above_one() {
        assert_eq!(next_quantity(Some(3), CartAction::Reduce), Some(2));
    }

    #[test]
    fn reduce_at_one_deletes_the_line() {
        assert_eq!(next_quantity(Some(1), CartAction::Reduce), None);
    }

    #[test]
    fn delete_removes_any_quantity() {
        assert_eq!(next_quantity(Some(7), CartAction::Delete), None);
        assert_eq!(next_quantity(Some(1), CartAction::Delete), None);
    }

    #[test]
    fn reduce_and_delete_on_missing_line_are_noops() {
        assert_eq!(next_quantity(None, CartAction::Reduce), None);
        assert_eq!(next_quantity(None, CartAction::Delete), None);
    }
}
