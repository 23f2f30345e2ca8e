use crate::config::AppConfig;
use crate::entities::{customer, shipping_address};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::cart::CartService;
use crate::services::gateway::{SessionRequest, StripeGateway};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[0-9()\-\s]{7,20}$").unwrap()
});

/// Name shown on the provider's hosted payment page. The cart is
/// charged as a single aggregated line.
const CHECKOUT_LINE_NAME: &str = "Shop items";
const CHECKOUT_CURRENCY: &str = "usd";

/// Contact details collected on the checkout page.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CustomerForm {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(regex(path = "PHONE_RE", message = "Enter a valid phone number"))]
    pub phone: String,
}

/// Delivery address collected on the checkout page.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ShippingForm {
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "Street is required"))]
    pub street: String,
}

#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    cart: Arc<CartService>,
    gateway: Arc<StripeGateway>,
    config: AppConfig,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        cart: Arc<CartService>,
        gateway: Arc<StripeGateway>,
        config: AppConfig,
    ) -> Self {
        Self {
            db,
            event_sender,
            cart,
            gateway,
            config,
        }
    }

    /// Validates the checkout forms, persists contact and shipping
    /// details, and opens a payment session. Returns the provider URL
    /// the customer must be redirected to. Nothing here completes the
    /// order; that waits for the success callback.
    #[instrument(skip(self, customer_form, shipping_form))]
    pub async fn begin_checkout(
        &self,
        user_id: i64,
        customer_form: &CustomerForm,
        shipping_form: &ShippingForm,
    ) -> Result<String, ServiceError> {
        customer_form.validate()?;
        shipping_form.validate()?;

        let (customer, order) = self.cart.resolve(user_id).await?;
        let view = self.cart.view(user_id).await?;
        if view.lines.is_empty() {
            return Err(ServiceError::EmptyCart);
        }

        let cents = to_cents(view.total_price)?;

        let txn = self.db.begin().await?;

        let mut active: customer::ActiveModel = customer.clone().into();
        active.first_name = Set(customer_form.first_name.clone());
        active.last_name = Set(customer_form.last_name.clone());
        active.email = Set(customer_form.email.clone());
        active.phone = Set(customer_form.phone.clone());
        active.update(&txn).await?;

        shipping_address::ActiveModel {
            customer_id: Set(Some(customer.id)),
            order_id: Set(Some(order.id)),
            city: Set(shipping_form.city.clone()),
            state: Set(shipping_form.state.clone()),
            street: Set(shipping_form.street.clone()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        let session = self
            .gateway
            .create_session(&SessionRequest {
                product_name: CHECKOUT_LINE_NAME.to_string(),
                unit_amount_cents: cents,
                quantity: 1,
                currency: CHECKOUT_CURRENCY.to_string(),
                success_url: self.config.checkout_success_url(),
                cancel_url: self.config.checkout_cancel_url(),
            })
            .await?;

        info!(order_id = order.id, session_id = %session.id, "checkout session opened");
        self.event_sender
            .send_or_log(Event::CheckoutSessionOpened {
                order_id: order.id,
                session_id: session.id,
            })
            .await;

        Ok(session.url)
    }

    /// Success callback from the payment provider: the open order is
    /// completed and its lines removed. Safe to call twice.
    #[instrument(skip(self))]
    pub async fn on_success(&self, user_id: i64) -> Result<(), ServiceError> {
        self.cart.clear_open_order(user_id).await
    }

    /// Cancel callback: the cart is left exactly as it was.
    #[instrument(skip(self))]
    pub async fn on_cancel(&self, user_id: i64) -> Result<(), ServiceError> {
        info!(user_id, "payment cancelled, cart preserved");
        Ok(())
    }
}

/// Converts a decimal price to the gateway's integer minor units.
fn to_cents(total: Decimal) -> Result<i64, ServiceError> {
    let cents = (total * Decimal::from(100))
        .round()
        .to_i64()
        .ok_or_else(|| {
            ServiceError::InvalidOperation(format!("cart total {} out of range", total))
        })?;
    if cents <= 0 {
        return Err(ServiceError::EmptyCart);
    }
    Ok(cents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn totals_convert_to_cents_with_rounding() {
        assert_eq!(to_cents(dec!(34.00)).unwrap(), 3400);
        assert_eq!(to_cents(dec!(19.995)).unwrap(), 2000);
        assert_eq!(to_cents(dec!(0.01)).unwrap(), 1);
    }

    #[test]
    fn zero_total_is_rejected() {
        assert!(matches!(to_cents(dec!(0)), Err(ServiceError::EmptyCart)));
    }

    #[test]
    fn customer_form_validation() {
        let ok = CustomerForm {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: "+1 (555) 123-4567".into(),
        };
        assert!(ok.validate().is_ok());

        let bad_email = CustomerForm {
            email: "not-an-email".into(),
            ..ok.clone()
        };
        assert!(bad_email.validate().is_err());

        let bad_phone = CustomerForm {
            phone: "call me".into(),
            ..ok.clone()
        };
        assert!(bad_phone.validate().is_err());

        let empty_name = CustomerForm {
            first_name: String::new(),
            ..ok
        };
        assert!(empty_name.validate().is_err());
    }

    #[test]
    fn shipping_form_requires_all_fields() {
        let ok = ShippingForm {
            city: "Springfield".into(),
            state: "IL".into(),
            street: "742 Evergreen Terrace".into(),
        };
        assert!(ok.validate().is_ok());

        let missing_city = ShippingForm {
            city: String::new(),
            ..ok
        };
        assert!(missing_city.validate().is_err());
    }
}
