use crate::auth::AuthenticatedUser;
use crate::entities::CustomerModel;
use crate::errors::{ApiError, ServiceError};
use crate::handlers::common::{flash_redirect, message_response, success_response};
use crate::services::{CartView, CustomerForm, ShippingForm};
use crate::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Checkout page payload: the cart to confirm plus the customer record
/// for form prefill.
#[derive(Debug, Serialize)]
pub struct CheckoutPage {
    pub cart: CartView,
    pub customer: CustomerModel,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub customer: CustomerForm,
    pub shipping: ShippingForm,
}

/// GET /checkout/ - cart summary and prefill data. An empty cart
/// bounces back to the cart page instead of rendering a dead form.
pub async fn checkout_page(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Response, ApiError> {
    let cart = state.services.cart.view(user.user_id).await?;
    if cart.lines.is_empty() {
        return Ok(flash_redirect("/cart/", "Your cart is empty").into_response());
    }

    let (customer, _) = state.services.cart.resolve(user.user_id).await?;
    Ok(success_response(CheckoutPage { cart, customer }))
}

/// POST /create_checkout_session/ - validates the forms, persists
/// contact and shipping details, and 303s the browser to the payment
/// provider's hosted page.
pub async fn create_checkout_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<Response, ApiError> {
    let result = state
        .services
        .checkout
        .begin_checkout(user.user_id, &request.customer, &request.shipping)
        .await;

    match result {
        Ok(url) => Ok(Redirect::to(&url).into_response()),
        Err(ServiceError::EmptyCart) => {
            Ok(flash_redirect("/cart/", "Your cart is empty").into_response())
        }
        Err(ServiceError::GatewayError(detail)) => {
            warn!(%detail, "checkout session creation failed");
            Ok(flash_redirect(
                "/checkout/",
                "Payment provider is unavailable, please try again",
            )
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /success/ - payment provider success callback.
pub async fn payment_success(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Response, ApiError> {
    state.services.checkout.on_success(user.user_id).await?;
    Ok(message_response("Payment accepted, thank you for your order"))
}

/// GET /cancel/ - payment provider cancel callback. The cart survives.
pub async fn payment_cancel(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Response, ApiError> {
    state.services.checkout.on_cancel(user.user_id).await?;
    Ok(message_response("Payment cancelled, your cart is unchanged"))
}
