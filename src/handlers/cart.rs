use crate::auth::AuthenticatedUser;
use crate::errors::ApiError;
use crate::handlers::common::success_response;
use crate::services::CartAction;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::{Redirect, Response},
};

/// POST /to_cart/{product_id}/{action} - applies one cart action and
/// sends the browser back to the cart page.
pub async fn apply_cart_action(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((product_id, action)): Path<(i64, CartAction)>,
) -> Result<Redirect, ApiError> {
    state
        .services
        .cart
        .apply(user.user_id, product_id, action)
        .await?;
    Ok(Redirect::to("/cart/"))
}

/// GET /cart/ - the user's cart with derived totals.
pub async fn view_cart(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Response, ApiError> {
    let view = state.services.cart.view(user.user_id).await?;
    Ok(success_response(view))
}
