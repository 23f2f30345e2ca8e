use crate::ApiResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;

/// 200 with the standard success envelope.
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::ok(data))).into_response()
}

/// 201 with the standard success envelope.
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::ok(data))).into_response()
}

/// 200 carrying only a human-readable message.
pub fn message_response(message: &str) -> Response {
    (StatusCode::OK, Json(ApiResponse::<()>::message(message))).into_response()
}

/// 303 to `path` with a flash message the frontend renders as a banner.
pub fn flash_redirect(path: &str, message: &str) -> Redirect {
    let encoded = message.replace(' ', "+");
    let target = format!("{}?flash={}", path, encoded);
    Redirect::to(&target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_redirect_encodes_spaces() {
        let response = flash_redirect("/cart/", "Your cart is empty").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            "/cart/?flash=Your+cart+is+empty"
        );
    }
}
