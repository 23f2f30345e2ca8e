use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};

/// Header carrying the authenticated user's id, set by the fronting
/// auth proxy. Session handling itself lives outside this service.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Flash-style redirect target for anonymous visitors hitting a
/// purchase route.
pub const LOGIN_REDIRECT: &str = "/login/?flash=Please+sign+in+or+register+to+make+purchases";

/// Extractor for routes that require a signed-in user.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: i64,
}

/// Missing or malformed identity header. Browsers get bounced to the
/// login page rather than a bare 401.
#[derive(Debug)]
pub struct AuthRedirect;

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        Redirect::to(LOGIN_REDIRECT).into_response()
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .ok_or(AuthRedirect)?;

        Ok(AuthenticatedUser { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<AuthenticatedUser, AuthRedirect> {
        let mut builder = Request::builder().uri("/cart/");
        if let Some(v) = header {
            builder = builder.header(USER_ID_HEADER, v);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AuthenticatedUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn valid_header_is_accepted() {
        let user = extract(Some("42")).await.unwrap();
        assert_eq!(user.user_id, 42);
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        assert!(extract(None).await.is_err());
    }

    #[tokio::test]
    async fn non_numeric_and_non_positive_ids_are_rejected() {
        assert!(extract(Some("abc")).await.is_err());
        assert!(extract(Some("0")).await.is_err());
        assert!(extract(Some("-3")).await.is_err());
    }
}
