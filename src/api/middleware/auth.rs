//! Bearer token authentication middleware.
//!
//! Resolves `Authorization: Bearer <token>` through the identity provider
//! and injects a `Principal` into request extensions. Requests without a
//! token pass through anonymously; handlers that need a caller extract
//! `Principal` and get a 401 when it is absent.

use axum::http::{header, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{role_of, ApiContext, Principal};

/// Resolve the caller, if any. A token that is present but invalid is
/// rejected outright rather than downgraded to anonymous.
pub async fn authenticate(req: Request<axum::body::Body>, next: Next) -> Response {
    match authenticate_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn authenticate_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let Some(token) = bearer_token(&req) else {
        return Ok(next.run(req).await);
    };

    let user = ctx.identity.user_for_token(&token).await?;
    let role = role_of(&user)?;

    req.extensions_mut().insert(Principal {
        user_id: user.id,
        email: user.email,
        role,
    });

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(response)
}

fn bearer_token<B>(req: &Request<B>) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_parsing() {
        let req = Request::builder()
            .header("Authorization", "Bearer abc123")
            .body(())
            .unwrap();
        assert_eq!(bearer_token(&req).as_deref(), Some("abc123"));

        let basic = Request::builder()
            .header("Authorization", "Basic dXNlcjpwYXNz")
            .body(())
            .unwrap();
        assert_eq!(bearer_token(&basic), None);

        let empty = Request::builder()
            .header("Authorization", "Bearer ")
            .body(())
            .unwrap();
        assert_eq!(bearer_token(&empty), None);

        let none = Request::builder().body(()).unwrap();
        assert_eq!(bearer_token(&none), None);
    }
}
