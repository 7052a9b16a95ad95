use std::collections::HashMap;

use axum::{
    extract::{Path, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{validate_jwt, Claims};
use crate::error::ApiError;

/// Caller identity taken from a verified token.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub username: String,
    pub is_admin: bool,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.username,
            is_admin: claims.is_admin,
        }
    }
}

/// Stores the caller in the request extensions when a valid bearer token is sent.
///
/// Never rejects: a missing or bad token just leaves the request anonymous.
pub async fn authenticate_jwt(headers: HeaderMap, mut request: Request, next: Next) -> Response {
    if let Some(token) = extract_jwt_from_headers(&headers) {
        match validate_jwt(token) {
            Ok(claims) => {
                request.extensions_mut().insert(AuthUser::from(claims));
            }
            Err(e) => tracing::debug!("Ignoring bearer token: {}", e),
        }
    }

    next.run(request).await
}

/// Requires any logged-in user.
pub async fn ensure_logged_in(request: Request, next: Next) -> Result<Response, ApiError> {
    if request.extensions().get::<AuthUser>().is_none() {
        return Err(ApiError::unauthorized("You must be logged in"));
    }
    Ok(next.run(request).await)
}

/// Requires a logged-in admin.
pub async fn ensure_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    match request.extensions().get::<AuthUser>() {
        Some(user) if user.is_admin => Ok(next.run(request).await),
        _ => Err(ApiError::unauthorized("You must be an administrator to do this")),
    }
}

/// Requires an admin, or the user named by the `:username` path segment.
pub async fn ensure_correct_user_or_admin(
    Path(params): Path<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let allowed = request.extensions().get::<AuthUser>().is_some_and(|user| {
        user.is_admin || params.get("username").is_some_and(|name| *name == user.username)
    });

    if !allowed {
        return Err(ApiError::unauthorized("Unauthorized"));
    }
    Ok(next.run(request).await)
}

fn extract_jwt_from_headers(headers: &HeaderMap) -> Option<&str> {
    let auth_str = headers.get("authorization")?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_jwt_from_headers(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn other_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert_eq!(extract_jwt_from_headers(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_jwt_from_headers(&headers), None);
    }
}
