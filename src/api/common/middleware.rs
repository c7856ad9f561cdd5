use axum::{
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use cookie::Cookie;

use crate::authentication::claims::{decode_token, Claims};
use crate::authentication::nonce::ANONYMOUS_USER;
use crate::InnerState;

/// Claims of the caller, if any, inserted by the auth middlewares.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<Claims>);

impl CurrentUser {
    pub fn user_id(&self) -> i64 {
        self.0.as_ref().map(|c| c.sub).unwrap_or(ANONYMOUS_USER)
    }
}

/// Rejects requests without a valid token.
pub async fn auth_middleware(
    State(state): State<InnerState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_token(&request) else {
        return crate::errors::AppError::Authentication(anyhow::anyhow!("Missing authentication token"))
            .into_response();
    };

    match decode_token(&token, &state.config.jwt_secret) {
        Ok(claims) => {
            request.extensions_mut().insert(CurrentUser(Some(claims)));
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Lets anonymous callers through. A token that is present but invalid is
/// treated the same as no token.
pub async fn optional_auth_middleware(
    State(state): State<InnerState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let claims = extract_token(&request).and_then(|token| decode_token(&token, &state.config.jwt_secret).ok());
    request.extensions_mut().insert(CurrentUser(claims));
    next.run(request).await
}

/// Extracts JWT from either the `Authorization` header or the `auth-token` cookie.
fn extract_token<B>(req: &Request<B>) -> Option<String> {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = req.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                if let Ok(parsed) = Cookie::parse(cookie.trim()) {
                    if parsed.name() == "auth-token" {
                        return Some(parsed.value().to_string());
                    }
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn token_from_bearer_header() {
        let req = Request::builder()
            .header(header::AUTHORIZATION, "Bearer abc.def.ghi")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token(&req).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn token_from_cookie() {
        let req = Request::builder()
            .header(header::COOKIE, "theme=dark; auth-token=abc.def.ghi")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token(&req).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn no_token() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(extract_token(&req), None);
        assert_eq!(CurrentUser(None).user_id(), ANONYMOUS_USER);
    }
}
