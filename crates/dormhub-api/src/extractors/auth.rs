//! `AuthUser` extractor: resolves the session token, validates it and
//! injects the request context.

use axum::extract::{FromRequestParts, Query};
use axum::http::HeaderMap;
use axum::http::Uri;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};
use serde::Deserialize;

use dormhub_auth::JwtDecoder;
use dormhub_core::AppError;
use dormhub_service::RequestContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Extracted authenticated account context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

impl AuthUser {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }
}

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Find the session token: the session cookie first, then a bearer
/// header, then a `?token=` query parameter (browsers cannot set headers
/// on WebSocket upgrades).
pub fn resolve_token(headers: &HeaderMap, uri: &Uri, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }

    Query::<TokenQuery>::try_from_uri(uri)
        .ok()
        .and_then(|Query(q)| q.token)
        .filter(|t| !t.is_empty())
}

/// Decode a token into a request context.
pub fn authenticate(decoder: &JwtDecoder, token: Option<String>) -> Result<RequestContext, AppError> {
    let token = token.ok_or_else(|| AppError::authentication("Authentication required"))?;
    let claims = decoder.decode(&token)?;
    Ok(RequestContext::new(claims.sub, claims.role, claims.name))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // The role gate has already decoded the token for this request.
        if let Some(ctx) = parts.extensions.get::<RequestContext>() {
            return Ok(AuthUser(ctx.clone()));
        }

        let token = resolve_token(&parts.headers, &parts.uri, &state.config.auth.cookie_name);
        let ctx = authenticate(&state.jwt_decoder, token)?;
        Ok(AuthUser(ctx))
    }
}
