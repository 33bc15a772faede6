use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use super::{AuthError, SESSION_TTL_DAYS};
use crate::{error::AppError, models::user::Identity, AppState};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "Authorization";

/// Gate for protected routes. Resolves the session token from the cookie and,
/// when the cookie is absent or does not resolve, from a `Bearer` header, then
/// publishes the [`Identity`] as a request extension.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let candidates = session_tokens(&jar, req.headers());
    if candidates.is_empty() {
        tracing::debug!(path = %req.uri().path(), "request without session token");
        return Err(AppError::Unauthenticated);
    }

    let mut identity = None;
    for token in &candidates {
        match state.sessions.resolve(token).await {
            Ok(resolved) => {
                identity = Some(resolved);
                break;
            }
            Err(AuthError::Unauthenticated) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    let identity = identity.ok_or(AppError::Unauthenticated)?;
    tracing::trace!(user_id = identity.id, "session resolved");

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Cookie token first, then the `Bearer` token; blanks and duplicates dropped.
fn session_tokens(jar: &CookieJar, headers: &HeaderMap) -> Vec<String> {
    let cookie = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().trim().to_string())
        .filter(|v| !v.is_empty());
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let mut tokens: Vec<String> = cookie.into_iter().collect();
    if let Some(bearer) = bearer {
        if !tokens.contains(&bearer) {
            tokens.push(bearer);
        }
    }
    tokens
}

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::days(SESSION_TTL_DAYS))
        .build()
}

/// Same cookie with an empty value and zero max-age.
pub fn cleared_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::ZERO)
        .build()
}

/// The identity published by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Identity>() {
            Some(identity) => Ok(CurrentUser(identity.clone())),
            None => {
                tracing::error!("CurrentUser used on a route without the auth gate");
                Err(AppError::Internal)
            }
        }
    }
}
