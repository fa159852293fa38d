//! Route guards and session extraction.
//!
//! `require_session` wraps every protected route and `require_admin` wraps
//! the admin routes inside it. Both defer the actual decision to
//! [`bloodlink_shared::routes`] and turn a redirect decision into a `303`.

use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use bloodlink_shared::constants::SESSION_COOKIE;
use bloodlink_shared::routes::{self, GuardDecision, Viewer};

use crate::api::AppState;
use crate::auth::Session;
use crate::error::AppError;

/// The token presented by the caller, bearer header first, then cookie.
pub fn presented_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match bearer {
        Some(token) => Some(token.to_string()),
        None => get_cookie_value(headers, SESSION_COOKIE),
    }
}

fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get(COOKIE)?.to_str().ok()?;
    for pair in cookie_header.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        let key = parts.next()?.trim();
        let value = parts.next()?.trim();
        if key == name && !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}

pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; Max-Age={max_age_secs}; SameSite=Strict; HttpOnly"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

/// `ProtectedRoute`. Without a live session the caller is sent to `/login`;
/// otherwise the resolved [`Session`] rides along in the request extensions.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let session = match presented_token(req.headers()) {
        Some(token) => match state.auth.resolve(&token).await {
            Ok(session) => Some(session),
            Err(AppError::Unauthorized) => None,
            Err(e) => return e.into_response(),
        },
        None => None,
    };

    let viewer = session
        .as_ref()
        .map(Session::viewer)
        .unwrap_or_else(Viewer::anonymous);

    match (routes::protected_route(&viewer), session) {
        (GuardDecision::Render, Some(session)) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        (GuardDecision::Redirect(to), _) => {
            tracing::debug!(path = %req.uri().path(), "no session, redirecting");
            Redirect::to(to.path()).into_response()
        }
        (GuardDecision::Render, None) => Redirect::to(routes::AppRoute::Login.path()).into_response(),
    }
}

/// `AdminRoute`. Must sit inside [`require_session`].
pub async fn require_admin(req: Request, next: Next) -> Response {
    let viewer = req
        .extensions()
        .get::<Session>()
        .map(Session::viewer)
        .unwrap_or_else(Viewer::anonymous);

    match routes::admin_route(&viewer) {
        GuardDecision::Render => next.run(req).await,
        GuardDecision::Redirect(to) => {
            tracing::debug!(path = %req.uri().path(), "not an admin, redirecting");
            Redirect::to(to.path()).into_response()
        }
    }
}

/// Extractor for the session placed by [`require_session`].
pub struct CurrentSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(CurrentSession)
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(COOKIE, HeaderValue::from_static("bloodlink_session=xyz"));
        assert_eq!(presented_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn cookie_token_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; bloodlink_session=xyz; lang=fr"),
        );
        assert_eq!(presented_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn empty_values_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        headers.insert(COOKIE, HeaderValue::from_static("bloodlink_session="));
        assert_eq!(presented_token(&headers), None);
    }

    #[test]
    fn cookie_attributes() {
        let cookie = session_cookie("tok", 3600, true);
        assert!(cookie.starts_with("bloodlink_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.ends_with("; Secure"));
        assert!(clear_session_cookie(false).contains("Max-Age=0"));
    }
}
