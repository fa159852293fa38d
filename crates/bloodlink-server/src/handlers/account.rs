//! Public pages, sign-in and session management.

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bloodlink_shared::notify::Notification;
use bloodlink_shared::routes::AppRoute;
use bloodlink_shared::BloodType;

use crate::api::AppState;
use crate::auth::{IssuedSession, Session};
use crate::error::AppError;
use crate::forms::{Credentials, ForgotPasswordRequest, ResetPasswordRequest};
use crate::guards::{clear_session_cookie, presented_token, session_cookie, CurrentSession};
use crate::layout::Page;

#[derive(Serialize)]
pub struct HomeView {
    tagline: &'static str,
    blood_types: Vec<&'static str>,
    signed_in: bool,
}

#[derive(Serialize, Default)]
pub struct CredentialsView {
    email: String,
}

#[derive(Serialize, Default, Deserialize)]
#[serde(default)]
pub struct ResetView {
    token: String,
}

#[derive(Serialize)]
pub struct SessionBody {
    token: String,
    expires_at: DateTime<Utc>,
    session: Session,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification: Option<Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_to: Option<&'static str>,
}

#[derive(Serialize)]
pub struct ActionBody {
    notification: Notification,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_to: Option<&'static str>,
}

/// A response that hands the token out in the body and as a cookie.
fn session_response(
    state: &AppState,
    status: StatusCode,
    issued: IssuedSession,
    notification: Option<Notification>,
    redirect_to: Option<&'static str>,
) -> Response {
    let max_age = (issued.session.expires_at - Utc::now()).num_seconds().max(0);
    let cookie = session_cookie(&issued.token, max_age, state.config.cookie_secure);
    let body = SessionBody {
        expires_at: issued.session.expires_at,
        token: issued.token,
        session: issued.session,
        notification,
        redirect_to,
    };
    (status, [(SET_COOKIE, cookie)], Json(body)).into_response()
}

/// Where a fresh sign-in lands: the profile form until it is filled in.
fn landing(session: &Session) -> &'static str {
    if session.profile.is_some() {
        AppRoute::Dashboard.path()
    } else {
        AppRoute::CompleteProfile.path()
    }
}

pub async fn home(State(state): State<AppState>, headers: HeaderMap) -> Json<Page<HomeView>> {
    let signed_in = match presented_token(&headers) {
        Some(token) => state.auth.resolve(&token).await.is_ok(),
        None => false,
    };
    Json(Page::public(
        &state.config.instance_name,
        "Home",
        AppRoute::Home,
        HomeView {
            tagline: "Give blood. Answer emergencies. Save lives.",
            blood_types: BloodType::ALL.iter().map(BloodType::as_str).collect(),
            signed_in,
        },
    ))
}

pub async fn login_page(State(state): State<AppState>) -> Json<Page<CredentialsView>> {
    Json(Page::public(
        &state.config.instance_name,
        "Sign in",
        AppRoute::Login,
        CredentialsView::default(),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<Credentials>,
) -> Result<Response, AppError> {
    let issued = state.auth.sign_in(&form.email, &form.password).await?;
    let redirect_to = landing(&issued.session);
    Ok(session_response(
        &state,
        StatusCode::OK,
        issued,
        Some(Notification::success("Signed in successfully!")),
        Some(redirect_to),
    ))
}

pub async fn register_page(State(state): State<AppState>) -> Json<Page<CredentialsView>> {
    Json(Page::public(
        &state.config.instance_name,
        "Create account",
        AppRoute::Register,
        CredentialsView::default(),
    ))
}

pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<Credentials>,
) -> Result<Response, AppError> {
    let issued = state.auth.sign_up(&form.email, &form.password).await?;
    Ok(session_response(
        &state,
        StatusCode::CREATED,
        issued,
        Some(Notification::success("Account created! Please complete your profile.")),
        Some(AppRoute::CompleteProfile.path()),
    ))
}

pub async fn forgot_password_page(State(state): State<AppState>) -> Json<Page<CredentialsView>> {
    Json(Page::public(
        &state.config.instance_name,
        "Forgot password",
        AppRoute::ForgotPassword,
        CredentialsView::default(),
    ))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(form): Json<ForgotPasswordRequest>,
) -> Result<Json<ActionBody>, AppError> {
    state.auth.forgot_password(&form.email).await?;
    Ok(Json(ActionBody {
        notification: Notification::success(
            "If an account exists for that email, a reset link has been sent.",
        ),
        redirect_to: None,
    }))
}

pub async fn reset_password_page(
    State(state): State<AppState>,
    Query(view): Query<ResetView>,
) -> Json<Page<ResetView>> {
    Json(Page::public(
        &state.config.instance_name,
        "Reset password",
        AppRoute::ResetPassword,
        view,
    ))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(form): Json<ResetPasswordRequest>,
) -> Result<Json<ActionBody>, AppError> {
    state.auth.reset_password(&form.token, &form.password).await?;
    Ok(Json(ActionBody {
        notification: Notification::success("Password updated. Please sign in."),
        redirect_to: Some(AppRoute::Login.path()),
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Response, AppError> {
    state.auth.sign_out(&session).await?;
    let body = ActionBody {
        notification: Notification::success("Signed out"),
        redirect_to: Some(AppRoute::Login.path()),
    };
    Ok((
        [(SET_COOKIE, clear_session_cookie(state.config.cookie_secure))],
        Json(body),
    )
        .into_response())
}

pub async fn current_session(CurrentSession(session): CurrentSession) -> Json<Session> {
    Json(session)
}

pub async fn refresh_session(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Response, AppError> {
    let issued = state.auth.refresh(&session).await?;
    Ok(session_response(&state, StatusCode::OK, issued, None, None))
}
