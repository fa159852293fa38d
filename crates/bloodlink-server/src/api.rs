use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{Method, Uri},
    middleware,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use chrono::Duration;
use ed25519_dalek::SigningKey;
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use bloodlink_shared::routes::AppRoute;
use bloodlink_store::Database;

use crate::auth::{AuthService, Db};
use crate::config::ServerConfig;
use crate::guards::{require_admin, require_session};
use crate::handlers::{account, admin, member};

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub auth: AuthService,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(database: Database, config: ServerConfig, signing_key: SigningKey) -> Self {
        let db: Db = Arc::new(Mutex::new(database));
        let auth = AuthService::new(
            db.clone(),
            signing_key,
            Duration::hours(config.session_ttl_hours),
            config.bootstrap_admin_email.clone(),
        );
        Self {
            db,
            auth,
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let admin = Router::new()
        .route("/admin", get(admin::dashboard))
        .route("/admin/donations", get(admin::donations))
        .route("/admin/donations/:id/status", post(admin::set_donation_status))
        .route("/admin/emergency-requests", get(admin::emergency_requests))
        .route(
            "/admin/emergency-requests/:id/status",
            post(admin::set_emergency_request_status),
        )
        .route("/admin/users", get(admin::users))
        .route("/admin/users/:id/admin", post(admin::set_admin))
        .route_layer(middleware::from_fn(require_admin));

    let protected = Router::new()
        .route("/logout", post(account::logout))
        .route("/session", get(account::current_session))
        .route("/session/refresh", post(account::refresh_session))
        .route(
            "/complete-profile",
            get(member::complete_profile_page).post(member::complete_profile),
        )
        .route(
            "/profile",
            get(member::profile_page).post(member::update_profile),
        )
        .route("/dashboard", get(member::dashboard))
        .route("/donations", get(member::donations))
        .route(
            "/donations/new",
            get(member::new_donation_page).post(member::create_donation),
        )
        .route("/emergency-requests", get(member::emergency_requests))
        .route(
            "/emergency-requests/new",
            get(member::new_emergency_request_page).post(member::create_emergency_request),
        )
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(account::home))
        .route("/login", get(account::login_page).post(account::login))
        .route("/register", get(account::register_page).post(account::register))
        .route(
            "/forgot-password",
            get(account::forgot_password_page).post(account::forgot_password),
        )
        .route(
            "/reset-password",
            get(account::reset_password_page).post(account::reset_password),
        )
        .merge(protected)
        .fallback(unmatched)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Unknown paths are never an error: they land on the closest known page,
/// which is `/` unless only a trailing slash or query was off.
async fn unmatched(uri: Uri) -> Redirect {
    let route = AppRoute::resolve(uri.path());
    tracing::debug!(path = %uri.path(), to = route.path(), "unmatched path");
    Redirect::to(route.path())
}

pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
