//! # bloodlink-server
//!
//! HTTP server for the Bloodlink blood donation network.
//!
//! This binary provides:
//! - **Accounts and sessions** with argon2 password hashes and signed,
//!   revocable session tokens
//! - **Route guards** that send anonymous callers to `/login` and
//!   non-admins to `/dashboard`
//! - **Donor pages** for profiles, donation history and emergency requests
//! - **Admin pages** for moderating donations, requests and user roles

mod api;
mod auth;
mod config;
mod error;
mod forms;
mod guards;
mod handlers;
mod layout;

use chrono::Utc;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bloodlink_store::Database;

use crate::api::AppState;
use crate::auth::AuthEvent;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Environment and tracing (respects RUST_LOG)
    // -----------------------------------------------------------------------
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,bloodlink_server=debug")),
        )
        .init();

    info!("Starting Bloodlink server v{}", env!("CARGO_PKG_VERSION"));
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded .env file");
    }

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open the database and session signing key
    // -----------------------------------------------------------------------
    let database = match &config.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };
    info!(path = ?database.path(), "Database ready");

    let signing_key = match config.session_signing_key {
        Some(seed) => SigningKey::from_bytes(&seed),
        None => {
            warn!("SESSION_SIGNING_KEY not set, sessions will not survive a restart");
            SigningKey::generate(&mut OsRng)
        }
    };

    let http_addr = config.http_addr;
    let app_state = AppState::new(database, config, signing_key);

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Auth event log
    let mut events = app_state.auth.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_auth_event(&event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "auth event log lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Expired session and reset token cleanup (every 10 minutes)
    let db = app_state.db.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(600));
        loop {
            interval.tick().await;
            match db.lock().await.purge_expired(Utc::now()) {
                Ok(0) => {}
                Ok(n) => info!(purged = n, "expired sessions purged"),
                Err(e) => tracing::error!(error = %e, "session purge failed"),
            }
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

fn log_auth_event(event: &AuthEvent) {
    match event {
        AuthEvent::SignedUp { user_id } => info!(user = %user_id, "auth: signed up"),
        AuthEvent::SignedIn { user_id } => info!(user = %user_id, "auth: signed in"),
        AuthEvent::SignedOut { user_id } => info!(user = %user_id, "auth: signed out"),
        AuthEvent::ProfileUpdated { user_id } => info!(user = %user_id, "auth: profile updated"),
        AuthEvent::PasswordReset { user_id } => info!(user = %user_id, "auth: password reset"),
    }
}
