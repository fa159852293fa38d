//! Authentication and session management.
//!
//! [`AuthService`] owns the sign-in lifecycle: accounts with argon2 password
//! hashes, server-recorded sessions addressed by Ed25519-signed tokens, and
//! the one-time password reset flow. Every state change is broadcast as an
//! [`AuthEvent`] so other parts of the server can react to it.

use std::sync::Arc;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::SigningKey;
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use bloodlink_shared::constants::PASSWORD_RESET_TTL_MINUTES;
use bloodlink_shared::routes::Viewer;
use bloodlink_shared::token::{
    create_session_token, generate_reset_token, reset_token_digest, verify_session_token,
    SessionToken,
};
use bloodlink_shared::{validation, UserId};
use bloodlink_store::{Database, Profile, ProfileFields, StoreError};

use crate::error::AppError;

pub type Db = Arc<Mutex<Database>>;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The signed-in caller, re-resolved from the store on every request.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    #[serde(skip)]
    pub session_id: Uuid,
    pub user_id: UserId,
    pub email: String,
    pub expires_at: DateTime<Utc>,
    /// `None` until the profile has been completed.
    pub profile: Option<Profile>,
}

impl Session {
    pub fn viewer(&self) -> Viewer {
        Viewer {
            signed_in: true,
            is_admin: self.profile.as_ref().map(|p| p.is_admin),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.is_admin)
    }
}

/// A freshly created session together with the token that addresses it.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub session: Session,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedUp { user_id: UserId },
    SignedIn { user_id: UserId },
    SignedOut { user_id: UserId },
    ProfileUpdated { user_id: UserId },
    PasswordReset { user_id: UserId },
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AuthService {
    db: Db,
    signing_key: Arc<SigningKey>,
    session_ttl: Duration,
    bootstrap_admin_email: Option<String>,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthService {
    pub fn new(
        db: Db,
        signing_key: SigningKey,
        session_ttl: Duration,
        bootstrap_admin_email: Option<String>,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            db,
            signing_key: Arc::new(signing_key),
            session_ttl,
            bootstrap_admin_email,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: AuthEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Create an account and sign it in.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<IssuedSession, AppError> {
        let email = validation::email(email)?;
        validation::password(password)?;

        if self.db.lock().await.find_account_by_email(&email)?.is_some() {
            return Err(AppError::Conflict("User already registered".into()));
        }

        let password_hash = hash_password(password.to_string()).await?;

        let account = {
            let db = self.db.lock().await;
            db.create_account(&email, &password_hash).map_err(|e| match e {
                StoreError::Duplicate(_) => AppError::Conflict("User already registered".into()),
                other => other.into(),
            })?
        };

        info!(user = %account.id, "account created");
        self.emit(AuthEvent::SignedUp {
            user_id: account.id,
        });

        self.start_session(account.id, account.email).await
    }

    /// Check credentials and start a session. Unknown email and wrong
    /// password are indistinguishable to the caller.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<IssuedSession, AppError> {
        let email = validation::normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AppError::InvalidCredentials);
        }

        let account = self.db.lock().await.find_account_by_email(&email)?;
        let Some(account) = account else {
            debug!(%email, "sign-in for unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(password.to_string(), account.password_hash.clone()).await? {
            debug!(user = %account.id, "sign-in with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let issued = self.start_session(account.id, account.email).await?;
        self.emit(AuthEvent::SignedIn {
            user_id: account.id,
        });
        Ok(issued)
    }

    /// Revoke the session. Tokens naming it stop resolving immediately.
    pub async fn sign_out(&self, session: &Session) -> Result<(), AppError> {
        self.db.lock().await.delete_session(session.session_id)?;
        info!(user = %session.user_id, "signed out");
        self.emit(AuthEvent::SignedOut {
            user_id: session.user_id,
        });
        Ok(())
    }

    /// Replace the session with a fresh one carrying a new expiry.
    pub async fn refresh(&self, session: &Session) -> Result<IssuedSession, AppError> {
        let issued = self
            .start_session(session.user_id, session.email.clone())
            .await?;
        self.db.lock().await.delete_session(session.session_id)?;
        debug!(user = %session.user_id, "session refreshed");
        Ok(issued)
    }

    /// Turn a presented token into the current [`Session`].
    pub async fn resolve(&self, token: &str) -> Result<Session, AppError> {
        let token = SessionToken::decode(token).map_err(|_| AppError::Unauthorized)?;
        verify_session_token(&token, &self.signing_key.verifying_key()).map_err(|e| {
            debug!(error = %e, "rejected session token");
            AppError::Unauthorized
        })?;

        let db = self.db.lock().await;
        let record = match db.get_live_session(token.session_id, Utc::now()) {
            Ok(record) => record,
            Err(StoreError::NotFound) => return Err(AppError::Unauthorized),
            Err(e) => return Err(e.into()),
        };
        if record.account_id != token.user_id {
            warn!(session = %record.id, "session token names a different account");
            return Err(AppError::Unauthorized);
        }

        let account = match db.get_account(record.account_id) {
            Ok(account) => account,
            Err(StoreError::NotFound) => return Err(AppError::Unauthorized),
            Err(e) => return Err(e.into()),
        };
        let profile = db.find_profile(account.id)?;

        Ok(Session {
            session_id: record.id,
            user_id: account.id,
            email: account.email,
            expires_at: record.expires_at,
            profile,
        })
    }

    /// Create the caller's profile, or overwrite it when it already exists.
    pub async fn complete_profile(
        &self,
        session: &Session,
        fields: &ProfileFields,
    ) -> Result<Profile, AppError> {
        let profile = {
            let db = self.db.lock().await;
            match db.find_profile(session.user_id)? {
                Some(_) => db.update_profile(session.user_id, fields)?,
                None => {
                    let is_admin =
                        self.bootstrap_admin_email.as_deref() == Some(session.email.as_str());
                    if is_admin {
                        info!(user = %session.user_id, "bootstrap admin profile created");
                    }
                    db.create_profile(session.user_id, fields, is_admin)?
                }
            }
        };

        self.emit(AuthEvent::ProfileUpdated {
            user_id: session.user_id,
        });
        Ok(profile)
    }

    /// Edit an existing profile.
    pub async fn update_profile(
        &self,
        session: &Session,
        fields: &ProfileFields,
    ) -> Result<Profile, AppError> {
        if session.profile.is_none() {
            return Err(AppError::ProfileNotFound);
        }
        let profile = self.db.lock().await.update_profile(session.user_id, fields)?;
        self.emit(AuthEvent::ProfileUpdated {
            user_id: session.user_id,
        });
        Ok(profile)
    }

    /// Start the reset flow. Succeeds whether or not the email is known.
    ///
    /// There is no mail transport; the one-time token is written to the log
    /// for an operator to deliver.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AppError> {
        let email = validation::email(email)?;

        let db = self.db.lock().await;
        let Some(account) = db.find_account_by_email(&email)? else {
            debug!(%email, "password reset for unknown email");
            return Ok(());
        };

        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::minutes(PASSWORD_RESET_TTL_MINUTES);
        db.create_password_reset(&reset_token_digest(&token), account.id, expires_at)?;

        info!(
            user = %account.id,
            reset_token = %token,
            expires_at = %expires_at,
            "password reset token issued"
        );
        Ok(())
    }

    /// Consume a reset token, set the new password and revoke every session.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        validation::password(new_password)?;
        let password_hash = hash_password(new_password.to_string()).await?;

        let completed = self.db.lock().await.complete_password_reset(
            &reset_token_digest(token),
            &password_hash,
            Utc::now(),
        );
        let user_id = match completed {
            Ok((user_id, revoked)) => {
                debug!(user = %user_id, revoked, "sessions revoked after password reset");
                user_id
            }
            Err(StoreError::NotFound) => return Err(AppError::InvalidResetToken),
            Err(e) => return Err(e.into()),
        };

        info!(user = %user_id, "password reset");
        self.emit(AuthEvent::PasswordReset { user_id });
        Ok(())
    }

    async fn start_session(&self, user_id: UserId, email: String) -> Result<IssuedSession, AppError> {
        let expires_at = Utc::now()
            .checked_add_signed(self.session_ttl)
            .ok_or_else(|| AppError::Internal("session expiry out of range".into()))?;

        let (record, profile) = {
            let db = self.db.lock().await;
            let record = db.create_session(user_id, expires_at)?;
            (record, db.find_profile(user_id)?)
        };

        let token = create_session_token(record.id, user_id, record.expires_at, &self.signing_key);

        Ok(IssuedSession {
            token: token.encode(),
            session: Session {
                session_id: record.id,
                user_id,
                email,
                expires_at: record.expires_at,
                profile,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Password hashing (CPU-bound, kept off the async workers)
// ---------------------------------------------------------------------------

async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut rand::rngs::OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
    })
    .await
    .map_err(|e| AppError::Internal(format!("password hashing worker failed: {e}")))?
    .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || match PasswordHash::new(&hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    })
    .await
    .map_err(|e| AppError::Internal(format!("password verification worker failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    fn service_with(bootstrap: Option<&str>) -> AuthService {
        let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
        AuthService::new(
            db,
            SigningKey::generate(&mut OsRng),
            Duration::hours(1),
            bootstrap.map(str::to_string),
        )
    }

    fn fields() -> ProfileFields {
        ProfileFields {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn sign_up_then_resolve() {
        let auth = service_with(None);
        let issued = auth.sign_up("Jane@Example.org", "correct horse").await.unwrap();
        assert_eq!(issued.session.email, "jane@example.org");
        assert!(issued.session.profile.is_none());

        let session = auth.resolve(&issued.token).await.unwrap();
        assert_eq!(session.user_id, issued.session.user_id);
        assert_eq!(session.viewer(), Viewer { signed_in: true, is_admin: None });
    }

    #[tokio::test]
    async fn unrepresentable_expiry_is_an_error() {
        let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
        let auth = AuthService::new(
            db,
            SigningKey::generate(&mut OsRng),
            Duration::days(100_000_000),
            None,
        );
        assert!(matches!(
            auth.sign_up("jane@example.org", "correct horse").await,
            Err(AppError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_sign_up_conflicts() {
        let auth = service_with(None);
        auth.sign_up("jane@example.org", "correct horse").await.unwrap();
        let err = auth.sign_up("JANE@example.org", "another one").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn sign_up_validates_input() {
        let auth = service_with(None);
        assert!(matches!(
            auth.sign_up("nope", "correct horse").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            auth.sign_up("jane@example.org", "short").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn sign_in_checks_password() {
        let auth = service_with(None);
        auth.sign_up("jane@example.org", "correct horse").await.unwrap();

        assert!(auth.sign_in("jane@example.org", "correct horse").await.is_ok());
        assert!(matches!(
            auth.sign_in("jane@example.org", "wrong horse").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.sign_in("who@example.org", "correct horse").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn sign_out_revokes_token() {
        let auth = service_with(None);
        let issued = auth.sign_up("jane@example.org", "correct horse").await.unwrap();
        auth.sign_out(&issued.session).await.unwrap();
        assert!(matches!(
            auth.resolve(&issued.token).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn refresh_rotates_session() {
        let auth = service_with(None);
        let issued = auth.sign_up("jane@example.org", "correct horse").await.unwrap();
        let refreshed = auth.refresh(&issued.session).await.unwrap();

        assert_ne!(refreshed.session.session_id, issued.session.session_id);
        assert!(auth.resolve(&issued.token).await.is_err());
        assert!(auth.resolve(&refreshed.token).await.is_ok());
    }

    #[tokio::test]
    async fn token_from_other_key_rejected() {
        let auth = service_with(None);
        let other = service_with(None);
        let issued = other.sign_up("jane@example.org", "correct horse").await.unwrap();
        assert!(matches!(
            auth.resolve(&issued.token).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(auth.resolve("garbage").await, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn complete_profile_creates_then_updates() {
        let auth = service_with(None);
        let issued = auth.sign_up("jane@example.org", "correct horse").await.unwrap();

        let profile = auth.complete_profile(&issued.session, &fields()).await.unwrap();
        assert!(!profile.is_admin);

        let mut changed = fields();
        changed.city = Some("Lyon".into());
        let session = auth.resolve(&issued.token).await.unwrap();
        let updated = auth.complete_profile(&session, &changed).await.unwrap();
        assert_eq!(updated.city.as_deref(), Some("Lyon"));
        assert_eq!(updated.created_at, profile.created_at);
    }

    #[tokio::test]
    async fn bootstrap_admin_flagged() {
        let auth = service_with(Some("root@example.org"));
        let issued = auth.sign_up("root@example.org", "correct horse").await.unwrap();
        let profile = auth.complete_profile(&issued.session, &fields()).await.unwrap();
        assert!(profile.is_admin);

        let session = auth.resolve(&issued.token).await.unwrap();
        assert!(session.is_admin());
    }

    #[tokio::test]
    async fn update_profile_requires_existing() {
        let auth = service_with(None);
        let issued = auth.sign_up("jane@example.org", "correct horse").await.unwrap();
        assert!(matches!(
            auth.update_profile(&issued.session, &fields()).await,
            Err(AppError::ProfileNotFound)
        ));
    }

    #[tokio::test]
    async fn events_are_broadcast() {
        let auth = service_with(None);
        let mut events = auth.subscribe();
        let issued = auth.sign_up("jane@example.org", "correct horse").await.unwrap();
        auth.sign_out(&issued.session).await.unwrap();

        let user_id = issued.session.user_id;
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedUp { user_id });
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedOut { user_id });
    }

    #[tokio::test]
    async fn reset_password_flow() {
        let auth = service_with(None);
        let issued = auth.sign_up("jane@example.org", "correct horse").await.unwrap();

        // Unknown email still reports success.
        auth.forgot_password("nobody@example.org").await.unwrap();

        let token = generate_reset_token();
        {
            let db = auth.db.lock().await;
            db.create_password_reset(
                &reset_token_digest(&token),
                issued.session.user_id,
                Utc::now() + Duration::minutes(5),
            )
            .unwrap();
        }

        auth.reset_password(&token, "battery staple").await.unwrap();
        assert!(auth.resolve(&issued.token).await.is_err());
        assert!(auth.sign_in("jane@example.org", "battery staple").await.is_ok());
        assert!(matches!(
            auth.reset_password(&token, "battery staple").await,
            Err(AppError::InvalidResetToken)
        ));
    }
}
