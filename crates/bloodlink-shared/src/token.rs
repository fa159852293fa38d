//! Signed session tokens.
//!
//! The server signs `session_id || user_id || valid_until` with its Ed25519
//! key and hands the client a base64url-encoded JSON envelope. Verification
//! checks the signature and the expiry only; whether the session is still
//! live is the store's business.
//!
//! Reset tokens for the password flow are random and never stored in the
//! clear: only their BLAKE3 digest is persisted.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TokenError;
use crate::types::UserId;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionToken {
    pub session_id: Uuid,
    pub user_id: UserId,
    pub valid_until: DateTime<Utc>,
    pub signature: Vec<u8>,
}

impl SessionToken {
    /// Encode for transport in a header or cookie.
    pub fn encode(&self) -> String {
        // Serializing plain data into a Vec cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(s: &str) -> Result<Self, TokenError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(s.trim())
            .map_err(|_| TokenError::Malformed)?;
        serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
    }
}

fn signing_payload(session_id: &Uuid, user_id: &UserId, valid_until: &DateTime<Utc>) -> Vec<u8> {
    let mut payload = Vec::with_capacity(64);
    payload.extend_from_slice(session_id.as_bytes());
    payload.extend_from_slice(user_id.0.as_bytes());
    payload.extend_from_slice(valid_until.to_rfc3339().as_bytes());
    payload
}

pub fn create_session_token(
    session_id: Uuid,
    user_id: UserId,
    valid_until: DateTime<Utc>,
    signing_key: &SigningKey,
) -> SessionToken {
    let payload = signing_payload(&session_id, &user_id, &valid_until);
    let signature = signing_key.sign(&payload);

    SessionToken {
        session_id,
        user_id,
        valid_until,
        signature: signature.to_bytes().to_vec(),
    }
}

pub fn verify_session_token(
    token: &SessionToken,
    verifying_key: &VerifyingKey,
) -> Result<(), TokenError> {
    if Utc::now() > token.valid_until {
        return Err(TokenError::Expired);
    }

    let signature = Signature::from_slice(&token.signature).map_err(|_| TokenError::Malformed)?;
    let payload = signing_payload(&token.session_id, &token.user_id, &token.valid_until);

    verifying_key
        .verify(&payload, &signature)
        .map_err(|_| TokenError::BadSignature)
}

/// Generate a one-time password reset token (hex, 32 random bytes).
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Digest under which a reset token is stored.
pub fn reset_token_digest(token: &str) -> String {
    blake3::hash(token.trim().as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::rngs::OsRng;

    #[test]
    fn valid_token_verifies() {
        let key = SigningKey::generate(&mut OsRng);
        let token = create_session_token(
            Uuid::new_v4(),
            UserId::new(),
            Utc::now() + Duration::hours(1),
            &key,
        );
        assert!(verify_session_token(&token, &key.verifying_key()).is_ok());

        let decoded = SessionToken::decode(&token.encode()).unwrap();
        assert_eq!(decoded, token);
        assert!(verify_session_token(&decoded, &key.verifying_key()).is_ok());
    }

    #[test]
    fn expired_token_rejected() {
        let key = SigningKey::generate(&mut OsRng);
        let token = create_session_token(
            Uuid::new_v4(),
            UserId::new(),
            Utc::now() - Duration::minutes(1),
            &key,
        );
        assert_eq!(
            verify_session_token(&token, &key.verifying_key()),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn wrong_key_rejected() {
        let key = SigningKey::generate(&mut OsRng);
        let other = SigningKey::generate(&mut OsRng);
        let token = create_session_token(
            Uuid::new_v4(),
            UserId::new(),
            Utc::now() + Duration::hours(1),
            &key,
        );
        assert_eq!(
            verify_session_token(&token, &other.verifying_key()),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn tampered_user_rejected() {
        let key = SigningKey::generate(&mut OsRng);
        let mut token = create_session_token(
            Uuid::new_v4(),
            UserId::new(),
            Utc::now() + Duration::hours(1),
            &key,
        );
        token.user_id = UserId::new();
        assert!(verify_session_token(&token, &key.verifying_key()).is_err());
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(SessionToken::decode("not a token!"), Err(TokenError::Malformed));
    }

    #[test]
    fn reset_digest_is_stable() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 64);
        assert_eq!(reset_token_digest(&token), reset_token_digest(&token));
        assert_ne!(reset_token_digest(&token), token);
    }
}
