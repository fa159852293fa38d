//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development. A `.env` file in the working
//! directory is loaded first when present.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use bloodlink_shared::constants::{
    APP_NAME, DEFAULT_HTTP_PORT, DEFAULT_SESSION_TTL_HOURS, MAX_SESSION_TTL_HOURS,
};

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `None` (platform data directory).
    pub database_path: Option<PathBuf>,

    /// Ed25519 seed used to sign session tokens (hex-encoded, 64 chars).
    /// Env: `SESSION_SIGNING_KEY`
    /// Default: `None` (a random key per boot; sessions do not survive restarts).
    pub session_signing_key: Option<[u8; 32]>,

    /// Session lifetime in hours, between 1 and 8760.
    /// Env: `SESSION_TTL_HOURS`
    /// Default: `24`
    pub session_ttl_hours: i64,

    /// Whether the session cookie carries the `Secure` attribute.
    /// Env: `COOKIE_SECURE` (true/false)
    /// Default: `false`
    pub cookie_secure: bool,

    /// Accounts with this email get the admin flag when they complete
    /// their profile.
    /// Env: `BOOTSTRAP_ADMIN_EMAIL`
    /// Default: unset.
    pub bootstrap_admin_email: Option<String>,

    /// Human-readable name for this instance.
    /// Env: `INSTANCE_NAME`
    /// Default: `"Bloodlink"`
    pub instance_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: None,
            session_signing_key: None,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            cookie_secure: false,
            bootstrap_admin_email: None,
            instance_name: APP_NAME.to_string(),
        }
    }
}

// The signing key stays out of logs.
impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("database_path", &self.database_path)
            .field(
                "session_signing_key",
                &self.session_signing_key.map(|_| "<redacted>"),
            )
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("cookie_secure", &self.cookie_secure)
            .field("bootstrap_admin_email", &self.bootstrap_admin_email)
            .field("instance_name", &self.instance_name)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(parsed) => config.http_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default"),
            }
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            if !path.trim().is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        if let Some(hex_key) = lookup("SESSION_SIGNING_KEY") {
            match parse_hex_seed(&hex_key) {
                Ok(key) => config.session_signing_key = Some(key),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Invalid SESSION_SIGNING_KEY, a random key will be used"
                    );
                }
            }
        }

        if let Some(val) = lookup("SESSION_TTL_HOURS") {
            match val.parse::<i64>() {
                Ok(n) if (1..=MAX_SESSION_TTL_HOURS).contains(&n) => {
                    config.session_ttl_hours = n
                }
                _ => tracing::warn!(value = %val, "Invalid SESSION_TTL_HOURS, using default"),
            }
        }

        if let Some(val) = lookup("COOKIE_SECURE") {
            config.cookie_secure = val == "true" || val == "1";
        }

        if let Some(email) = lookup("BOOTSTRAP_ADMIN_EMAIL") {
            let email = bloodlink_shared::validation::normalize_email(&email);
            if !email.is_empty() {
                config.bootstrap_admin_email = Some(email);
            }
        }

        if let Some(name) = lookup("INSTANCE_NAME") {
            config.instance_name = name;
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

/// Parse a 64-character hex string into a 32-byte seed.
fn parse_hex_seed(hex_str: &str) -> Result<[u8; 32], String> {
    let hex_str = hex_str.trim();
    if hex_str.len() != 64 {
        return Err(format!("expected 64 hex chars, got {}", hex_str.len()));
    }
    let bytes = hex::decode(hex_str).map_err(|e| format!("invalid hex: {e}"))?;
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&bytes);
    Ok(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.session_ttl_hours, 24);
        assert!(config.session_signing_key.is_none());
        assert!(!config.cookie_secure);
    }

    #[test]
    fn test_env_overrides() {
        let key = "ab".repeat(32);
        let config = ServerConfig::from_lookup(lookup(&[
            ("HTTP_ADDR", "127.0.0.1:9000"),
            ("DATABASE_PATH", "/tmp/blood.db"),
            ("SESSION_SIGNING_KEY", &key),
            ("SESSION_TTL_HOURS", "2"),
            ("COOKIE_SECURE", "true"),
            ("BOOTSTRAP_ADMIN_EMAIL", " Admin@Example.org "),
        ]));
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 9000).into());
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/blood.db")));
        assert_eq!(config.session_signing_key, Some([0xab; 32]));
        assert_eq!(config.session_ttl_hours, 2);
        assert!(config.cookie_secure);
        assert_eq!(config.bootstrap_admin_email.as_deref(), Some("admin@example.org"));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HTTP_ADDR", "nonsense"),
            ("SESSION_SIGNING_KEY", "abcd"),
            ("SESSION_TTL_HOURS", "-4"),
        ]));
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert!(config.session_signing_key.is_none());
        assert_eq!(config.session_ttl_hours, 24);
    }

    #[test]
    fn test_session_ttl_bounds() {
        let ttl = |v: &str| {
            ServerConfig::from_lookup(lookup(&[("SESSION_TTL_HOURS", v)])).session_ttl_hours
        };
        assert_eq!(ttl("1"), 1);
        assert_eq!(ttl("8760"), 8760);
        assert_eq!(ttl("8761"), 24);
        assert_eq!(ttl("10000000000"), 24);
        assert_eq!(ttl("0"), 24);
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ServerConfig {
            session_signing_key: Some([7u8; 32]),
            ..Default::default()
        };
        let printed = format!("{config:?}");
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("0707"));
    }
}
