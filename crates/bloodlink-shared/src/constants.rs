/// Application name
pub const APP_NAME: &str = "Bloodlink";

/// Smallest number of units an emergency request may ask for
pub const UNITS_NEEDED_MIN: u32 = 1;

/// Largest number of units an emergency request may ask for
pub const UNITS_NEEDED_MAX: u32 = 20;

/// Password length bounds (characters)
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 128;

/// Maximum length of free-text form fields
pub const MAX_TEXT_LEN: usize = 256;

/// Maximum length of notes fields
pub const MAX_NOTES_LEN: usize = 2000;

/// Default session lifetime in hours
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// Longest accepted session lifetime in hours (one year)
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// Password reset tokens expire after this many minutes
pub const PASSWORD_RESET_TTL_MINUTES: i64 = 60;

/// Minimum days between whole-blood donations
pub const DONATION_INTERVAL_DAYS: i64 = 56;

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "bloodlink_session";
