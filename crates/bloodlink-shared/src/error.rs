use thiserror::Error;

/// A form field failed validation. The message is shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} must be a whole number")]
    NotANumber { field: &'static str },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },

    #[error("Invalid blood type: {0}")]
    BloodType(String),

    #[error("Invalid urgency level: {0}")]
    UrgencyLevel(String),

    #[error("Invalid status: {0}")]
    Status(String),

    #[error("Invalid date: {0}")]
    Date(String),

    #[error("Donation date cannot be in the future")]
    FutureDate,

    #[error("Invalid email format")]
    Email,

    #[error("Password must be between {min} and {max} characters")]
    Password { min: usize, max: usize },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed session token")]
    Malformed,

    #[error("Session token signature is invalid")]
    BadSignature,

    #[error("Session token has expired")]
    Expired,
}
