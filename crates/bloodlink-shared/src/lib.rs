//! # bloodlink-shared
//!
//! Domain vocabulary shared by the store and the server: blood types,
//! urgency tiers, record statuses, form field validation, the route table
//! with its guard decisions, notifications, and signed session tokens.

pub mod constants;
pub mod error;
pub mod notify;
pub mod routes;
pub mod token;
pub mod types;
pub mod validation;

pub use error::{TokenError, ValidationError};
pub use types::{BloodType, DonationStatus, RequestStatus, UrgencyLevel, UserId};
