//! # bloodlink-store
//!
//! SQLite persistence for Bloodlink.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for accounts,
//! sessions, profiles, blood donations and emergency requests.  Callers in
//! async code are expected to put the handle behind a mutex.

pub mod accounts;
pub mod database;
pub mod donations;
pub mod emergency_requests;
pub mod migrations;
pub mod models;
pub mod profiles;
pub mod sessions;
pub mod stats;

mod error;
mod row;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
