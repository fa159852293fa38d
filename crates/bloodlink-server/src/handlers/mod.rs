//! HTTP handlers, grouped by who may call them.

pub mod account;
pub mod admin;
pub mod member;

use chrono::{NaiveDate, Utc};

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
