//! Admin-only pages and moderation actions.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use bloodlink_shared::notify::Notification;
use bloodlink_shared::routes::AppRoute;
use bloodlink_shared::{DonationStatus, RequestStatus, UserId};
use bloodlink_store::stats::AdminSummary;
use bloodlink_store::{
    BloodDonation, DonationWithDonor, EmergencyRequest, Profile, RequestWithRequester,
};

use super::member::ListView;
use crate::api::AppState;
use crate::error::AppError;
use crate::forms::{AdminFlagUpdate, StatusFilter, StatusUpdate};
use crate::guards::CurrentSession;
use crate::layout::Page;

#[derive(Debug, Serialize)]
pub struct FilteredList<T> {
    pub items: Vec<T>,
    pub status: Option<&'static str>,
    pub statuses: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct Updated<T> {
    pub notification: Notification,
    pub record: T,
}

pub async fn dashboard(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Page<AdminSummary>>, AppError> {
    let summary = state.db.lock().await.admin_summary()?;
    Ok(Json(Page::member(
        &state.config.instance_name,
        "Admin Dashboard",
        AppRoute::AdminDashboard,
        &session,
        summary,
    )))
}

// ---------------------------------------------------------------------------
// Donations
// ---------------------------------------------------------------------------

pub async fn donations(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Page<FilteredList<DonationWithDonor>>>, AppError> {
    let status = filter.parse::<DonationStatus>()?;
    let items = state.db.lock().await.list_donations(status)?;
    Ok(Json(Page::member(
        &state.config.instance_name,
        "Manage Donations",
        AppRoute::AdminDonations,
        &session,
        FilteredList {
            items,
            status: status.map(|s| s.as_str()),
            statuses: DonationStatus::ALL.iter().map(DonationStatus::as_str).collect(),
        },
    )))
}

pub async fn set_donation_status(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Updated<BloodDonation>>, AppError> {
    let status: DonationStatus = update.status.parse()?;
    let donation = state.db.lock().await.set_donation_status(id, status)?;
    info!(admin = %session.user_id, donation = %id, %status, "donation status set");
    Ok(Json(Updated {
        notification: Notification::success(format!("Donation marked as {status}")),
        record: donation,
    }))
}

// ---------------------------------------------------------------------------
// Emergency requests
// ---------------------------------------------------------------------------

pub async fn emergency_requests(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Page<FilteredList<RequestWithRequester>>>, AppError> {
    let status = filter.parse::<RequestStatus>()?;
    let items = state.db.lock().await.list_emergency_requests(status)?;
    Ok(Json(Page::member(
        &state.config.instance_name,
        "Manage Emergencies",
        AppRoute::AdminEmergencyRequests,
        &session,
        FilteredList {
            items,
            status: status.map(|s| s.as_str()),
            statuses: RequestStatus::ALL.iter().map(RequestStatus::as_str).collect(),
        },
    )))
}

pub async fn set_emergency_request_status(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Updated<EmergencyRequest>>, AppError> {
    let status: RequestStatus = update.status.parse()?;
    let request = state
        .db
        .lock()
        .await
        .set_emergency_request_status(id, status)?;
    info!(admin = %session.user_id, request = %id, %status, "emergency request status set");
    Ok(Json(Updated {
        notification: Notification::success(format!("Emergency request marked as {status}")),
        record: request,
    }))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub async fn users(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Page<ListView<Profile>>>, AppError> {
    let items = state.db.lock().await.list_profiles()?;
    Ok(Json(Page::member(
        &state.config.instance_name,
        "Manage Users",
        AppRoute::AdminUsers,
        &session,
        ListView { items },
    )))
}

pub async fn set_admin(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<UserId>,
    Json(update): Json<AdminFlagUpdate>,
) -> Result<Json<Updated<Profile>>, AppError> {
    if id == session.user_id && !update.is_admin {
        return Err(AppError::Forbidden(
            "you cannot revoke your own admin role".into(),
        ));
    }

    let profile = state.db.lock().await.set_admin(id, update.is_admin)?;
    info!(admin = %session.user_id, user = %id, is_admin = update.is_admin, "admin flag set");

    let message = if update.is_admin {
        format!("{} is now an admin", profile.full_name())
    } else {
        format!("{} is no longer an admin", profile.full_name())
    };
    Ok(Json(Updated {
        notification: Notification::success(message),
        record: profile,
    }))
}
