//! Pages and forms for any signed-in user.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use bloodlink_shared::constants::DONATION_INTERVAL_DAYS;
use bloodlink_shared::notify::Notification;
use bloodlink_shared::routes::AppRoute;
use bloodlink_shared::{BloodType, UrgencyLevel};
use bloodlink_store::stats::UserSummary;
use bloodlink_store::{BloodDonation, EmergencyRequest, Profile};

use super::today;
use crate::api::AppState;
use crate::error::{AppError, FormError};
use crate::forms::{DonationForm, EmergencyRequestForm, FormPayload, FormSuccess, ProfileForm};
use crate::guards::CurrentSession;
use crate::layout::Page;

const RECENT_DONATIONS: usize = 5;

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub profile: Option<Profile>,
    pub form: ProfileForm,
    pub blood_types: Vec<&'static str>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Eligibility {
    pub eligible: bool,
    /// `None` for someone who has never donated.
    pub next_eligible_date: Option<NaiveDate>,
}

impl Eligibility {
    pub fn compute(last_donation: Option<NaiveDate>, today: NaiveDate) -> Self {
        let next_eligible_date =
            last_donation.map(|d| d + Duration::days(DONATION_INTERVAL_DAYS));
        Self {
            eligible: next_eligible_date.map_or(true, |next| today >= next),
            next_eligible_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub profile: Option<Profile>,
    pub summary: UserSummary,
    pub last_donation_date: Option<NaiveDate>,
    pub eligibility: Eligibility,
    pub recent_donations: Vec<BloodDonation>,
}

#[derive(Debug, Serialize)]
pub struct ListView<T> {
    pub items: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct FormView<F, O> {
    pub form: F,
    pub options: O,
}

#[derive(Debug, Serialize)]
pub struct UrgencyOption {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct EmergencyRequestOptions {
    pub blood_types: Vec<&'static str>,
    pub urgency_levels: Vec<UrgencyOption>,
}

#[derive(Debug, Serialize)]
pub struct DonationOptions {
    pub blood_types: Vec<&'static str>,
    pub max_date: NaiveDate,
}

fn blood_type_options() -> Vec<&'static str> {
    BloodType::ALL.iter().map(BloodType::as_str).collect()
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

const PROFILE_SAVE_FAILED: &str = "Failed to save profile. Please try again.";

pub async fn complete_profile_page(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Json<Page<ProfileView>> {
    let form = session
        .profile
        .as_ref()
        .map(ProfileForm::from_profile)
        .unwrap_or_default();
    let view = ProfileView {
        profile: session.profile.clone(),
        form,
        blood_types: blood_type_options(),
    };
    Json(Page::member(
        &state.config.instance_name,
        "Complete your profile",
        AppRoute::CompleteProfile,
        &session,
        view,
    ))
}

pub async fn complete_profile(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    FormPayload { raw, form }: FormPayload<ProfileForm>,
) -> Result<(StatusCode, Json<FormSuccess<Profile>>), FormError<Value>> {
    let form = match form {
        Ok(form) => form,
        Err(e) => return Err(FormError::local(AppError::MalformedForm(e), raw)),
    };
    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(e) => return Err(FormError::local(e, raw)),
    };

    match state.auth.complete_profile(&session, &fields).await {
        Ok(profile) => {
            info!(user = %session.user_id, "profile completed");
            Ok((
                StatusCode::CREATED,
                Json(FormSuccess {
                    notification: Notification::success("Profile saved successfully!"),
                    redirect_to: AppRoute::Dashboard.path(),
                    record: profile,
                }),
            ))
        }
        Err(e) => Err(FormError::rejected(e, PROFILE_SAVE_FAILED, raw)),
    }
}

pub async fn profile_page(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Json<Page<ProfileView>> {
    let form = session
        .profile
        .as_ref()
        .map(ProfileForm::from_profile)
        .unwrap_or_default();
    let view = ProfileView {
        profile: session.profile.clone(),
        form,
        blood_types: blood_type_options(),
    };
    Json(Page::member(
        &state.config.instance_name,
        "My Profile",
        AppRoute::Profile,
        &session,
        view,
    ))
}

pub async fn update_profile(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    FormPayload { raw, form }: FormPayload<ProfileForm>,
) -> Result<Json<FormSuccess<Profile>>, FormError<Value>> {
    if session.profile.is_none() {
        return Err(FormError::local(AppError::ProfileNotFound, raw));
    }
    let form = match form {
        Ok(form) => form,
        Err(e) => return Err(FormError::local(AppError::MalformedForm(e), raw)),
    };
    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(e) => return Err(FormError::local(e, raw)),
    };

    match state.auth.update_profile(&session, &fields).await {
        Ok(profile) => Ok(Json(FormSuccess {
            notification: Notification::success("Profile updated successfully!"),
            redirect_to: AppRoute::Profile.path(),
            record: profile,
        })),
        Err(e) => Err(FormError::rejected(e, PROFILE_SAVE_FAILED, raw)),
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

pub async fn dashboard(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Page<DashboardView>>, AppError> {
    let (summary, mut donations) = {
        let db = state.db.lock().await;
        (
            db.user_summary(session.user_id)?,
            db.list_donations_for_user(session.user_id)?,
        )
    };
    donations.truncate(RECENT_DONATIONS);

    let last_donation_date = session.profile.as_ref().and_then(|p| p.last_donation_date);
    let view = DashboardView {
        profile: session.profile.clone(),
        summary,
        last_donation_date,
        eligibility: Eligibility::compute(last_donation_date, today()),
        recent_donations: donations,
    };

    Ok(Json(Page::member(
        &state.config.instance_name,
        "Dashboard",
        AppRoute::Dashboard,
        &session,
        view,
    )))
}

// ---------------------------------------------------------------------------
// Donations
// ---------------------------------------------------------------------------

pub async fn donations(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Page<ListView<BloodDonation>>>, AppError> {
    let items = state.db.lock().await.list_donations_for_user(session.user_id)?;
    Ok(Json(Page::member(
        &state.config.instance_name,
        "My Donations",
        AppRoute::Donations,
        &session,
        ListView { items },
    )))
}

pub async fn new_donation_page(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Json<Page<FormView<DonationForm, DonationOptions>>> {
    let today = today();
    let view = FormView {
        form: DonationForm::defaults_for(session.profile.as_ref(), today),
        options: DonationOptions {
            blood_types: blood_type_options(),
            max_date: today,
        },
    };
    Json(Page::member(
        &state.config.instance_name,
        "Record Donation",
        AppRoute::NewDonation,
        &session,
        view,
    ))
}

pub async fn create_donation(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    FormPayload { raw, form }: FormPayload<DonationForm>,
) -> Result<(StatusCode, Json<FormSuccess<BloodDonation>>), FormError<Value>> {
    let Some(profile) = session.profile.as_ref() else {
        return Err(FormError::local(AppError::ProfileNotFound, raw));
    };
    let form = match form {
        Ok(form) => form,
        Err(e) => return Err(FormError::local(AppError::MalformedForm(e), raw)),
    };
    let new = match form.validate(profile.id, today()) {
        Ok(new) => new,
        Err(e) => return Err(FormError::local(e, raw)),
    };

    let inserted = state.db.lock().await.insert_donation(&new);
    match inserted {
        Ok(donation) => {
            info!(user = %profile.id, donation = %donation.id, "donation recorded");
            Ok((
                StatusCode::CREATED,
                Json(FormSuccess {
                    notification: Notification::success("Donation recorded successfully!"),
                    redirect_to: AppRoute::Donations.path(),
                    record: donation,
                }),
            ))
        }
        Err(e) => {
            warn!(user = %profile.id, error = %e, "donation insert failed");
            Err(FormError::rejected(
                e,
                "Failed to record donation. Please try again.",
                raw,
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Emergency requests
// ---------------------------------------------------------------------------

pub async fn emergency_requests(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Page<ListView<EmergencyRequest>>>, AppError> {
    let items = state
        .db
        .lock()
        .await
        .list_emergency_requests_for_user(session.user_id)?;
    Ok(Json(Page::member(
        &state.config.instance_name,
        "Emergency Requests",
        AppRoute::EmergencyRequests,
        &session,
        ListView { items },
    )))
}

pub async fn new_emergency_request_page(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Json<Page<FormView<EmergencyRequestForm, EmergencyRequestOptions>>> {
    let view = FormView {
        form: EmergencyRequestForm::defaults_for(session.profile.as_ref()),
        options: EmergencyRequestOptions {
            blood_types: blood_type_options(),
            urgency_levels: UrgencyLevel::ALL
                .iter()
                .map(|u| UrgencyOption {
                    value: u.as_str(),
                    label: u.label(),
                })
                .collect(),
        },
    };
    Json(Page::member(
        &state.config.instance_name,
        "New Emergency Request",
        AppRoute::NewEmergencyRequest,
        &session,
        view,
    ))
}

/// Submit an emergency request. Nothing reaches the store unless the caller
/// has a profile and the form is valid. The profile is checked before the
/// body, so a profile-less caller always gets that answer first.
pub async fn create_emergency_request(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    FormPayload { raw, form }: FormPayload<EmergencyRequestForm>,
) -> Result<(StatusCode, Json<FormSuccess<EmergencyRequest>>), FormError<Value>> {
    let Some(profile) = session.profile.as_ref() else {
        return Err(FormError::local(AppError::ProfileNotFound, raw));
    };
    let form = match form {
        Ok(form) => form,
        Err(e) => return Err(FormError::local(AppError::MalformedForm(e), raw)),
    };
    let new = match form.validate(profile.id) {
        Ok(new) => new,
        Err(e) => return Err(FormError::local(e, raw)),
    };

    let inserted = state.db.lock().await.insert_emergency_request(&new);
    match inserted {
        Ok(request) => {
            info!(
                user = %profile.id,
                request = %request.id,
                urgency = %request.urgency_level,
                "emergency request created"
            );
            Ok((
                StatusCode::CREATED,
                Json(FormSuccess {
                    notification: Notification::success("Emergency request created successfully!"),
                    redirect_to: AppRoute::EmergencyRequests.path(),
                    record: request,
                }),
            ))
        }
        Err(e) => {
            warn!(user = %profile.id, error = %e, "emergency request insert failed");
            Err(FormError::rejected(
                e,
                "Failed to create emergency request. Please try again.",
                raw,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn never_donated_is_eligible() {
        let e = Eligibility::compute(None, day(2024, 5, 1));
        assert!(e.eligible);
        assert_eq!(e.next_eligible_date, None);
    }

    #[test]
    fn eligibility_after_interval() {
        let last = day(2024, 1, 1);
        let next = day(2024, 2, 26);

        let before = Eligibility::compute(Some(last), day(2024, 2, 25));
        assert!(!before.eligible);
        assert_eq!(before.next_eligible_date, Some(next));

        assert!(Eligibility::compute(Some(last), next).eligible);
    }
}
