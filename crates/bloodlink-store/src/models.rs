//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` so it can be handed directly to the
//! HTTP layer as JSON.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bloodlink_shared::validation::UnitsNeeded;
use bloodlink_shared::{BloodType, DonationStatus, RequestStatus, UrgencyLevel, UserId};

// ---------------------------------------------------------------------------
// Account / Session
// ---------------------------------------------------------------------------

/// A sign-in identity. The profile, once completed, shares its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: UserId,
    /// Normalized lowercase email.
    pub email: String,
    /// Argon2 PHC string. Never serialized.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A live sign-in. Deleting the row revokes every token that names it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: Uuid,
    pub account_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
    pub blood_type: Option<BloodType>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub is_admin: bool,
    pub last_donation_date: Option<NaiveDate>,
}

impl Profile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// User-editable profile fields, already validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileFields {
    pub first_name: String,
    pub last_name: String,
    pub blood_type: Option<BloodType>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

// ---------------------------------------------------------------------------
// Blood donation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BloodDonation {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub user_id: UserId,
    pub blood_type: BloodType,
    pub donation_date: NaiveDate,
    pub donation_center: String,
    pub units: u32,
    pub status: DonationStatus,
    pub notes: Option<String>,
}

/// Insert payload for a donation. Status always starts as `pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDonation {
    pub user_id: UserId,
    pub blood_type: BloodType,
    pub donation_date: NaiveDate,
    pub donation_center: String,
    pub units: u32,
    pub notes: Option<String>,
}

/// A donation joined with its donor's name, for admin lists.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DonationWithDonor {
    #[serde(flatten)]
    pub donation: BloodDonation,
    pub donor_name: String,
}

// ---------------------------------------------------------------------------
// Emergency request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmergencyRequest {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub user_id: UserId,
    pub blood_type: BloodType,
    pub units_needed: UnitsNeeded,
    pub hospital: String,
    pub patient_name: String,
    pub contact_number: String,
    pub urgency_level: UrgencyLevel,
    pub status: RequestStatus,
    pub notes: Option<String>,
}

/// Insert payload for an emergency request. Status always starts as `open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmergencyRequest {
    pub user_id: UserId,
    pub blood_type: BloodType,
    pub units_needed: UnitsNeeded,
    pub hospital: String,
    pub patient_name: String,
    pub contact_number: String,
    pub urgency_level: UrgencyLevel,
    pub notes: Option<String>,
}

/// An emergency request joined with its requester's name, for admin lists.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RequestWithRequester {
    #[serde(flatten)]
    pub request: EmergencyRequest,
    pub requester_name: String,
}
