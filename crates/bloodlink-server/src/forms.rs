//! Form payloads as submitted by the client.
//!
//! Fields are kept as typed (text, or numbers that may arrive as text) and
//! only parsed by `validate`, which turns a form into the store's insert
//! payload. Submissions are read through [`FormPayload`] so that a body of
//! the wrong shape still reaches the handler and can be echoed back.

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::convert::Infallible;

use bloodlink_shared::notify::Notification;
use bloodlink_shared::validation::{self, UnitsNeeded};
use bloodlink_shared::{BloodType, ValidationError, UserId};
use bloodlink_store::{NewDonation, NewEmergencyRequest, Profile, ProfileFields};

fn blood_type(value: &str) -> Result<BloodType, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "Blood type",
        });
    }
    value.parse()
}

fn optional_blood_type(value: &str) -> Result<Option<BloodType>, ValidationError> {
    match value.trim() {
        "" => Ok(None),
        v => v.parse().map(Some),
    }
}

/// A whole-number field as the client sent it: a JSON number, or text such
/// as `"4"` from an input element.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NumberInput {
    Number(serde_json::Number),
    Text(String),
}

impl NumberInput {
    fn parse(&self, field: &'static str) -> Result<i64, ValidationError> {
        match self {
            NumberInput::Number(n) => n.as_i64().ok_or(ValidationError::NotANumber { field }),
            NumberInput::Text(s) => validation::integer(field, s),
        }
    }
}

impl From<i64> for NumberInput {
    fn from(n: i64) -> Self {
        NumberInput::Number(n.into())
    }
}

// ---------------------------------------------------------------------------
// Submission extractor
// ---------------------------------------------------------------------------

/// A form submission as received. `raw` is the decoded JSON body (or
/// `null` when the body was not JSON) and `form` the typed form, or why the
/// body did not fit it. Content-Type is not checked.
#[derive(Debug)]
pub struct FormPayload<F> {
    pub raw: Value,
    pub form: Result<F, String>,
}

impl<F: DeserializeOwned> FormPayload<F> {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let raw = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Object(Default::default())
        } else {
            match serde_json::from_slice::<Value>(bytes) {
                Ok(raw) => raw,
                Err(e) => {
                    return Self {
                        raw: Value::Null,
                        form: Err(format!("Form body is not valid JSON: {e}")),
                    }
                }
            }
        };
        let form = F::deserialize(&raw).map_err(|e| format!("Invalid form: {e}"));
        Self { raw, form }
    }
}

#[async_trait]
impl<S, F> FromRequest<S> for FormPayload<F>
where
    S: Send + Sync,
    F: DeserializeOwned + Send,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Bytes::from_request(req, state).await {
            Ok(bytes) => Ok(Self::from_bytes(&bytes)),
            Err(rejection) => Ok(Self {
                raw: Value::Null,
                form: Err(rejection.body_text()),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Emergency request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmergencyRequestForm {
    pub blood_type: String,
    pub units_needed: NumberInput,
    pub hospital: String,
    pub patient_name: String,
    pub contact_number: String,
    pub urgency_level: String,
    pub notes: Option<String>,
}

impl Default for EmergencyRequestForm {
    fn default() -> Self {
        Self {
            blood_type: String::new(),
            units_needed: 1_i64.into(),
            hospital: String::new(),
            patient_name: String::new(),
            contact_number: String::new(),
            urgency_level: "medium".to_string(),
            notes: None,
        }
    }
}

impl EmergencyRequestForm {
    /// Initial values: the requester's phone is offered as contact number.
    pub fn defaults_for(profile: Option<&Profile>) -> Self {
        Self {
            contact_number: profile
                .and_then(|p| p.phone.clone())
                .unwrap_or_default(),
            ..Default::default()
        }
    }

    pub fn validate(&self, user_id: UserId) -> Result<NewEmergencyRequest, ValidationError> {
        Ok(NewEmergencyRequest {
            user_id,
            blood_type: blood_type(&self.blood_type)?,
            units_needed: UnitsNeeded::try_from(self.units_needed.parse("Units needed")?)?,
            hospital: validation::required_text("Hospital", &self.hospital)?,
            patient_name: validation::required_text("Patient name", &self.patient_name)?,
            contact_number: validation::required_text("Contact number", &self.contact_number)?,
            urgency_level: self.urgency_level.parse()?,
            notes: validation::notes(self.notes.as_deref())?,
        })
    }
}

// ---------------------------------------------------------------------------
// Donation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DonationForm {
    pub blood_type: String,
    pub donation_date: String,
    pub donation_center: String,
    pub units: NumberInput,
    pub notes: Option<String>,
}

impl Default for DonationForm {
    fn default() -> Self {
        Self {
            blood_type: String::new(),
            donation_date: String::new(),
            donation_center: String::new(),
            units: 1_i64.into(),
            notes: None,
        }
    }
}

impl DonationForm {
    /// Initial values: the donor's blood type and today's date.
    pub fn defaults_for(profile: Option<&Profile>, today: NaiveDate) -> Self {
        Self {
            blood_type: profile
                .and_then(|p| p.blood_type)
                .map(|bt| bt.to_string())
                .unwrap_or_default(),
            donation_date: today.format("%Y-%m-%d").to_string(),
            ..Default::default()
        }
    }

    pub fn validate(&self, user_id: UserId, today: NaiveDate) -> Result<NewDonation, ValidationError> {
        let donation_date = validation::date("Donation date", &self.donation_date)?;
        if donation_date > today {
            return Err(ValidationError::FutureDate);
        }

        Ok(NewDonation {
            user_id,
            blood_type: blood_type(&self.blood_type)?,
            donation_date,
            donation_center: validation::required_text("Donation center", &self.donation_center)?,
            units: validation::donation_units(self.units.parse("Units")?)?,
            notes: validation::notes(self.notes.as_deref())?,
        })
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub blood_type: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
}

impl ProfileForm {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            blood_type: profile
                .blood_type
                .map(|bt| bt.to_string())
                .unwrap_or_default(),
            phone: profile.phone.clone().unwrap_or_default(),
            address: profile.address.clone().unwrap_or_default(),
            city: profile.city.clone().unwrap_or_default(),
            state: profile.state.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<ProfileFields, ValidationError> {
        Ok(ProfileFields {
            first_name: validation::required_text("First name", &self.first_name)?,
            last_name: validation::required_text("Last name", &self.last_name)?,
            blood_type: optional_blood_type(&self.blood_type)?,
            phone: validation::optional_text("Phone", Some(&self.phone))?,
            address: validation::optional_text("Address", Some(&self.address))?,
            city: validation::optional_text("City", Some(&self.city))?,
            state: validation::optional_text("State", Some(&self.state))?,
        })
    }
}

// ---------------------------------------------------------------------------
// Auth and admin payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminFlagUpdate {
    pub is_admin: bool,
}

/// `?status=` filter on the admin lists. Blank means no filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

impl StatusFilter {
    pub fn parse<T>(&self) -> Result<Option<T>, ValidationError>
    where
        T: std::str::FromStr<Err = ValidationError>,
    {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s.parse().map(Some),
        }
    }
}

/// Body of a successful form submission.
#[derive(Debug, Serialize)]
pub struct FormSuccess<T> {
    pub notification: Notification,
    pub redirect_to: &'static str,
    pub record: T,
}
