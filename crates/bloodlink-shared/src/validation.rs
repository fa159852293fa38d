//! Field-level validation for user-submitted forms.
//!
//! Every helper returns the cleaned value (trimmed, normalized) or a
//! [`ValidationError`] whose message can be shown to the user verbatim.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::{
    MAX_NOTES_LEN, MAX_TEXT_LEN, PASSWORD_MAX_LEN, PASSWORD_MIN_LEN, UNITS_NEEDED_MAX,
    UNITS_NEEDED_MIN,
};
use crate::error::ValidationError;

/// Units requested by an emergency request, always within 1..=20.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(try_from = "i64", into = "u32")]
pub struct UnitsNeeded(u32);

impl UnitsNeeded {
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for UnitsNeeded {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value < UNITS_NEEDED_MIN as i64 || value > UNITS_NEEDED_MAX as i64 {
            return Err(ValidationError::OutOfRange {
                field: "Units needed",
                min: UNITS_NEEDED_MIN as i64,
                max: UNITS_NEEDED_MAX as i64,
            });
        }
        Ok(Self(value as u32))
    }
}

impl From<UnitsNeeded> for u32 {
    fn from(units: UnitsNeeded) -> Self {
        units.0
    }
}

impl Default for UnitsNeeded {
    fn default() -> Self {
        Self(UNITS_NEEDED_MIN)
    }
}

/// Units given in a single donation. Must be positive.
pub fn donation_units(value: i64) -> Result<u32, ValidationError> {
    if value < 1 || value > u32::MAX as i64 {
        return Err(ValidationError::OutOfRange {
            field: "Units",
            min: 1,
            max: u32::MAX as i64,
        });
    }
    Ok(value as u32)
}

/// A whole number typed as text.
pub fn integer(field: &'static str, value: &str) -> Result<i64, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required { field });
    }
    value
        .parse()
        .map_err(|_| ValidationError::NotANumber { field })
}

/// A required single-line text field.
pub fn required_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required { field });
    }
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_TEXT_LEN,
        });
    }
    Ok(value.to_string())
}

/// An optional single-line text field. Blank input becomes `None`.
pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => required_text(field, v).map(Some),
    }
}

/// Free-form notes. Blank input becomes `None`.
pub fn notes(value: Option<&str>) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.chars().count() > MAX_NOTES_LEN => Err(ValidationError::TooLong {
            field: "Notes",
            max: MAX_NOTES_LEN,
        }),
        Some(v) => Ok(Some(v.to_string())),
    }
}

/// Parse a `YYYY-MM-DD` date field.
pub fn date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required { field });
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ValidationError::Date(value.into()))
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Normalize and sanity-check an email address.
pub fn email(value: &str) -> Result<String, ValidationError> {
    let email = normalize_email(value);
    if email.len() < 5 || email.len() > 254 {
        return Err(ValidationError::Email);
    }
    let mut parts = email.split('@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    let ok = parts.next().is_none()
        && !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.');
    if !ok {
        return Err(ValidationError::Email);
    }
    Ok(email)
}

pub fn password(value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        return Err(ValidationError::Password {
            min: PASSWORD_MIN_LEN,
            max: PASSWORD_MAX_LEN,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_needed_bounds() {
        assert!(UnitsNeeded::try_from(0).is_err());
        assert!(UnitsNeeded::try_from(-3).is_err());
        assert!(UnitsNeeded::try_from(21).is_err());
        assert_eq!(UnitsNeeded::try_from(1).unwrap().get(), 1);
        assert_eq!(UnitsNeeded::try_from(20).unwrap().get(), 20);
    }

    #[test]
    fn units_needed_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<UnitsNeeded>("25").is_err());
        let units: UnitsNeeded = serde_json::from_str("4").unwrap();
        assert_eq!(units.get(), 4);
    }

    #[test]
    fn integer_from_text() {
        assert_eq!(integer("Units", " 12 "), Ok(12));
        assert_eq!(integer("Units", "-2"), Ok(-2));
        assert_eq!(integer("Units", ""), Err(ValidationError::Required { field: "Units" }));
        assert_eq!(
            integer("Units", "1e3"),
            Err(ValidationError::NotANumber { field: "Units" })
        );
    }

    #[test]
    fn donation_units_positive() {
        assert!(donation_units(0).is_err());
        assert_eq!(donation_units(2).unwrap(), 2);
    }

    #[test]
    fn required_text_trims_and_rejects_blank() {
        assert_eq!(required_text("Hospital", "  City General ").unwrap(), "City General");
        assert_eq!(
            required_text("Hospital", "   ").unwrap_err(),
            ValidationError::Required { field: "Hospital" }
        );
    }

    #[test]
    fn optional_text_blank_is_none() {
        assert_eq!(optional_text("City", Some(" ")).unwrap(), None);
        assert_eq!(optional_text("City", None).unwrap(), None);
        assert_eq!(optional_text("City", Some("Lyon")).unwrap().as_deref(), Some("Lyon"));
    }

    #[test]
    fn date_parses_iso() {
        let d = date("Donation date", "2024-03-15").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert!(date("Donation date", "15/03/2024").is_err());
    }

    #[test]
    fn email_checks() {
        assert_eq!(email(" Jane@Example.org ").unwrap(), "jane@example.org");
        assert!(email("not-an-email").is_err());
        assert!(email("a@b@c.org").is_err());
        assert!(email("jane@.org").is_err());
    }

    #[test]
    fn password_length() {
        assert!(password("short").is_err());
        assert!(password("long enough").is_ok());
    }
}
