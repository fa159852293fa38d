//! CRUD operations for [`Profile`] records.

use rusqlite::params;

use bloodlink_shared::{BloodType, UserId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Profile, ProfileFields};
use crate::row;

const PROFILE_COLUMNS: &str = "id, created_at, updated_at, first_name, last_name, blood_type,
     phone, address, city, state, is_admin, last_donation_date";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert the profile for an existing account.
    pub fn create_profile(
        &self,
        id: UserId,
        fields: &ProfileFields,
        is_admin: bool,
    ) -> Result<Profile> {
        let now = row::now();
        let profile = Profile {
            id,
            created_at: now,
            updated_at: now,
            first_name: fields.first_name.clone(),
            last_name: fields.last_name.clone(),
            blood_type: fields.blood_type,
            phone: fields.phone.clone(),
            address: fields.address.clone(),
            city: fields.city.clone(),
            state: fields.state.clone(),
            is_admin,
            last_donation_date: None,
        };

        self.conn()
            .execute(
                "INSERT INTO profiles (id, created_at, updated_at, first_name, last_name,
                                       blood_type, phone, address, city, state, is_admin)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    profile.id.to_string(),
                    row::ts(&profile.created_at),
                    row::ts(&profile.updated_at),
                    profile.first_name,
                    profile.last_name,
                    profile.blood_type.map(|b| b.as_str()),
                    profile.phone,
                    profile.address,
                    profile.city,
                    profile.state,
                    profile.is_admin,
                ],
            )
            .map_err(|e| StoreError::from_insert(e, "Profile", "account"))?;

        Ok(profile)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_profile(&self, id: UserId) -> Result<Profile> {
        self.conn()
            .query_row(
                &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1"),
                params![id.to_string()],
                row_to_profile,
            )
            .map_err(StoreError::from_query)
    }

    /// Like [`Database::get_profile`] but a missing profile is `Ok(None)`.
    pub fn find_profile(&self, id: UserId) -> Result<Option<Profile>> {
        match self.get_profile(id) {
            Ok(profile) => Ok(Some(profile)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// All profiles, ordered by last then first name.
    pub fn list_profiles(&self) -> Result<Vec<Profile>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY last_name ASC, first_name ASC"
        ))?;
        let rows = stmt.query_map([], row_to_profile)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Overwrite the user-editable fields.
    pub fn update_profile(&self, id: UserId, fields: &ProfileFields) -> Result<Profile> {
        let affected = self.conn().execute(
            "UPDATE profiles
             SET first_name = ?1, last_name = ?2, blood_type = ?3, phone = ?4,
                 address = ?5, city = ?6, state = ?7, updated_at = ?8
             WHERE id = ?9",
            params![
                fields.first_name,
                fields.last_name,
                fields.blood_type.map(|b| b.as_str()),
                fields.phone,
                fields.address,
                fields.city,
                fields.state,
                row::ts(&row::now()),
                id.to_string(),
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_profile(id)
    }

    pub fn set_admin(&self, id: UserId, is_admin: bool) -> Result<Profile> {
        let affected = self.conn().execute(
            "UPDATE profiles SET is_admin = ?1, updated_at = ?2 WHERE id = ?3",
            params![is_admin, row::ts(&row::now()), id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_profile(id)
    }
}

fn row_to_profile(r: &rusqlite::Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row::user_id(r, 0)?,
        created_at: row::timestamp(r, 1)?,
        updated_at: row::timestamp(r, 2)?,
        first_name: r.get(3)?,
        last_name: r.get(4)?,
        blood_type: row::parsed_opt::<BloodType>(r, 5)?,
        phone: r.get(6)?,
        address: r.get(7)?,
        city: r.get(8)?,
        state: r.get(9)?,
        is_admin: r.get(10)?,
        last_donation_date: row::date_opt(r, 11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(first: &str) -> ProfileFields {
        ProfileFields {
            first_name: first.to_string(),
            last_name: "Doe".to_string(),
            blood_type: Some(BloodType::ONegative),
            phone: Some("555-0100".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn create_get_update() {
        let db = Database::open_in_memory().unwrap();
        let account = db.create_account("jane@example.org", "hash").unwrap();

        assert!(db.find_profile(account.id).unwrap().is_none());

        let created = db.create_profile(account.id, &fields("Jane"), false).unwrap();
        assert_eq!(db.get_profile(account.id).unwrap(), created);

        let mut changed = fields("Janet");
        changed.city = Some("Lyon".to_string());
        let updated = db.update_profile(account.id, &changed).unwrap();
        assert_eq!(updated.first_name, "Janet");
        assert_eq!(updated.city.as_deref(), Some("Lyon"));
        assert!(!updated.is_admin);
    }

    #[test]
    fn profile_requires_account() {
        let db = Database::open_in_memory().unwrap();
        let err = db.create_profile(UserId::new(), &fields("Ghost"), false).unwrap_err();
        assert!(matches!(err, StoreError::MissingReference("account")));
    }

    #[test]
    fn second_profile_rejected() {
        let db = Database::open_in_memory().unwrap();
        let account = db.create_account("jane@example.org", "hash").unwrap();
        db.create_profile(account.id, &fields("Jane"), false).unwrap();
        let err = db.create_profile(account.id, &fields("Jane"), false).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("Profile")));
    }

    #[test]
    fn toggle_admin() {
        let db = Database::open_in_memory().unwrap();
        let account = db.create_account("jane@example.org", "hash").unwrap();
        db.create_profile(account.id, &fields("Jane"), false).unwrap();

        assert!(db.set_admin(account.id, true).unwrap().is_admin);
        assert!(!db.set_admin(account.id, false).unwrap().is_admin);
        assert!(matches!(db.set_admin(UserId::new(), true), Err(StoreError::NotFound)));
    }
}
