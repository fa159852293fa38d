//! CRUD operations for [`BloodDonation`] records.

use rusqlite::params;
use uuid::Uuid;

use bloodlink_shared::{BloodType, DonationStatus, UserId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{BloodDonation, DonationWithDonor, NewDonation};
use crate::row;

const DONATION_COLUMNS: &str = "d.id, d.created_at, d.user_id, d.blood_type, d.donation_date,
     d.donation_center, d.units, d.status, d.notes";

impl Database {
    /// Record a donation. Status is always `pending` on insert.
    pub fn insert_donation(&self, new: &NewDonation) -> Result<BloodDonation> {
        let donation = BloodDonation {
            id: Uuid::new_v4(),
            created_at: row::now(),
            user_id: new.user_id,
            blood_type: new.blood_type,
            donation_date: new.donation_date,
            donation_center: new.donation_center.clone(),
            units: new.units,
            status: DonationStatus::Pending,
            notes: new.notes.clone(),
        };

        self.conn()
            .execute(
                "INSERT INTO blood_donations (id, created_at, user_id, blood_type, donation_date,
                                              donation_center, units, status, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    donation.id.to_string(),
                    row::ts(&donation.created_at),
                    donation.user_id.to_string(),
                    donation.blood_type.as_str(),
                    row::date_str(&donation.donation_date),
                    donation.donation_center,
                    donation.units,
                    donation.status.as_str(),
                    donation.notes,
                ],
            )
            .map_err(|e| StoreError::from_insert(e, "Donation", "profile"))?;

        Ok(donation)
    }

    pub fn get_donation(&self, id: Uuid) -> Result<BloodDonation> {
        self.conn()
            .query_row(
                &format!("SELECT {DONATION_COLUMNS} FROM blood_donations d WHERE d.id = ?1"),
                params![id.to_string()],
                row_to_donation,
            )
            .map_err(StoreError::from_query)
    }

    /// A donor's own history, newest first.
    pub fn list_donations_for_user(&self, user_id: UserId) -> Result<Vec<BloodDonation>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {DONATION_COLUMNS}
             FROM blood_donations d
             WHERE d.user_id = ?1
             ORDER BY d.donation_date DESC, d.created_at DESC"
        ))?;
        let rows = stmt.query_map(params![user_id.to_string()], row_to_donation)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Every donation with its donor's name, optionally filtered by status.
    pub fn list_donations(&self, status: Option<DonationStatus>) -> Result<Vec<DonationWithDonor>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {DONATION_COLUMNS}, p.first_name || ' ' || p.last_name
             FROM blood_donations d
             JOIN profiles p ON p.id = d.user_id
             WHERE ?1 IS NULL OR d.status = ?1
             ORDER BY d.created_at DESC"
        ))?;
        let rows = stmt.query_map(params![status.map(|s| s.as_str())], |r| {
            Ok(DonationWithDonor {
                donation: row_to_donation(r)?,
                donor_name: r.get(9)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Set a donation's status. The donor's `last_donation_date` is then
    /// recomputed from their approved donations in the same transaction, so
    /// approving moves it forward and un-approving moves it back.
    pub fn set_donation_status(&mut self, id: Uuid, status: DonationStatus) -> Result<BloodDonation> {
        let tx = self.conn_mut().transaction()?;

        let affected = tx.execute(
            "UPDATE blood_donations SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        let donation = tx.query_row(
            &format!("SELECT {DONATION_COLUMNS} FROM blood_donations d WHERE d.id = ?1"),
            params![id.to_string()],
            row_to_donation,
        )?;

        // Dates are stored as YYYY-MM-DD, so MAX orders them correctly.
        tx.execute(
            "UPDATE profiles
             SET last_donation_date = (
                     SELECT MAX(donation_date) FROM blood_donations
                     WHERE user_id = ?1 AND status = ?2
                 ),
                 updated_at = ?3
             WHERE id = ?1",
            params![
                donation.user_id.to_string(),
                DonationStatus::Approved.as_str(),
                row::ts(&row::now()),
            ],
        )?;

        tx.commit()?;
        Ok(donation)
    }
}

fn row_to_donation(r: &rusqlite::Row<'_>) -> rusqlite::Result<BloodDonation> {
    Ok(BloodDonation {
        id: row::uuid(r, 0)?,
        created_at: row::timestamp(r, 1)?,
        user_id: row::user_id(r, 2)?,
        blood_type: row::parsed::<BloodType>(r, 3)?,
        donation_date: row::date(r, 4)?,
        donation_center: r.get(5)?,
        units: r.get(6)?,
        status: row::parsed::<DonationStatus>(r, 7)?,
        notes: r.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfileFields;
    use chrono::NaiveDate;

    fn setup() -> (Database, UserId) {
        let db = Database::open_in_memory().unwrap();
        let account = db.create_account("jane@example.org", "hash").unwrap();
        let fields = ProfileFields {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            ..Default::default()
        };
        db.create_profile(account.id, &fields, false).unwrap();
        (db, account.id)
    }

    fn new_donation(user_id: UserId, day: u32) -> NewDonation {
        NewDonation {
            user_id,
            blood_type: BloodType::APositive,
            donation_date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            donation_center: "Central Blood Bank".into(),
            units: 1,
            notes: None,
        }
    }

    #[test]
    fn insert_starts_pending() {
        let (db, user) = setup();
        let donation = db.insert_donation(&new_donation(user, 1)).unwrap();
        assert_eq!(donation.status, DonationStatus::Pending);
        assert_eq!(db.get_donation(donation.id).unwrap(), donation);
    }

    #[test]
    fn insert_requires_profile() {
        let db = Database::open_in_memory().unwrap();
        let err = db.insert_donation(&new_donation(UserId::new(), 1)).unwrap_err();
        assert!(matches!(err, StoreError::MissingReference("profile")));
    }

    #[test]
    fn zero_units_rejected_by_schema() {
        let (db, user) = setup();
        let mut donation = new_donation(user, 1);
        donation.units = 0;
        assert!(db.insert_donation(&donation).is_err());
    }

    #[test]
    fn user_history_newest_first() {
        let (db, user) = setup();
        db.insert_donation(&new_donation(user, 1)).unwrap();
        db.insert_donation(&new_donation(user, 20)).unwrap();

        let history = db.list_donations_for_user(user).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].donation_date.to_string(), "2024-05-20");
    }

    #[test]
    fn status_filter_and_donor_name() {
        let (mut db, user) = setup();
        let a = db.insert_donation(&new_donation(user, 1)).unwrap();
        db.insert_donation(&new_donation(user, 2)).unwrap();
        db.set_donation_status(a.id, DonationStatus::Rejected).unwrap();

        let all = db.list_donations(None).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|d| d.donor_name == "Jane Doe"));

        let pending = db.list_donations(Some(DonationStatus::Pending)).unwrap();
        assert_eq!(pending.len(), 1);
        let rejected = db.list_donations(Some(DonationStatus::Rejected)).unwrap();
        assert_eq!(rejected[0].donation.id, a.id);
    }

    #[test]
    fn approval_updates_last_donation_date() {
        let (mut db, user) = setup();
        let donation = db.insert_donation(&new_donation(user, 12)).unwrap();

        let approved = db
            .set_donation_status(donation.id, DonationStatus::Approved)
            .unwrap();
        assert_eq!(approved.status, DonationStatus::Approved);
        assert_eq!(
            db.get_profile(user).unwrap().last_donation_date,
            Some(donation.donation_date)
        );
    }

    #[test]
    fn last_donation_date_follows_latest_approved() {
        let (mut db, user) = setup();
        let early = db.insert_donation(&new_donation(user, 3)).unwrap();
        let late = db.insert_donation(&new_donation(user, 20)).unwrap();

        db.set_donation_status(late.id, DonationStatus::Approved).unwrap();
        db.set_donation_status(early.id, DonationStatus::Approved).unwrap();
        assert_eq!(
            db.get_profile(user).unwrap().last_donation_date,
            Some(late.donation_date)
        );

        db.set_donation_status(late.id, DonationStatus::Rejected).unwrap();
        assert_eq!(
            db.get_profile(user).unwrap().last_donation_date,
            Some(early.donation_date)
        );

        db.set_donation_status(early.id, DonationStatus::Pending).unwrap();
        assert_eq!(db.get_profile(user).unwrap().last_donation_date, None);
    }

    #[test]
    fn unknown_donation_status_update() {
        let (mut db, _) = setup();
        assert!(matches!(
            db.set_donation_status(Uuid::new_v4(), DonationStatus::Approved),
            Err(StoreError::NotFound)
        ));
    }
}
