//! CRUD operations for [`EmergencyRequest`] records.

use rusqlite::params;
use rusqlite::types::Type;
use uuid::Uuid;

use bloodlink_shared::validation::UnitsNeeded;
use bloodlink_shared::{BloodType, RequestStatus, UrgencyLevel, UserId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{EmergencyRequest, NewEmergencyRequest, RequestWithRequester};
use crate::row;

const REQUEST_COLUMNS: &str = "r.id, r.created_at, r.user_id, r.blood_type, r.units_needed,
     r.hospital, r.patient_name, r.contact_number, r.urgency_level, r.status, r.notes";

impl Database {
    /// File an emergency request. Status is always `open` on insert.
    pub fn insert_emergency_request(&self, new: &NewEmergencyRequest) -> Result<EmergencyRequest> {
        let request = EmergencyRequest {
            id: Uuid::new_v4(),
            created_at: row::now(),
            user_id: new.user_id,
            blood_type: new.blood_type,
            units_needed: new.units_needed,
            hospital: new.hospital.clone(),
            patient_name: new.patient_name.clone(),
            contact_number: new.contact_number.clone(),
            urgency_level: new.urgency_level,
            status: RequestStatus::Open,
            notes: new.notes.clone(),
        };

        self.conn()
            .execute(
                "INSERT INTO emergency_requests (id, created_at, user_id, blood_type, units_needed,
                                                 hospital, patient_name, contact_number,
                                                 urgency_level, status, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    request.id.to_string(),
                    row::ts(&request.created_at),
                    request.user_id.to_string(),
                    request.blood_type.as_str(),
                    request.units_needed.get(),
                    request.hospital,
                    request.patient_name,
                    request.contact_number,
                    request.urgency_level.as_str(),
                    request.status.as_str(),
                    request.notes,
                ],
            )
            .map_err(|e| StoreError::from_insert(e, "Emergency request", "profile"))?;

        tracing::debug!(
            id = %request.id,
            urgency = %request.urgency_level,
            blood_type = %request.blood_type,
            "emergency request stored"
        );

        Ok(request)
    }

    pub fn get_emergency_request(&self, id: Uuid) -> Result<EmergencyRequest> {
        self.conn()
            .query_row(
                &format!("SELECT {REQUEST_COLUMNS} FROM emergency_requests r WHERE r.id = ?1"),
                params![id.to_string()],
                row_to_request,
            )
            .map_err(StoreError::from_query)
    }

    /// Requests filed by one user, newest first.
    pub fn list_emergency_requests_for_user(&self, user_id: UserId) -> Result<Vec<EmergencyRequest>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {REQUEST_COLUMNS}
             FROM emergency_requests r
             WHERE r.user_id = ?1
             ORDER BY r.created_at DESC"
        ))?;
        let rows = stmt.query_map(params![user_id.to_string()], row_to_request)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Every request with its requester's name, optionally filtered by
    /// status. Most urgent first, then newest.
    pub fn list_emergency_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<RequestWithRequester>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {REQUEST_COLUMNS}, p.first_name || ' ' || p.last_name
             FROM emergency_requests r
             JOIN profiles p ON p.id = r.user_id
             WHERE ?1 IS NULL OR r.status = ?1
             ORDER BY CASE r.urgency_level WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END,
                      r.created_at DESC"
        ))?;
        let rows = stmt.query_map(params![status.map(|s| s.as_str())], |r| {
            Ok(RequestWithRequester {
                request: row_to_request(r)?,
                requester_name: r.get(11)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    pub fn set_emergency_request_status(
        &self,
        id: Uuid,
        status: RequestStatus,
    ) -> Result<EmergencyRequest> {
        let affected = self.conn().execute(
            "UPDATE emergency_requests SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_emergency_request(id)
    }
}

fn row_to_request(r: &rusqlite::Row<'_>) -> rusqlite::Result<EmergencyRequest> {
    let units: i64 = r.get(4)?;
    let units_needed = UnitsNeeded::try_from(units)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Integer, Box::new(e)))?;

    Ok(EmergencyRequest {
        id: row::uuid(r, 0)?,
        created_at: row::timestamp(r, 1)?,
        user_id: row::user_id(r, 2)?,
        blood_type: row::parsed::<BloodType>(r, 3)?,
        units_needed,
        hospital: r.get(5)?,
        patient_name: r.get(6)?,
        contact_number: r.get(7)?,
        urgency_level: row::parsed::<UrgencyLevel>(r, 8)?,
        status: row::parsed::<RequestStatus>(r, 9)?,
        notes: r.get(10)?,
    })
}
