//! Aggregate counts backing the dashboards.

use rusqlite::params;
use serde::Serialize;

use bloodlink_shared::{DonationStatus, RequestStatus, UserId};

use crate::database::Database;
use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct UserSummary {
    pub donation_count: u64,
    pub approved_units: u64,
    pub pending_donations: u64,
    pub open_requests: u64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RequestCounts {
    pub open: u64,
    pub fulfilled: u64,
    pub closed: u64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct AdminSummary {
    pub total_users: u64,
    pub admins: u64,
    pub donations: StatusCounts,
    pub requests: RequestCounts,
}

impl Database {
    pub fn user_summary(&self, user_id: UserId) -> Result<UserSummary> {
        let id = user_id.to_string();
        let (donation_count, approved_units, pending_donations): (i64, i64, i64) =
            self.conn().query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(CASE WHEN status = ?2 THEN units ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN status = ?3 THEN 1 ELSE 0 END), 0)
                 FROM blood_donations WHERE user_id = ?1",
                params![
                    id,
                    DonationStatus::Approved.as_str(),
                    DonationStatus::Pending.as_str()
                ],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )?;

        let open_requests: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM emergency_requests WHERE user_id = ?1 AND status = ?2",
            params![id, RequestStatus::Open.as_str()],
            |r| r.get(0),
        )?;

        Ok(UserSummary {
            donation_count: donation_count as u64,
            approved_units: approved_units as u64,
            pending_donations: pending_donations as u64,
            open_requests: open_requests as u64,
        })
    }

    pub fn admin_summary(&self) -> Result<AdminSummary> {
        let (total_users, admins): (i64, i64) = self.conn().query_row(
            "SELECT COUNT(*), COALESCE(SUM(is_admin), 0) FROM profiles",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;

        let mut summary = AdminSummary {
            total_users: total_users as u64,
            admins: admins as u64,
            ..Default::default()
        };

        let mut stmt = self
            .conn()
            .prepare("SELECT status, COUNT(*) FROM blood_donations GROUP BY status")?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?;
        for row in rows {
            let (status, n) = row?;
            match status.parse::<DonationStatus>() {
                Ok(DonationStatus::Pending) => summary.donations.pending = n as u64,
                Ok(DonationStatus::Approved) => summary.donations.approved = n as u64,
                Ok(DonationStatus::Rejected) => summary.donations.rejected = n as u64,
                Err(_) => tracing::warn!(%status, "unknown donation status in store"),
            }
        }

        let mut stmt = self
            .conn()
            .prepare("SELECT status, COUNT(*) FROM emergency_requests GROUP BY status")?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?;
        for row in rows {
            let (status, n) = row?;
            match status.parse::<RequestStatus>() {
                Ok(RequestStatus::Open) => summary.requests.open = n as u64,
                Ok(RequestStatus::Fulfilled) => summary.requests.fulfilled = n as u64,
                Ok(RequestStatus::Closed) => summary.requests.closed = n as u64,
                Err(_) => tracing::warn!(%status, "unknown request status in store"),
            }
        }

        Ok(summary)
    }
}
