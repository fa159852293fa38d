//! Session rows and one-time password reset tokens.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use bloodlink_shared::UserId;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::SessionRecord;
use crate::row;

impl Database {
    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    pub fn create_session(
        &self,
        account_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<SessionRecord> {
        let session = SessionRecord {
            id: Uuid::new_v4(),
            account_id,
            created_at: row::now(),
            expires_at,
        };

        self.conn()
            .execute(
                "INSERT INTO sessions (id, account_id, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    session.id.to_string(),
                    session.account_id.to_string(),
                    row::ts(&session.created_at),
                    row::ts(&session.expires_at),
                ],
            )
            .map_err(|e| StoreError::from_insert(e, "Session", "account"))?;

        Ok(session)
    }

    /// Fetch a session that has not expired as of `now`.
    pub fn get_live_session(&self, id: Uuid, now: DateTime<Utc>) -> Result<SessionRecord> {
        self.conn()
            .query_row(
                "SELECT id, account_id, created_at, expires_at
                 FROM sessions
                 WHERE id = ?1 AND expires_at > ?2",
                params![id.to_string(), row::ts(&now)],
                |r| {
                    Ok(SessionRecord {
                        id: row::uuid(r, 0)?,
                        account_id: row::user_id(r, 1)?,
                        created_at: row::timestamp(r, 2)?,
                        expires_at: row::timestamp(r, 3)?,
                    })
                },
            )
            .map_err(StoreError::from_query)
    }

    pub fn delete_session(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM sessions WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Password resets
    // ------------------------------------------------------------------

    pub fn create_password_reset(
        &self,
        token_digest: &str,
        account_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO password_resets (token_digest, account_id, expires_at)
                 VALUES (?1, ?2, ?3)",
                params![token_digest, account_id.to_string(), row::ts(&expires_at)],
            )
            .map_err(|e| StoreError::from_insert(e, "Password reset", "account"))?;
        Ok(())
    }

    /// Spend a reset token, store the new password hash and revoke every
    /// session of the account, all in one transaction. Returns the account
    /// and the number of revoked sessions.
    ///
    /// Unknown, used and expired tokens all come back as
    /// [`StoreError::NotFound`] and change nothing.
    pub fn complete_password_reset(
        &mut self,
        token_digest: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(UserId, usize)> {
        let tx = self.conn_mut().transaction()?;

        let account: Option<String> = tx
            .query_row(
                "SELECT account_id FROM password_resets
                 WHERE token_digest = ?1 AND used = 0 AND expires_at > ?2",
                params![token_digest, row::ts(&now)],
                |r| r.get(0),
            )
            .optional()?;

        let Some(account) = account else {
            return Err(StoreError::NotFound);
        };

        let account_id = account.parse::<Uuid>().map(UserId).map_err(|e| {
            StoreError::Sqlite(rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(e),
            ))
        })?;

        tx.execute(
            "UPDATE password_resets SET used = 1 WHERE token_digest = ?1",
            params![token_digest],
        )?;
        let updated = tx.execute(
            "UPDATE accounts SET password_hash = ?1 WHERE id = ?2",
            params![password_hash, account],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound);
        }
        let revoked = tx.execute(
            "DELETE FROM sessions WHERE account_id = ?1",
            params![account],
        )?;

        tx.commit()?;
        Ok((account_id, revoked))
    }

    /// Delete expired sessions and expired or used reset tokens.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let now = row::ts(&now);
        let sessions = self
            .conn()
            .execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?;
        let resets = self.conn().execute(
            "DELETE FROM password_resets WHERE expires_at <= ?1 OR used = 1",
            params![now],
        )?;
        Ok(sessions + resets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn db_with_account() -> (Database, UserId) {
        let db = Database::open_in_memory().unwrap();
        let account = db.create_account("jane@example.org", "hash").unwrap();
        (db, account.id)
    }

    #[test]
    fn live_session_lookup() {
        let (db, account) = db_with_account();
        let session = db
            .create_session(account, Utc::now() + Duration::hours(1))
            .unwrap();

        let found = db.get_live_session(session.id, Utc::now()).unwrap();
        assert_eq!(found.account_id, account);

        let later = Utc::now() + Duration::hours(2);
        assert!(matches!(
            db.get_live_session(session.id, later),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn delete_revokes() {
        let (db, account) = db_with_account();
        let a = db.create_session(account, Utc::now() + Duration::hours(1)).unwrap();
        let b = db.create_session(account, Utc::now() + Duration::hours(1)).unwrap();

        assert!(db.delete_session(a.id).unwrap());
        assert!(!db.delete_session(a.id).unwrap());
        assert!(db.get_live_session(b.id, Utc::now()).is_ok());
    }

    #[test]
    fn session_for_unknown_account_rejected() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .create_session(UserId::new(), Utc::now() + Duration::hours(1))
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingReference("account")));
    }

    #[test]
    fn reset_token_is_single_use() {
        let (mut db, account) = db_with_account();
        db.create_session(account, Utc::now() + Duration::hours(1)).unwrap();
        db.create_password_reset("digest", account, Utc::now() + Duration::minutes(30))
            .unwrap();

        let (id, revoked) = db
            .complete_password_reset("digest", "new-hash", Utc::now())
            .unwrap();
        assert_eq!(id, account);
        assert_eq!(revoked, 1);
        assert_eq!(db.get_account(account).unwrap().password_hash, "new-hash");

        assert!(matches!(
            db.complete_password_reset("digest", "other-hash", Utc::now()),
            Err(StoreError::NotFound)
        ));
        assert_eq!(db.get_account(account).unwrap().password_hash, "new-hash");
    }

    #[test]
    fn expired_reset_token_rejected() {
        let (mut db, account) = db_with_account();
        db.create_password_reset("digest", account, Utc::now() - Duration::minutes(1))
            .unwrap();
        assert!(db
            .complete_password_reset("digest", "new-hash", Utc::now())
            .is_err());
        assert_eq!(db.get_account(account).unwrap().password_hash, "hash");
    }

    #[test]
    fn failed_reset_keeps_token_unspent() {
        let (mut db, account) = db_with_account();
        let session = db
            .create_session(account, Utc::now() + Duration::hours(1))
            .unwrap();
        db.create_password_reset("digest", account, Utc::now() + Duration::minutes(30))
            .unwrap();

        // Make the password write fail inside the transaction.
        db.conn()
            .execute_batch(
                "CREATE TRIGGER reject_hash BEFORE UPDATE OF password_hash ON accounts
                 BEGIN SELECT RAISE(ABORT, 'locked'); END;",
            )
            .unwrap();
        assert!(db
            .complete_password_reset("digest", "new-hash", Utc::now())
            .is_err());
        assert!(db.get_live_session(session.id, Utc::now()).is_ok());

        db.conn().execute_batch("DROP TRIGGER reject_hash;").unwrap();
        let (id, revoked) = db
            .complete_password_reset("digest", "new-hash", Utc::now())
            .unwrap();
        assert_eq!(id, account);
        assert_eq!(revoked, 1);
    }

    #[test]
    fn purge_removes_expired() {
        let (db, account) = db_with_account();
        db.create_session(account, Utc::now() - Duration::minutes(1)).unwrap();
        let live = db.create_session(account, Utc::now() + Duration::hours(1)).unwrap();
        db.create_password_reset("old", account, Utc::now() - Duration::minutes(1))
            .unwrap();

        assert_eq!(db.purge_expired(Utc::now()).unwrap(), 2);
        assert!(db.get_live_session(live.id, Utc::now()).is_ok());
    }
}
