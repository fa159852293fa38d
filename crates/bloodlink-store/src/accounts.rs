//! CRUD operations for [`Account`] records.

use rusqlite::params;

use bloodlink_shared::UserId;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Account;
use crate::row;

impl Database {
    /// Create an account. The email must already be normalized.
    pub fn create_account(&self, email: &str, password_hash: &str) -> Result<Account> {
        let account = Account {
            id: UserId::new(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: row::now(),
        };

        self.conn()
            .execute(
                "INSERT INTO accounts (id, email, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    account.id.to_string(),
                    account.email,
                    account.password_hash,
                    row::ts(&account.created_at),
                ],
            )
            .map_err(|e| StoreError::from_insert(e, "Account", "account"))?;

        Ok(account)
    }

    pub fn get_account(&self, id: UserId) -> Result<Account> {
        self.conn()
            .query_row(
                "SELECT id, email, password_hash, created_at FROM accounts WHERE id = ?1",
                params![id.to_string()],
                row_to_account,
            )
            .map_err(StoreError::from_query)
    }

    pub fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        match self.conn().query_row(
            "SELECT id, email, password_hash, created_at FROM accounts WHERE email = ?1",
            params![email],
            row_to_account,
        ) {
            Ok(account) => Ok(Some(account)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }
}

fn row_to_account(r: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row::user_id(r, 0)?,
        email: r.get(1)?,
        password_hash: r.get(2)?,
        created_at: row::timestamp(r, 3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_find() {
        let db = Database::open_in_memory().unwrap();
        let account = db.create_account("jane@example.org", "hash").unwrap();

        let found = db.find_account_by_email("jane@example.org").unwrap().unwrap();
        assert_eq!(found, account);
        assert_eq!(db.get_account(account.id).unwrap().email, "jane@example.org");
        assert!(db.find_account_by_email("nobody@example.org").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.create_account("jane@example.org", "hash").unwrap();
        let err = db.create_account("jane@example.org", "other").unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("Account")));
    }
}
