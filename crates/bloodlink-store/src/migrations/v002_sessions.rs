use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id         TEXT PRIMARY KEY NOT NULL,   -- UUID v4, embedded in the signed token
    account_id TEXT NOT NULL,               -- FK -> accounts(id)
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,

    FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sessions_account ON sessions(account_id);

CREATE TABLE IF NOT EXISTS password_resets (
    token_digest TEXT PRIMARY KEY NOT NULL, -- BLAKE3 hex of the one-time token
    account_id   TEXT NOT NULL,             -- FK -> accounts(id)
    expires_at   TEXT NOT NULL,
    used         INTEGER NOT NULL DEFAULT 0,

    FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE
);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
