//! v001 -- Initial schema creation.
//!
//! Creates the four core tables: `accounts`, `profiles`, `blood_donations`
//! and `emergency_requests`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Accounts (sign-in identities)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS accounts (
    id            TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    email         TEXT NOT NULL UNIQUE,        -- normalized lowercase
    password_hash TEXT NOT NULL,               -- argon2 PHC string
    created_at    TEXT NOT NULL                -- RFC-3339
);

-- ----------------------------------------------------------------
-- Profiles (one per account, created on profile completion)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS profiles (
    id                 TEXT PRIMARY KEY NOT NULL,  -- = accounts(id)
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL,
    first_name         TEXT NOT NULL,
    last_name          TEXT NOT NULL,
    blood_type         TEXT,                       -- 'A+' .. 'O-'
    phone              TEXT,
    address            TEXT,
    city               TEXT,
    state              TEXT,
    is_admin           INTEGER NOT NULL DEFAULT 0, -- boolean 0/1
    last_donation_date TEXT,                       -- YYYY-MM-DD

    FOREIGN KEY (id) REFERENCES accounts(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Blood donations
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS blood_donations (
    id              TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    created_at      TEXT NOT NULL,
    user_id         TEXT NOT NULL,                 -- FK -> profiles(id)
    blood_type      TEXT NOT NULL,
    donation_date   TEXT NOT NULL,                 -- YYYY-MM-DD
    donation_center TEXT NOT NULL,
    units           INTEGER NOT NULL CHECK (units > 0),
    status          TEXT NOT NULL DEFAULT 'pending',
    notes           TEXT,

    FOREIGN KEY (user_id) REFERENCES profiles(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_donations_user ON blood_donations(user_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_donations_status ON blood_donations(status);

-- ----------------------------------------------------------------
-- Emergency requests
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS emergency_requests (
    id             TEXT PRIMARY KEY NOT NULL,      -- UUID v4
    created_at     TEXT NOT NULL,
    user_id        TEXT NOT NULL,                  -- FK -> profiles(id)
    blood_type     TEXT NOT NULL,
    units_needed   INTEGER NOT NULL CHECK (units_needed BETWEEN 1 AND 20),
    hospital       TEXT NOT NULL,
    patient_name   TEXT NOT NULL,
    contact_number TEXT NOT NULL,
    urgency_level  TEXT NOT NULL,                  -- high | medium | low
    status         TEXT NOT NULL DEFAULT 'open',
    notes          TEXT,

    FOREIGN KEY (user_id) REFERENCES profiles(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_requests_user ON emergency_requests(user_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_requests_status ON emergency_requests(status);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
