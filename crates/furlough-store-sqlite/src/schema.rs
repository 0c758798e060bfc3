//! SQL schema for the Furlough SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS accounts (
    account_id     TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    name_folded    TEXT NOT NULL,   -- Unicode-lowercased name for search
    email          TEXT NOT NULL UNIQUE,
    password_hash  TEXT NOT NULL,
    role           TEXT NOT NULL DEFAULT 'user'
                   CHECK (role IN ('admin', 'verifier', 'user')),
    verified       INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL    -- fixed-width RFC 3339 UTC; sortable
);

CREATE TABLE IF NOT EXISTS permissions (
    permission_id  TEXT PRIMARY KEY,
    account_id     TEXT NOT NULL REFERENCES accounts(account_id) ON DELETE CASCADE,
    title          TEXT NOT NULL,
    reason         TEXT NOT NULL,
    start_date     TEXT NOT NULL,
    end_date       TEXT NOT NULL,
    comment        TEXT,
    status         TEXT NOT NULL DEFAULT 'pending'
                   CHECK (status IN ('pending', 'approved', 'rejected', 'revised', 'cancelled')),
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS accounts_created_idx    ON accounts(created_at);
CREATE INDEX IF NOT EXISTS permissions_account_idx ON permissions(account_id);
CREATE INDEX IF NOT EXISTS permissions_status_idx  ON permissions(status);
CREATE INDEX IF NOT EXISTS permissions_created_idx ON permissions(created_at);

PRAGMA user_version = 1;
";
