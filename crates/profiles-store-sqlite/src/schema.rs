//! SQL schema for the profiles SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS accounts (
    account_id     TEXT PRIMARY KEY,
    email          TEXT NOT NULL UNIQUE COLLATE NOCASE,
    name           TEXT NOT NULL,
    password_hash  TEXT NOT NULL,   -- argon2 PHC string or '!'-prefixed marker
    is_active      INTEGER NOT NULL DEFAULT 1,
    is_staff       INTEGER NOT NULL DEFAULT 0,
    is_superuser   INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

CREATE TABLE IF NOT EXISTS feed_items (
    item_id      TEXT PRIMARY KEY,
    owner_id     TEXT NOT NULL REFERENCES accounts(account_id) ON DELETE CASCADE,
    status_text  TEXT NOT NULL,
    created_on   TEXT NOT NULL      -- set once on insert
);

-- One login token per account.
CREATE TABLE IF NOT EXISTS auth_tokens (
    key         TEXT PRIMARY KEY,
    account_id  TEXT NOT NULL UNIQUE REFERENCES accounts(account_id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS feed_items_owner_idx ON feed_items(owner_id);

PRAGMA user_version = 1;
";
