//! SQL schema for the Ruty SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,   -- lower-cased
    password_hash TEXT NOT NULL,          -- argon2 PHC string
    display_name  TEXT,
    created_at    TEXT NOT NULL
);

-- At most one character per user.
CREATE TABLE IF NOT EXISTS characters (
    user_id     TEXT PRIMARY KEY REFERENCES users(user_id),
    kind        TEXT NOT NULL,            -- 'cat' | 'dog' | 'rabbit' | 'fox'
    custom_name TEXT,
    level       INTEGER NOT NULL,
    energy      INTEGER NOT NULL CHECK (energy BETWEEN 0 AND 100),
    happiness   INTEGER NOT NULL CHECK (happiness BETWEEN 0 AND 100),
    total_xp    INTEGER NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS achievements (
    achievement_id TEXT PRIMARY KEY,
    user_id        TEXT NOT NULL REFERENCES users(user_id),
    kind           TEXT NOT NULL,
    unlocked       INTEGER NOT NULL DEFAULT 0,
    unlocked_at    TEXT,
    UNIQUE (user_id, kind)
);

-- Habits are soft-deleted; no DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS habits (
    habit_id      TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL REFERENCES users(user_id),
    title         TEXT NOT NULL,
    description   TEXT,
    recurrence    TEXT NOT NULL,          -- 'daily' | 'monthly' | 'once'
    difficulty    INTEGER NOT NULL CHECK (difficulty BETWEEN 1 AND 5),
    reminder_time TEXT,                   -- HH:MM:SS
    color         TEXT,
    is_deleted    INTEGER NOT NULL DEFAULT 0,
    updated_at    TEXT NOT NULL           -- fixed-width RFC 3339 UTC
);

-- Schedule detail rows; which table is populated follows `recurrence`.
CREATE TABLE IF NOT EXISTS habit_weekdays (
    habit_id TEXT NOT NULL REFERENCES habits(habit_id),
    weekday  INTEGER NOT NULL CHECK (weekday BETWEEN 0 AND 6),   -- 0 = Sunday
    PRIMARY KEY (habit_id, weekday)
);

CREATE TABLE IF NOT EXISTS habit_month_days (
    habit_id  TEXT NOT NULL REFERENCES habits(habit_id),
    month_day INTEGER NOT NULL CHECK (month_day BETWEEN 1 AND 31),
    PRIMARY KEY (habit_id, month_day)
);

CREATE TABLE IF NOT EXISTS habit_one_time (
    habit_id TEXT PRIMARY KEY REFERENCES habits(habit_id),
    date     TEXT NOT NULL                -- YYYY-MM-DD
);

-- One completion record per habit and calendar date.
CREATE TABLE IF NOT EXISTS habit_instances (
    instance_id TEXT PRIMARY KEY,
    habit_id    TEXT NOT NULL REFERENCES habits(habit_id),
    date        TEXT NOT NULL,            -- YYYY-MM-DD
    completed   INTEGER NOT NULL,
    xp_awarded  INTEGER NOT NULL DEFAULT 0,
    is_deleted  INTEGER NOT NULL DEFAULT 0,
    updated_at  TEXT NOT NULL,
    UNIQUE (habit_id, date)
);

CREATE INDEX IF NOT EXISTS habits_user_idx       ON habits(user_id, updated_at);
CREATE INDEX IF NOT EXISTS instances_updated_idx ON habit_instances(updated_at);

PRAGMA user_version = 1;
";
