//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: Initial schema
    r#"
    -- ============================================
    -- Canonical entities (written by other subsystems,
    -- read-only for the analytics layer)
    -- ============================================

    CREATE TABLE IF NOT EXISTS users (
        id                TEXT PRIMARY KEY,
        email             TEXT NOT NULL UNIQUE,
        full_name         TEXT,
        subscription_tier TEXT NOT NULL DEFAULT 'free'
                          CHECK (subscription_tier IN ('free', 'premium', 'pro')),
        is_admin          INTEGER NOT NULL DEFAULT 0,
        settings          JSON NOT NULL DEFAULT '{}',
        created_at        DATETIME NOT NULL,
        last_login        DATETIME
    );

    CREATE TABLE IF NOT EXISTS meals (
        id          TEXT PRIMARY KEY,
        user_id     TEXT NOT NULL REFERENCES users(id),
        name        TEXT NOT NULL,

        -- Nutrients; NULL means "not analyzed", not an error
        calories    REAL CHECK (calories IS NULL OR calories >= 0),
        protein     REAL CHECK (protein IS NULL OR protein >= 0),
        carbs       REAL CHECK (carbs IS NULL OR carbs >= 0),
        fat         REAL CHECK (fat IS NULL OR fat >= 0),

        created_at  DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS ai_requests (
        id          TEXT PRIMARY KEY,
        user_id     TEXT NOT NULL REFERENCES users(id),
        provider    TEXT NOT NULL CHECK (provider IN ('gemini', 'openai')),
        confidence  REAL CHECK (confidence IS NULL OR (confidence >= 0.0 AND confidence <= 1.0)),
        created_at  DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS recipe_favorites (
        user_id     TEXT NOT NULL REFERENCES users(id),
        recipe_id   TEXT NOT NULL,
        created_at  DATETIME NOT NULL,

        PRIMARY KEY (user_id, recipe_id)
    );

    -- ============================================
    -- Indexes (the analytics layer filters by user and time range)
    -- ============================================

    CREATE INDEX IF NOT EXISTS idx_meals_user_created ON meals(user_id, created_at);
    CREATE INDEX IF NOT EXISTS idx_ai_requests_user_created ON ai_requests(user_id, created_at);
    CREATE INDEX IF NOT EXISTS idx_ai_requests_created ON ai_requests(created_at);
    CREATE INDEX IF NOT EXISTS idx_users_created ON users(created_at DESC);
    CREATE INDEX IF NOT EXISTS idx_users_last_login ON users(last_login);
    CREATE INDEX IF NOT EXISTS idx_users_tier ON users(subscription_tier);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
