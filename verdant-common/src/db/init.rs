//! Database initialization
//!
//! Opens (creating if needed) the SQLite database and applies the schema.
//! Schema creation is idempotent and runs on every startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Busy timeout applied to every pooled connection
const BUSY_TIMEOUT_MS: u64 = 5000;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // PRAGMAs set here apply to every pooled connection
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    init_schema(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with the full schema
///
/// One connection only: every `:memory:` connection is its own database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables and indexes (idempotent)
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    create_master_plants_table(pool).await?;
    create_gardens_table(pool).await?;
    create_user_gardens_table(pool).await?;
    info!("Database schema ready (master_plants, gardens, user_gardens)");
    Ok(())
}

/// Canonical species knowledge base
///
/// The UNIQUE constraint on scientific_name is what makes concurrent
/// create-or-fetch safe across processes.
async fn create_master_plants_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS master_plants (
            id TEXT PRIMARY KEY,
            scientific_name TEXT NOT NULL UNIQUE,
            common_name TEXT,
            all_names TEXT,
            botanical_specs TEXT NOT NULL,
            times_identified INTEGER NOT NULL DEFAULT 1 CHECK (times_identified >= 1),
            original_contributor_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_gardens_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS gardens (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_gardens_user_id ON gardens(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Garden membership rows
///
/// garden_id is not a foreign key: gardens may be provisioned by another
/// service and the save path accepts any client-supplied garden id.
async fn create_user_gardens_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_gardens (
            id TEXT PRIMARY KEY,
            garden_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            master_plant_id TEXT NOT NULL REFERENCES master_plants(id),
            nickname TEXT,
            health_status TEXT,
            is_in_pot INTEGER NOT NULL,
            image_url TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_user_gardens_garden_id ON user_gardens(garden_id)")
        .execute(pool)
        .await?;

    Ok(())
}
