//! Database initialization and versioned migrations.

use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// A reversible schema change.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: &'static str,
    pub description: &'static str,
    up: &'static str,
    down: &'static str,
}

/// All known migrations, oldest first.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: "0001",
    description: "add user table",
    up: include_str!("sql/0001_add_user.up.sql"),
    down: include_str!("sql/0001_add_user.down.sql"),
}];

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
    #[error("Applied migration {0} is not known to this build")]
    UnknownVersion(String),
    #[error("Failed to create database directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Open the SQLite database at `db_path`, configure pragmas, and apply pending
/// migrations.
pub async fn init_db(db_path: &str, max_connections: u32) -> Result<SqlitePool, MigrationError> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .after_connect(|conn, _meta| Box::pin(async move { configure_pragmas_conn(conn).await }))
        .connect(&format!("sqlite:{}?mode=rwc", db_path))
        .await?;

    run_migrations(&pool).await?;

    info!("Database initialized successfully at {}", db_path);
    Ok(pool)
}

/// Apply every migration not yet recorded in `schema_migrations`.
///
/// Each migration runs in its own transaction. Returns how many were applied.
pub async fn run_migrations(pool: &SqlitePool) -> Result<usize, MigrationError> {
    ensure_tracking_table(pool).await?;
    let applied = applied_versions(pool).await?;

    let mut count = 0;
    for migration in MIGRATIONS {
        if applied.iter().any(|v| v == migration.version) {
            continue;
        }
        info!(
            version = migration.version,
            "Applying migration: {}", migration.description
        );

        let mut tx = pool.begin().await?;
        execute_script(&mut tx, migration.up).await?;
        sqlx::query(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?, strftime('%s', 'now'))",
        )
        .bind(migration.version)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        count += 1;
    }

    info!(applied = count, "Migrations completed successfully");
    Ok(count)
}

/// Undo the most recently applied migration.
///
/// Returns the reverted version, or `None` if nothing was applied.
pub async fn revert_last_migration(
    pool: &SqlitePool,
) -> Result<Option<&'static str>, MigrationError> {
    ensure_tracking_table(pool).await?;
    let Some(latest) = applied_versions(pool).await?.pop() else {
        return Ok(None);
    };
    let migration = MIGRATIONS
        .iter()
        .find(|m| m.version == latest)
        .ok_or(MigrationError::UnknownVersion(latest))?;

    info!(
        version = migration.version,
        "Reverting migration: {}", migration.description
    );

    let mut tx = pool.begin().await?;
    execute_script(&mut tx, migration.down).await?;
    sqlx::query("DELETE FROM schema_migrations WHERE version = ?")
        .bind(migration.version)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(Some(migration.version))
}

/// Versions recorded in `schema_migrations`, oldest first.
pub async fn applied_versions(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT version FROM schema_migrations ORDER BY version ASC")
        .fetch_all(pool)
        .await
}

async fn ensure_tracking_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT NOT NULL PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn execute_script(
    tx: &mut Transaction<'static, Sqlite>,
    script: &str,
) -> Result<(), sqlx::Error> {
    for statement in script.split(';') {
        let trimmed = statement.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(&mut **tx).await?;
        }
    }
    Ok(())
}

/// Per-connection pragmas. `busy_timeout` lets concurrent writers queue on the
/// database lock instead of failing with `SQLITE_BUSY`.
async fn configure_pragmas_conn(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    use sqlx::Row;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&mut *conn)
        .await?;

    // journal_mode returns the actual mode set; must use fetch to get result
    let row = sqlx::query("PRAGMA journal_mode = WAL")
        .fetch_one(&mut *conn)
        .await?;
    let journal_mode: String = row.get(0);

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&mut *conn)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&mut *conn)
        .await?;

    debug!(journal_mode = %journal_mode, "SQLite connection configured");
    Ok(())
}
