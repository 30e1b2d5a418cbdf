//! Local SQLite storage for saved connections.
//!
//! # Data Directory Locations
//!
//! - **macOS**: `~/Library/Application Support/dev.coral.Coral`
//! - **Windows**: `%APPDATA%\coral\Coral`
//! - **Linux**: `~/.local/share/coral`
//! - **Debug builds**: `./coral_data` in current directory

use crate::error::CoralError;
use crate::models::ConnectionConfig;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::PathBuf;
use uuid::Uuid;

/// Persists connection records.
///
/// `save` returns the full, freshly loaded list so callers can install the
/// persisted snapshot wholesale instead of patching their own copy.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Persist a record and return the updated ordered list.
    async fn save(&self, config: ConnectionConfig) -> Result<Vec<ConnectionConfig>, CoralError>;

    /// Load all saved connections in storage order.
    async fn load_all(&self) -> Result<Vec<ConnectionConfig>, CoralError>;

    /// Delete a record by id.
    async fn delete(&self, id: Uuid) -> Result<(), CoralError>;
}

/// Get the default data directory for the application.
pub fn default_data_dir() -> PathBuf {
    #[cfg(debug_assertions)]
    {
        PathBuf::from("./coral_data")
    }

    #[cfg(not(debug_assertions))]
    {
        dirs::data_dir()
            .map(|d| {
                #[cfg(target_os = "macos")]
                {
                    d.join("dev.coral.Coral")
                }
                #[cfg(target_os = "windows")]
                {
                    d.join("coral").join("Coral")
                }
                #[cfg(not(any(target_os = "macos", target_os = "windows")))]
                {
                    d.join("coral")
                }
            })
            .unwrap_or_else(|| PathBuf::from("./coral_data"))
    }
}

/// Initialize the data directory, creating it if needed.
pub fn init_data_dir(path: &PathBuf) -> Result<(), CoralError> {
    if path.exists() {
        if !path.is_dir() {
            return Err(CoralError::storage(
                format!("Data path exists but is not a directory: {}", path.display()),
                Some("Select a different location or remove the existing file"),
            ));
        }
        return Ok(());
    }

    std::fs::create_dir_all(path).map_err(|e| {
        CoralError::storage(
            format!("Failed to create data directory '{}': {}", path.display(), e),
            Some("Check permissions or select a different location"),
        )
    })?;

    tracing::info!(path = %path.display(), "Created data directory");
    Ok(())
}

/// SQLite-based local storage for saved connections.
///
/// Thread-safe via internal Mutex. Uses WAL mode for concurrent reads.
pub struct LocalStorage {
    /// Thread-safe SQLite connection
    connection: Mutex<Connection>,
    /// Data directory path
    data_dir: PathBuf,
}

impl LocalStorage {
    /// Open or create local storage in the given data directory.
    pub fn open(data_dir: PathBuf) -> Result<Self, CoralError> {
        init_data_dir(&data_dir)?;
        let db_path = data_dir.join("coral.db");
        Self::open_with_path(db_path, data_dir)
    }

    /// Open storage with a specific database path (for testing).
    pub fn open_with_path(db_path: PathBuf, data_dir: PathBuf) -> Result<Self, CoralError> {
        let connection = Connection::open(&db_path).map_err(|e| {
            CoralError::storage(
                format!("Failed to open database '{}': {}", db_path.display(), e),
                Some("The database file may be corrupted. Try deleting it to start fresh."),
            )
        })?;

        Self::configure_connection(&connection)?;

        let storage = Self { connection: Mutex::new(connection), data_dir };
        storage.run_migrations()?;

        tracing::info!(path = %db_path.display(), "Local storage opened");
        Ok(storage)
    }

    /// Configure SQLite connection with optimal pragmas.
    fn configure_connection(conn: &Connection) -> Result<(), CoralError> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            ",
        )
        .map_err(|e| CoralError::storage(format!("Failed to configure database: {e}"), None))
    }

    /// Run database migrations.
    fn run_migrations(&self) -> Result<(), CoralError> {
        const DOMAIN: &str = "core";

        let conn = self.connection.lock();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS migrations (
                domain TEXT NOT NULL,
                step INTEGER NOT NULL,
                migration TEXT NOT NULL,
                PRIMARY KEY(domain, step)
            ) STRICT",
            [],
        )
        .map_err(|e| CoralError::storage(format!("Failed to create migrations table: {e}"), None))?;

        let current_step: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(step), 0) FROM migrations WHERE domain = ?",
                [DOMAIN],
                |row| row.get(0),
            )
            .unwrap_or(0);

        // Migration 1: Initial schema
        if current_step < 1 {
            conn.execute_batch(
                "
                CREATE TABLE connections (
                    connection_id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    host TEXT NOT NULL,
                    port INTEGER NOT NULL DEFAULT 6379,
                    password TEXT NOT NULL DEFAULT '',
                    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                ) STRICT;

                CREATE INDEX idx_connections_created ON connections(created_at, name);
                ",
            )
            .map_err(|e| CoralError::storage(format!("Migration 1 failed: {e}"), None))?;

            conn.execute(
                "INSERT INTO migrations (domain, step, migration) VALUES (?, 1, 'initial_schema')",
                [DOMAIN],
            )
            .map_err(|e| CoralError::storage(format!("Failed to record migration: {e}"), None))?;

            tracing::info!("Applied migration 1: initial_schema");
        }

        Ok(())
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Insert or update a record under an already held lock.
    fn upsert_connection(conn: &Connection, config: &ConnectionConfig) -> Result<(), CoralError> {
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO connections (connection_id, name, host, port, password, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(connection_id) DO UPDATE SET
                name = excluded.name,
                host = excluded.host,
                port = excluded.port,
                password = excluded.password",
            params![config.id.to_string(), config.name, config.host, config.port, config.password, now],
        )
        .map_err(|e| CoralError::storage(format!("Failed to save connection: {e}"), None))?;

        tracing::debug!(connection_id = %config.id, name = %config.name, "Connection saved");
        Ok(())
    }

    /// Load all records under an already held lock, in creation order.
    fn load_all_internal(conn: &Connection) -> Result<Vec<ConnectionConfig>, CoralError> {
        let mut stmt = conn
            .prepare(
                "SELECT connection_id, name, host, port, password
                 FROM connections ORDER BY created_at, name",
            )
            .map_err(|e| CoralError::storage(format!("Failed to prepare query: {e}"), None))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, u16>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(|e| CoralError::storage(format!("Failed to query connections: {e}"), None))?;

        let mut configs = Vec::new();
        for row_result in rows {
            let (id, name, host, port, password) = row_result
                .map_err(|e| CoralError::storage(format!("Failed to read row: {e}"), None))?;
            let id = Uuid::parse_str(&id)
                .map_err(|e| CoralError::storage(format!("Invalid connection ID: {e}"), None))?;
            configs.push(ConnectionConfig { id, name, host, port, password });
        }

        Ok(configs)
    }
}

#[async_trait]
impl ConnectionStore for LocalStorage {
    async fn save(&self, config: ConnectionConfig) -> Result<Vec<ConnectionConfig>, CoralError> {
        let conn = self.connection.lock();
        Self::upsert_connection(&conn, &config)?;
        Self::load_all_internal(&conn)
    }

    async fn load_all(&self) -> Result<Vec<ConnectionConfig>, CoralError> {
        let conn = self.connection.lock();
        Self::load_all_internal(&conn)
    }

    async fn delete(&self, id: Uuid) -> Result<(), CoralError> {
        let conn = self.connection.lock();
        conn.execute("DELETE FROM connections WHERE connection_id = ?", [id.to_string()])
            .map_err(|e| CoralError::storage(format!("Failed to delete connection: {e}"), None))?;

        tracing::debug!(connection_id = %id, "Connection deleted");
        Ok(())
    }
}
