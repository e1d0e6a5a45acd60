//! SQLite-backed store for per-user dashboard state.
//!
//! Holds widget layouts (as a JSON array per user and context) and alert
//! windows. Row data and schemas stay with the host application.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::alerts::AlertWindowConfig;
use crate::error::StoreError;
use crate::store::{AlertConfigStore, LayoutScope, LayoutStore, LayoutUpdate};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(StoreError::CreateDir)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        crate::migrations::run_migrations(&conn).map_err(StoreError::Migration)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run a closure against the connection for ad-hoc queries.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> T) -> T {
        f(&self.conn.lock())
    }
}

fn read_layout(
    conn: &Connection,
    scope: &LayoutScope,
) -> Result<Option<Vec<String>>, StoreError> {
    let json: Option<String> = conn
        .query_row(
            "SELECT keys_json FROM widget_layouts WHERE user_id = ?1 AND context_id = ?2",
            params![scope.user_id, scope.context_id],
            |row| row.get(0),
        )
        .optional()?;
    json.map(|j| serde_json::from_str(&j).map_err(StoreError::from))
        .transpose()
}

fn write_layout(conn: &Connection, scope: &LayoutScope, keys: &[String]) -> Result<(), StoreError> {
    let json = serde_json::to_string(keys)?;
    conn.execute(
        "INSERT INTO widget_layouts (user_id, context_id, keys_json, updated_at)
         VALUES (?1, ?2, ?3, datetime('now'))
         ON CONFLICT(user_id, context_id) DO UPDATE SET
            keys_json = excluded.keys_json,
            updated_at = datetime('now')",
        params![scope.user_id, scope.context_id, json],
    )?;
    Ok(())
}

impl LayoutStore for SqliteStore {
    fn load_layout(&self, scope: &LayoutScope) -> Result<Option<Vec<String>>, StoreError> {
        read_layout(&self.conn.lock(), scope)
    }

    fn save_layout(&self, scope: &LayoutScope, keys: &[String]) -> Result<(), StoreError> {
        write_layout(&self.conn.lock(), scope, keys)
    }

    /// Runs under `BEGIN IMMEDIATE`, so another connection to the same file
    /// cannot write between the read and the write. Dropping the transaction
    /// on an error rolls it back.
    fn update_layout(
        &self,
        scope: &LayoutScope,
        update: LayoutUpdate<'_>,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if let Some(next) = update(read_layout(&tx, scope)?) {
            write_layout(&tx, scope, &next)?;
        }
        tx.commit()?;
        Ok(())
    }
}

impl AlertConfigStore for SqliteStore {
    fn load_alert_window(&self, user_id: &str) -> Result<Option<AlertWindowConfig>, StoreError> {
        let window = self
            .conn
            .lock()
            .query_row(
                "SELECT short_term_days, long_term_days FROM alert_windows WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(AlertWindowConfig {
                        short_term_days: row.get(0)?,
                        long_term_days: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(window)
    }

    fn save_alert_window(
        &self,
        user_id: &str,
        config: &AlertWindowConfig,
    ) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "INSERT INTO alert_windows (user_id, short_term_days, long_term_days, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(user_id) DO UPDATE SET
                short_term_days = excluded.short_term_days,
                long_term_days = excluded.long_term_days,
                updated_at = datetime('now')",
            params![user_id, config.short_term_days, config.long_term_days],
        )?;
        Ok(())
    }
}

/// Default database location, next to the config file.
pub fn default_db_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".service-insights").join("insights.db"))
}
