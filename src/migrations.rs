//! Embedded SQL steps for the layout and alert-window tables.
//!
//! `schema_version` holds one row per applied step. A step's SQL and its
//! version row commit together, so a crash never leaves a half-applied step
//! recorded as done.

use rusqlite::Connection;

struct Step {
    version: i32,
    sql: &'static str,
}

const STEPS: &[Step] = &[Step {
    version: 1,
    sql: include_str!("migrations/001_baseline.sql"),
}];

fn latest_known() -> i32 {
    STEPS.last().map_or(0, |step| step.version)
}

fn applied_version(conn: &Connection) -> Result<i32, String> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| format!("schema_version unavailable: {e}"))?;
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |row| {
        row.get(0)
    })
    .map_err(|e| format!("schema_version unreadable: {e}"))
}

/// Bring the insights tables up to date and return how many steps ran.
/// Refuses a database written by a newer build.
pub fn run_migrations(conn: &Connection) -> Result<usize, String> {
    let applied = applied_version(conn)?;
    if applied > latest_known() {
        return Err(format!(
            "insights database is at v{applied}, this build only knows up to v{}",
            latest_known()
        ));
    }

    let mut ran = 0;
    for step in STEPS.iter().filter(|step| step.version > applied) {
        let script = format!(
            "BEGIN;\n{}\nINSERT INTO schema_version (version) VALUES ({});\nCOMMIT;",
            step.sql, step.version
        );
        if let Err(e) = conn.execute_batch(&script) {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(format!("step v{} rejected: {e}", step.version));
        }
        log::info!("insights store: schema now at v{}", step.version);
        ran += 1;
    }
    Ok(ran)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_db() -> Connection {
        Connection::open_in_memory().expect("in-memory db")
    }

    #[test]
    fn test_fresh_db_applies_baseline() {
        let conn = mem_db();
        let applied = run_migrations(&conn).expect("migrations should succeed");
        assert_eq!(applied, 1);
        assert_eq!(applied_version(&conn).unwrap(), 1);

        let layouts: i32 = conn
            .query_row("SELECT COUNT(*) FROM widget_layouts", [], |row| row.get(0))
            .expect("widget_layouts table should exist");
        assert_eq!(layouts, 0);
    }

    #[test]
    fn test_rerun_is_noop() {
        let conn = mem_db();
        run_migrations(&conn).unwrap();
        assert_eq!(run_migrations(&conn).unwrap(), 0);
    }

    #[test]
    fn test_alert_window_check_constraint() {
        let conn = mem_db();
        run_migrations(&conn).unwrap();
        let bad = conn.execute(
            "INSERT INTO alert_windows (user_id, short_term_days, long_term_days) VALUES ('u', 90, 30)",
            [],
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_newer_schema_refused() {
        let conn = mem_db();
        run_migrations(&conn).unwrap();
        conn.execute("INSERT INTO schema_version (version) VALUES (99)", [])
            .unwrap();
        assert!(run_migrations(&conn).is_err());
    }
}
