//! Database schema migrations.
//!
//! Applies the initial schema: sessions, messages, and the
//! schema_migrations tracking table.

use rusqlite::Connection;
use tracing::info;

use crate::error::StoreError;

/// Run all pending database migrations.
///
/// Currently implements the initial schema (version 1). Future migrations
/// can be added by checking the current version and applying incremental
/// changes.
pub fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| StoreError::Connection(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| StoreError::Connection(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        -- Conversation sessions. topics_discussed is a JSON array of intent
        -- names, append-only. version backs optimistic-concurrency updates.
        CREATE TABLE IF NOT EXISTS sessions (
            session_id        TEXT PRIMARY KEY NOT NULL,
            created_at        INTEGER NOT NULL,
            last_interaction  INTEGER NOT NULL,
            interaction_count INTEGER NOT NULL DEFAULT 0,
            status            TEXT NOT NULL DEFAULT 'active'
                              CHECK (status IN ('active', 'expired')),
            current_topic     TEXT,
            topics_discussed  TEXT NOT NULL DEFAULT '[]',
            version           INTEGER NOT NULL DEFAULT 0
        );

        -- Messages (turns). Immutable once written except the feedback pair.
        CREATE TABLE IF NOT EXISTS messages (
            message_id         TEXT PRIMARY KEY NOT NULL,
            session_id         TEXT NOT NULL REFERENCES sessions(session_id),
            sender             TEXT NOT NULL CHECK (sender IN ('user', 'bot')),
            text               TEXT NOT NULL,
            intent             TEXT,
            confidence         REAL,
            entities           TEXT,
            feedback           TEXT CHECK (feedback IN ('positive', 'negative')),
            feedback_timestamp INTEGER,
            timestamp          INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_session_time
            ON messages (session_id, timestamp ASC, message_id ASC);

        INSERT INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| StoreError::Connection(format!("Failed to apply v1 schema: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn
    }

    #[test]
    fn test_migrations_create_tables() {
        let conn = open();
        run_migrations(&conn).unwrap();

        let tables: Vec<String> = {
            let mut stmt = conn
                .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
                .unwrap();
            stmt.query_map([], |row| row.get(0))
                .unwrap()
                .map(|r| r.unwrap())
                .collect()
        };
        assert!(tables.contains(&"sessions".to_string()));
        assert!(tables.contains(&"messages".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn test_migrations_idempotent() {
        let conn = open();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_messages_require_existing_session() {
        let conn = open();
        run_migrations(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO messages (message_id, session_id, sender, text, timestamp)
             VALUES ('msg_x', 'session_missing', 'user', 'hello', 0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_sender_check_constraint() {
        let conn = open();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO sessions (session_id, created_at, last_interaction) VALUES ('s', 0, 0)",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO messages (message_id, session_id, sender, text, timestamp)
             VALUES ('msg_x', 's', 'robot', 'hello', 0)",
            [],
        );
        assert!(result.is_err());
    }
}
