//! SQLite database - schema definitions and connection management
//!
//! This file contains:
//! - Database struct definition
//! - Connection management (new, init)
//! - Schema creation
//! - Small row-mapping helpers shared by the table modules
//!
//! All table operations are in the tables/ subdirectory.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Main database wrapper, a single connection guarded by a Mutex
pub struct Database {
    pub(crate) conn: Mutex<Connection>,
}

impl Database {
    /// Create a new database connection and initialize schema
    pub fn new(database_url: &str) -> SqliteResult<Self> {
        // Create parent directory if it doesn't exist
        if database_url != ":memory:" {
            if let Some(parent) = Path::new(database_url).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).ok();
                }
            }
        }

        let conn = Connection::open(database_url)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    /// In-memory database, used by tests
    #[cfg(test)]
    pub fn in_memory() -> SqliteResult<Self> {
        Self::new(":memory:")
    }

    /// Lock the connection. A poisoned lock still holds a usable connection.
    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Initialize all database tables
    fn init(&self) -> SqliteResult<()> {
        let conn = self.conn();

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT UNIQUE NOT NULL,
                name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user',
                timezone TEXT NOT NULL DEFAULT 'UTC',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        // Agents: rule/template rows acting as simulated meeting participants
        conn.execute(
            "CREATE TABLE IF NOT EXISTS agents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                description TEXT,
                agent_type TEXT NOT NULL DEFAULT 'assistant',
                instructions TEXT,
                trigger_keywords TEXT NOT NULL DEFAULT '[]',
                response_templates TEXT NOT NULL DEFAULT '[]',
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(user_id, name)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS meetings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                agent_id INTEGER REFERENCES agents(id) ON DELETE SET NULL,
                title TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'scheduled',
                scheduled_start TEXT,
                scheduled_end TEXT,
                actual_start TEXT,
                actual_end TEXT,
                meeting_url TEXT,
                recording_url TEXT,
                calendar_event_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(user_id, calendar_event_id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_meetings_user_start ON meetings(user_id, scheduled_start)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS meeting_participants (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                meeting_id INTEGER NOT NULL REFERENCES meetings(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                email TEXT,
                role TEXT NOT NULL DEFAULT 'attendee',
                joined_at TEXT,
                left_at TEXT,
                created_at TEXT NOT NULL,
                UNIQUE(meeting_id, email)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS transcripts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                meeting_id INTEGER NOT NULL REFERENCES meetings(id) ON DELETE CASCADE,
                speaker TEXT NOT NULL,
                content TEXT NOT NULL,
                start_time REAL,
                end_time REAL,
                confidence REAL,
                is_agent INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_transcripts_meeting ON transcripts(meeting_id, start_time)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS summaries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                meeting_id INTEGER UNIQUE NOT NULL REFERENCES meetings(id) ON DELETE CASCADE,
                content TEXT NOT NULL,
                key_points TEXT NOT NULL DEFAULT '[]',
                decisions TEXT NOT NULL DEFAULT '[]',
                topics TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS action_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                meeting_id INTEGER REFERENCES meetings(id) ON DELETE SET NULL,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                description TEXT,
                assignee TEXT,
                due_date TEXT,
                priority TEXT NOT NULL DEFAULT 'medium',
                status TEXT NOT NULL DEFAULT 'pending',
                completed_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS follow_up_emails (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                meeting_id INTEGER NOT NULL REFERENCES meetings(id) ON DELETE CASCADE,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                subject TEXT NOT NULL,
                body TEXT NOT NULL,
                recipients TEXT NOT NULL DEFAULT '[]',
                status TEXT NOT NULL DEFAULT 'draft',
                sent_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS meeting_analytics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                meeting_id INTEGER UNIQUE NOT NULL REFERENCES meetings(id) ON DELETE CASCADE,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                duration_minutes REAL NOT NULL DEFAULT 0,
                participant_count INTEGER NOT NULL DEFAULT 0,
                transcript_segments INTEGER NOT NULL DEFAULT 0,
                word_count INTEGER NOT NULL DEFAULT 0,
                agent_interventions INTEGER NOT NULL DEFAULT 0,
                speaker_stats TEXT NOT NULL DEFAULT '{}',
                action_item_count INTEGER NOT NULL DEFAULT 0,
                engagement_score REAL NOT NULL DEFAULT 0,
                computed_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }
}

// ============================================
// Row mapping helpers
// ============================================

fn conversion_error(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Read an RFC 3339 timestamp column
pub(crate) fn timestamp(row: &rusqlite::Row, idx: usize) -> SqliteResult<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

/// Read a nullable RFC 3339 timestamp column
pub(crate) fn opt_timestamp(row: &rusqlite::Row, idx: usize) -> SqliteResult<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

/// Read a nullable `YYYY-MM-DD` column
pub(crate) fn opt_date(row: &rusqlite::Row, idx: usize) -> SqliteResult<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| conversion_error(idx, e)))
        .transpose()
}

/// Read a JSON string-array column, tolerating malformed content
pub(crate) fn json_list(row: &rusqlite::Row, idx: usize) -> SqliteResult<Vec<String>> {
    let raw: Option<String> = row.get(idx)?;
    Ok(raw
        .and_then(|json| serde_json::from_str(&json).ok())
        .unwrap_or_default())
}

/// Read a snake_case enum column via its `FromStr` impl
pub(crate) fn enum_column<T>(row: &rusqlite::Row, idx: usize) -> SqliteResult<T>
where
    T: std::str::FromStr<Err = strum::ParseError>,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| conversion_error(idx, e))
}

pub(crate) fn to_json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
            && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Accumulates `column = ?` assignments for a partial UPDATE
#[derive(Default)]
pub(crate) struct UpdateSet {
    columns: Vec<&'static str>,
    values: Vec<Value>,
}

impl UpdateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &'static str, value: impl Into<Value>) {
        self.columns.push(column);
        self.values.push(value.into());
    }

    pub fn set_opt<T: Into<Value>>(&mut self, column: &'static str, value: Option<T>) {
        if let Some(v) = value {
            self.set(column, v);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Run `UPDATE table SET ..., updated_at = now WHERE col = ? AND ...`
    pub fn execute(
        mut self,
        conn: &Connection,
        table: &str,
        filters: &[(&str, i64)],
    ) -> SqliteResult<usize> {
        self.set("updated_at", Utc::now().to_rfc3339());
        let assignments: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{} = ?{}", col, i + 1))
            .collect();
        let offset = self.values.len();
        let conditions: Vec<String> = filters
            .iter()
            .enumerate()
            .map(|(i, (col, _))| format!("{} = ?{}", col, offset + i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            table,
            assignments.join(", "),
            conditions.join(" AND ")
        );
        self.values
            .extend(filters.iter().map(|(_, v)| Value::Integer(*v)));
        conn.execute(&sql, rusqlite::params_from_iter(self.values))
    }
}
