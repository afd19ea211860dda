//! Meeting summary database operations

use chrono::Utc;
use rusqlite::{OptionalExtension, Result as SqliteResult};

use crate::models::{Summary, SummaryDraft, UpdateSummaryRequest};
use super::super::sqlite::{json_list, timestamp, to_json_list, UpdateSet};
use super::super::Database;

const SUMMARY_COLUMNS: &str = "id, meeting_id, content, key_points, decisions, topics, created_at, updated_at";

fn row_to_summary(row: &rusqlite::Row) -> SqliteResult<Summary> {
    Ok(Summary {
        id: row.get(0)?,
        meeting_id: row.get(1)?,
        content: row.get(2)?,
        key_points: json_list(row, 3)?,
        decisions: json_list(row, 4)?,
        topics: json_list(row, 5)?,
        created_at: timestamp(row, 6)?,
        updated_at: timestamp(row, 7)?,
    })
}

impl Database {
    pub fn get_summary(&self, meeting_id: i64) -> SqliteResult<Option<Summary>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {} FROM summaries WHERE meeting_id = ?1", SUMMARY_COLUMNS),
            [meeting_id],
            row_to_summary,
        )
        .optional()
    }

    /// Insert or replace the single summary of a meeting
    pub fn upsert_summary(&self, meeting_id: i64, draft: &SummaryDraft) -> SqliteResult<Summary> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO summaries (meeting_id, content, key_points, decisions, topics, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(meeting_id) DO UPDATE SET
                 content = excluded.content,
                 key_points = excluded.key_points,
                 decisions = excluded.decisions,
                 topics = excluded.topics,
                 updated_at = excluded.updated_at",
            rusqlite::params![
                meeting_id,
                draft.content,
                to_json_list(&draft.key_points),
                to_json_list(&draft.decisions),
                to_json_list(&draft.topics),
                &now,
            ],
        )?;
        drop(conn);

        self.get_summary(meeting_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    pub fn update_summary(&self, meeting_id: i64, request: &UpdateSummaryRequest) -> SqliteResult<Option<Summary>> {
        let mut set = UpdateSet::new();
        set.set_opt("content", request.content.clone());
        set.set_opt("key_points", request.key_points.as_ref().map(|v| to_json_list(v)));
        set.set_opt("decisions", request.decisions.as_ref().map(|v| to_json_list(v)));
        set.set_opt("topics", request.topics.as_ref().map(|v| to_json_list(v)));

        if !set.is_empty() {
            let conn = self.conn();
            set.execute(&conn, "summaries", &[("meeting_id", meeting_id)])?;
        }
        self.get_summary(meeting_id)
    }
}
