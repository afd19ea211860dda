//! Meeting database operations

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, Result as SqliteResult};

use crate::integrations::CalendarEvent;
use crate::models::{CalendarSync, CreateMeetingRequest, Meeting, MeetingQuery, MeetingStatus, UpdateMeetingRequest};
use super::super::sqlite::{enum_column, opt_timestamp, timestamp, UpdateSet};
use super::super::Database;

pub(crate) const MEETING_COLUMNS: &str = "id, user_id, agent_id, title, description, status, \
     scheduled_start, scheduled_end, actual_start, actual_end, meeting_url, recording_url, \
     calendar_event_id, created_at, updated_at";

pub(crate) fn row_to_meeting(row: &rusqlite::Row) -> SqliteResult<Meeting> {
    Ok(Meeting {
        id: row.get(0)?,
        user_id: row.get(1)?,
        agent_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        status: enum_column(row, 5)?,
        scheduled_start: opt_timestamp(row, 6)?,
        scheduled_end: opt_timestamp(row, 7)?,
        actual_start: opt_timestamp(row, 8)?,
        actual_end: opt_timestamp(row, 9)?,
        meeting_url: row.get(10)?,
        recording_url: row.get(11)?,
        calendar_event_id: row.get(12)?,
        created_at: timestamp(row, 13)?,
        updated_at: timestamp(row, 14)?,
    })
}

fn rfc3339(dt: Option<DateTime<Utc>>) -> Option<String> {
    dt.map(|d| d.to_rfc3339())
}

impl Database {
    /// Insert a meeting (participants are added separately)
    pub fn create_meeting(&self, user_id: i64, request: &CreateMeetingRequest) -> SqliteResult<Meeting> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO meetings (user_id, agent_id, title, description, status,
                 scheduled_start, scheduled_end, meeting_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            rusqlite::params![
                user_id,
                request.agent_id,
                request.title.trim(),
                request.description,
                MeetingStatus::Scheduled.as_ref(),
                rfc3339(request.scheduled_start),
                rfc3339(request.scheduled_end),
                request.meeting_url,
                &now,
            ],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_meeting(id, user_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    /// Get a meeting owned by the given user
    pub fn get_meeting(&self, id: i64, user_id: i64) -> SqliteResult<Option<Meeting>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {} FROM meetings WHERE id = ?1 AND user_id = ?2", MEETING_COLUMNS),
            [id, user_id],
            row_to_meeting,
        )
        .optional()
    }

    /// List meetings with optional status / date-range filters, newest first
    pub fn list_meetings(&self, user_id: i64, query: &MeetingQuery) -> SqliteResult<Vec<Meeting>> {
        let mut sql = format!("SELECT {} FROM meetings WHERE user_id = ?1", MEETING_COLUMNS);
        let mut values: Vec<Value> = vec![Value::Integer(user_id)];

        if let Some(status) = query.status {
            values.push(Value::Text(status.as_ref().to_string()));
            sql.push_str(&format!(" AND status = ?{}", values.len()));
        }
        if let Some(from) = query.from {
            values.push(Value::Text(from.to_rfc3339()));
            sql.push_str(&format!(" AND scheduled_start >= ?{}", values.len()));
        }
        if let Some(to) = query.to {
            values.push(Value::Text(to.to_rfc3339()));
            sql.push_str(&format!(" AND scheduled_start <= ?{}", values.len()));
        }
        values.push(Value::Integer(query.limit()));
        sql.push_str(&format!(
            " ORDER BY scheduled_start IS NULL, scheduled_start DESC, id DESC LIMIT ?{}",
            values.len()
        ));
        values.push(Value::Integer(query.offset()));
        sql.push_str(&format!(" OFFSET ?{}", values.len()));

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let meetings = stmt
            .query_map(rusqlite::params_from_iter(values), row_to_meeting)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(meetings)
    }

    /// Upcoming scheduled meetings starting after `now`, soonest first
    pub fn list_upcoming_meetings(&self, user_id: i64, now: DateTime<Utc>, limit: i64) -> SqliteResult<Vec<Meeting>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM meetings
             WHERE user_id = ?1 AND status = 'scheduled' AND scheduled_start >= ?2
             ORDER BY scheduled_start ASC LIMIT ?3",
            MEETING_COLUMNS
        ))?;
        let meetings = stmt
            .query_map(rusqlite::params![user_id, now.to_rfc3339(), limit], row_to_meeting)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(meetings)
    }

    /// Most recently finished meetings
    pub fn list_recent_completed_meetings(&self, user_id: i64, limit: i64) -> SqliteResult<Vec<Meeting>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM meetings
             WHERE user_id = ?1 AND status = 'completed'
             ORDER BY actual_end DESC LIMIT ?2",
            MEETING_COLUMNS
        ))?;
        let meetings = stmt
            .query_map(rusqlite::params![user_id, limit], row_to_meeting)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(meetings)
    }

    pub fn update_meeting(
        &self,
        id: i64,
        user_id: i64,
        request: &UpdateMeetingRequest,
    ) -> SqliteResult<Option<Meeting>> {
        let mut set = UpdateSet::new();
        set.set_opt("title", request.title.as_ref().map(|s| s.trim().to_string()));
        set.set_opt("description", request.description.clone());
        set.set_opt("scheduled_start", rfc3339(request.scheduled_start));
        set.set_opt("scheduled_end", rfc3339(request.scheduled_end));
        set.set_opt("meeting_url", request.meeting_url.clone());
        set.set_opt("recording_url", request.recording_url.clone());
        set.set_opt("agent_id", request.agent_id);

        if !set.is_empty() {
            let conn = self.conn();
            set.execute(&conn, "meetings", &[("id", id), ("user_id", user_id)])?;
        }
        self.get_meeting(id, user_id)
    }

    /// Persist a status change, stamping actual start/end times.
    /// Transition validity is checked by the caller.
    pub fn set_meeting_status(
        &self,
        id: i64,
        user_id: i64,
        status: MeetingStatus,
    ) -> SqliteResult<Option<Meeting>> {
        let now = Utc::now().to_rfc3339();
        let mut set = UpdateSet::new();
        set.set("status", status.as_ref().to_string());
        match status {
            MeetingStatus::InProgress => set.set("actual_start", now.clone()),
            MeetingStatus::Completed => set.set("actual_end", now.clone()),
            _ => {}
        }

        {
            let conn = self.conn();
            set.execute(&conn, "meetings", &[("id", id), ("user_id", user_id)])?;
            if status == MeetingStatus::Completed {
                // A meeting completed without ever being started still gets a zero-length run
                conn.execute(
                    "UPDATE meetings SET actual_start = actual_end
                     WHERE id = ?1 AND user_id = ?2 AND actual_start IS NULL",
                    [id, user_id],
                )?;
            }
        }
        self.get_meeting(id, user_id)
    }

    pub fn delete_meeting(&self, id: i64, user_id: i64) -> SqliteResult<bool> {
        let conn = self.conn();
        let rows = conn.execute(
            "DELETE FROM meetings WHERE id = ?1 AND user_id = ?2",
            [id, user_id],
        )?;
        Ok(rows > 0)
    }

    /// Insert or refresh a meeting imported from the calendar
    pub fn upsert_calendar_meeting(&self, user_id: i64, event: &CalendarEvent) -> SqliteResult<(Meeting, CalendarSync)> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM meetings WHERE user_id = ?1 AND calendar_event_id = ?2",
                rusqlite::params![user_id, event.event_id],
                |row| row.get(0),
            )
            .optional()?;

        let (id, outcome) = match existing {
            Some(id) => {
                // Only scheduled meetings follow calendar edits
                let rows = conn.execute(
                    "UPDATE meetings SET title = ?1, description = ?2, scheduled_start = ?3,
                         scheduled_end = ?4, meeting_url = ?5, updated_at = ?6
                     WHERE id = ?7 AND status = 'scheduled'",
                    rusqlite::params![
                        event.title,
                        event.description,
                        event.start.to_rfc3339(),
                        event.end.to_rfc3339(),
                        event.meeting_url,
                        &now,
                        id,
                    ],
                )?;
                let outcome = if rows > 0 { CalendarSync::Updated } else { CalendarSync::Unchanged };
                (id, outcome)
            }
            None => {
                conn.execute(
                    "INSERT INTO meetings (user_id, title, description, status, scheduled_start,
                         scheduled_end, meeting_url, calendar_event_id, created_at, updated_at)
                     VALUES (?1, ?2, ?3, 'scheduled', ?4, ?5, ?6, ?7, ?8, ?8)",
                    rusqlite::params![
                        user_id,
                        event.title,
                        event.description,
                        event.start.to_rfc3339(),
                        event.end.to_rfc3339(),
                        event.meeting_url,
                        event.event_id,
                        &now,
                    ],
                )?;
                (conn.last_insert_rowid(), CalendarSync::Imported)
            }
        };
        drop(conn);

        let meeting = self.get_meeting(id, user_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        Ok((meeting, outcome))
    }
}
