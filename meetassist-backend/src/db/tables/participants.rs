//! Meeting participant database operations

use chrono::Utc;
use rusqlite::{OptionalExtension, Result as SqliteResult};

use crate::models::{NewParticipant, Participant};
use super::super::sqlite::{enum_column, opt_timestamp, timestamp};
use super::super::Database;

const PARTICIPANT_COLUMNS: &str = "id, meeting_id, name, email, role, joined_at, left_at, created_at";

fn row_to_participant(row: &rusqlite::Row) -> SqliteResult<Participant> {
    Ok(Participant {
        id: row.get(0)?,
        meeting_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        role: enum_column(row, 4)?,
        joined_at: opt_timestamp(row, 5)?,
        left_at: opt_timestamp(row, 6)?,
        created_at: timestamp(row, 7)?,
    })
}

impl Database {
    pub fn add_participant(&self, meeting_id: i64, participant: &NewParticipant) -> SqliteResult<Participant> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let email = participant
            .email
            .as_ref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());

        conn.execute(
            "INSERT INTO meeting_participants (meeting_id, name, email, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                meeting_id,
                participant.name.trim(),
                email,
                participant.role.unwrap_or_default().as_ref(),
                &now,
            ],
        )?;
        let id = conn.last_insert_rowid();

        conn.query_row(
            &format!("SELECT {} FROM meeting_participants WHERE id = ?1", PARTICIPANT_COLUMNS),
            [id],
            row_to_participant,
        )
    }

    pub fn list_participants(&self, meeting_id: i64) -> SqliteResult<Vec<Participant>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM meeting_participants WHERE meeting_id = ?1 ORDER BY id",
            PARTICIPANT_COLUMNS
        ))?;
        let participants = stmt
            .query_map([meeting_id], row_to_participant)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(participants)
    }

    pub fn remove_participant(&self, meeting_id: i64, participant_id: i64) -> SqliteResult<bool> {
        let conn = self.conn();
        let rows = conn.execute(
            "DELETE FROM meeting_participants WHERE id = ?1 AND meeting_id = ?2",
            [participant_id, meeting_id],
        )?;
        Ok(rows > 0)
    }

    /// Record a live join from the gateway. Matches on email when known,
    /// otherwise on name, inserting an attendee row if neither exists.
    pub fn mark_participant_joined(
        &self,
        meeting_id: i64,
        name: &str,
        email: Option<&str>,
    ) -> SqliteResult<Participant> {
        let existing = self.find_participant(meeting_id, name, email)?;
        let id = match existing {
            Some(p) => p.id,
            None => {
                self.add_participant(
                    meeting_id,
                    &NewParticipant {
                        name: name.to_string(),
                        email: email.map(str::to_string),
                        role: None,
                    },
                )?
                .id
            }
        };

        let conn = self.conn();
        conn.execute(
            "UPDATE meeting_participants SET joined_at = ?1, left_at = NULL WHERE id = ?2",
            rusqlite::params![Utc::now().to_rfc3339(), id],
        )?;
        conn.query_row(
            &format!("SELECT {} FROM meeting_participants WHERE id = ?1", PARTICIPANT_COLUMNS),
            [id],
            row_to_participant,
        )
    }

    pub fn mark_participant_left(&self, meeting_id: i64, name: &str, email: Option<&str>) -> SqliteResult<bool> {
        let Some(participant) = self.find_participant(meeting_id, name, email)? else {
            return Ok(false);
        };
        let conn = self.conn();
        let rows = conn.execute(
            "UPDATE meeting_participants SET left_at = ?1 WHERE id = ?2",
            rusqlite::params![Utc::now().to_rfc3339(), participant.id],
        )?;
        Ok(rows > 0)
    }

    fn find_participant(&self, meeting_id: i64, name: &str, email: Option<&str>) -> SqliteResult<Option<Participant>> {
        let conn = self.conn();
        match email {
            Some(email) => conn
                .query_row(
                    &format!(
                        "SELECT {} FROM meeting_participants WHERE meeting_id = ?1 AND email = ?2",
                        PARTICIPANT_COLUMNS
                    ),
                    rusqlite::params![meeting_id, email.trim().to_lowercase()],
                    row_to_participant,
                )
                .optional(),
            None => conn
                .query_row(
                    &format!(
                        "SELECT {} FROM meeting_participants WHERE meeting_id = ?1 AND name = ?2 LIMIT 1",
                        PARTICIPANT_COLUMNS
                    ),
                    rusqlite::params![meeting_id, name],
                    row_to_participant,
                )
                .optional(),
        }
    }
}
