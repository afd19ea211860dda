//! Transcript segment database operations

use chrono::Utc;
use rusqlite::Result as SqliteResult;

use crate::models::{NewTranscript, Transcript};
use super::super::sqlite::timestamp;
use super::super::Database;

const TRANSCRIPT_COLUMNS: &str =
    "id, meeting_id, speaker, content, start_time, end_time, confidence, is_agent, created_at";

fn row_to_transcript(row: &rusqlite::Row) -> SqliteResult<Transcript> {
    let is_agent: i64 = row.get(7)?;
    Ok(Transcript {
        id: row.get(0)?,
        meeting_id: row.get(1)?,
        speaker: row.get(2)?,
        content: row.get(3)?,
        start_time: row.get(4)?,
        end_time: row.get(5)?,
        confidence: row.get(6)?,
        is_agent: is_agent != 0,
        created_at: timestamp(row, 8)?,
    })
}

impl Database {
    pub fn add_transcript(&self, meeting_id: i64, segment: &NewTranscript) -> SqliteResult<Transcript> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO transcripts (meeting_id, speaker, content, start_time, end_time, confidence, is_agent, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                meeting_id,
                segment.speaker.trim(),
                segment.content.trim(),
                segment.start_time,
                segment.end_time,
                segment.confidence,
                segment.is_agent as i64,
                Utc::now().to_rfc3339(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            &format!("SELECT {} FROM transcripts WHERE id = ?1", TRANSCRIPT_COLUMNS),
            [id],
            row_to_transcript,
        )
    }

    /// All segments of a meeting in spoken order; untimed segments keep insertion order
    pub fn list_transcripts(&self, meeting_id: i64, speaker: Option<&str>) -> SqliteResult<Vec<Transcript>> {
        let conn = self.conn();
        let order = "ORDER BY start_time IS NULL, start_time, id";
        let transcripts = match speaker {
            Some(speaker) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM transcripts WHERE meeting_id = ?1 AND speaker = ?2 {}",
                    TRANSCRIPT_COLUMNS, order
                ))?;
                stmt.query_map(rusqlite::params![meeting_id, speaker], row_to_transcript)?
                    .collect::<SqliteResult<Vec<_>>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM transcripts WHERE meeting_id = ?1 {}",
                    TRANSCRIPT_COLUMNS, order
                ))?;
                stmt.query_map([meeting_id], row_to_transcript)?
                    .collect::<SqliteResult<Vec<_>>>()?
            }
        };
        Ok(transcripts)
    }

    /// End time of the latest timed segment, used to place untimed live segments
    pub fn last_transcript_end(&self, meeting_id: i64) -> SqliteResult<Option<f64>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT MAX(COALESCE(end_time, start_time)) FROM transcripts WHERE meeting_id = ?1",
            [meeting_id],
            |row| row.get(0),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::models::{CreateMeetingRequest, NewTranscript};

    fn setup() -> (Database, i64) {
        let db = Database::in_memory().unwrap();
        let user = db.create_user("host@example.com", "Host", "h", "UTC").unwrap();
        let meeting = db
            .create_meeting(
                user.id,
                &CreateMeetingRequest {
                    title: "Design review".to_string(),
                    description: None,
                    scheduled_start: None,
                    scheduled_end: None,
                    meeting_url: None,
                    agent_id: None,
                    participants: vec![],
                },
            )
            .unwrap();
        (db, meeting.id)
    }

    fn segment(speaker: &str, content: &str, start: Option<f64>) -> NewTranscript {
        NewTranscript {
            speaker: speaker.to_string(),
            content: content.to_string(),
            start_time: start,
            end_time: start.map(|s| s + 4.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_transcripts_ordered_by_start_time() {
        let (db, meeting_id) = setup();
        db.add_transcript(meeting_id, &segment("Ana", "second", Some(10.0))).unwrap();
        db.add_transcript(meeting_id, &segment("Ben", "first", Some(2.0))).unwrap();
        db.add_transcript(meeting_id, &segment("Ana", "untimed", None)).unwrap();

        let all = db.list_transcripts(meeting_id, None).unwrap();
        let contents: Vec<&str> = all.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "untimed"]);

        let ana = db.list_transcripts(meeting_id, Some("Ana")).unwrap();
        assert_eq!(ana.len(), 2);
    }

    #[test]
    fn test_last_transcript_end() {
        let (db, meeting_id) = setup();
        assert_eq!(db.last_transcript_end(meeting_id).unwrap(), None);
        db.add_transcript(meeting_id, &segment("Ana", "hello", Some(3.0))).unwrap();
        assert_eq!(db.last_transcript_end(meeting_id).unwrap(), Some(7.0));
    }

    #[test]
    fn test_transcripts_removed_with_meeting() {
        let (db, meeting_id) = setup();
        db.add_transcript(meeting_id, &segment("Ana", "hello", None)).unwrap();
        let user = db.get_user_by_email("host@example.com").unwrap().unwrap();
        assert!(db.delete_meeting(meeting_id, user.id).unwrap());
        assert!(db.list_transcripts(meeting_id, None).unwrap().is_empty());
    }
}
