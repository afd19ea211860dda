//! Follow-up email database operations

use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, Result as SqliteResult};

use crate::models::{EmailStatus, FollowUpEmail, FollowUpEmailQuery, UpdateFollowUpEmailRequest};
use super::super::sqlite::{enum_column, json_list, opt_timestamp, timestamp, to_json_list, UpdateSet};
use super::super::Database;

const EMAIL_COLUMNS: &str =
    "id, meeting_id, user_id, subject, body, recipients, status, sent_at, created_at, updated_at";

fn row_to_email(row: &rusqlite::Row) -> SqliteResult<FollowUpEmail> {
    Ok(FollowUpEmail {
        id: row.get(0)?,
        meeting_id: row.get(1)?,
        user_id: row.get(2)?,
        subject: row.get(3)?,
        body: row.get(4)?,
        recipients: json_list(row, 5)?,
        status: enum_column(row, 6)?,
        sent_at: opt_timestamp(row, 7)?,
        created_at: timestamp(row, 8)?,
        updated_at: timestamp(row, 9)?,
    })
}

impl Database {
    /// Create a draft email
    pub fn create_follow_up_email(
        &self,
        user_id: i64,
        meeting_id: i64,
        subject: &str,
        body: &str,
        recipients: &[String],
    ) -> SqliteResult<FollowUpEmail> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO follow_up_emails (meeting_id, user_id, subject, body, recipients, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            rusqlite::params![
                meeting_id,
                user_id,
                subject.trim(),
                body,
                to_json_list(recipients),
                EmailStatus::Draft.as_ref(),
                &now,
            ],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_follow_up_email(id, user_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    pub fn get_follow_up_email(&self, id: i64, user_id: i64) -> SqliteResult<Option<FollowUpEmail>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {} FROM follow_up_emails WHERE id = ?1 AND user_id = ?2", EMAIL_COLUMNS),
            [id, user_id],
            row_to_email,
        )
        .optional()
    }

    pub fn list_follow_up_emails(&self, user_id: i64, query: &FollowUpEmailQuery) -> SqliteResult<Vec<FollowUpEmail>> {
        let mut sql = format!("SELECT {} FROM follow_up_emails WHERE user_id = ?1", EMAIL_COLUMNS);
        let mut values: Vec<Value> = vec![Value::Integer(user_id)];

        if let Some(meeting_id) = query.meeting_id {
            values.push(Value::Integer(meeting_id));
            sql.push_str(&format!(" AND meeting_id = ?{}", values.len()));
        }
        if let Some(status) = query.status {
            values.push(Value::Text(status.as_ref().to_string()));
            sql.push_str(&format!(" AND status = ?{}", values.len()));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let emails = stmt
            .query_map(rusqlite::params_from_iter(values), row_to_email)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(emails)
    }

    pub fn update_follow_up_email(
        &self,
        id: i64,
        user_id: i64,
        request: &UpdateFollowUpEmailRequest,
    ) -> SqliteResult<Option<FollowUpEmail>> {
        let mut set = UpdateSet::new();
        set.set_opt("subject", request.subject.as_ref().map(|s| s.trim().to_string()));
        set.set_opt("body", request.body.clone());
        set.set_opt("recipients", request.recipients.as_ref().map(|r| to_json_list(r)));

        if !set.is_empty() {
            let conn = self.conn();
            set.execute(&conn, "follow_up_emails", &[("id", id), ("user_id", user_id)])?;
        }
        self.get_follow_up_email(id, user_id)
    }

    /// Record a delivery outcome
    pub fn set_follow_up_email_status(
        &self,
        id: i64,
        user_id: i64,
        status: EmailStatus,
    ) -> SqliteResult<Option<FollowUpEmail>> {
        let mut set = UpdateSet::new();
        set.set("status", status.as_ref().to_string());
        if status == EmailStatus::Sent {
            set.set("sent_at", Utc::now().to_rfc3339());
        }
        {
            let conn = self.conn();
            set.execute(&conn, "follow_up_emails", &[("id", id), ("user_id", user_id)])?;
        }
        self.get_follow_up_email(id, user_id)
    }

    pub fn delete_follow_up_email(&self, id: i64, user_id: i64) -> SqliteResult<bool> {
        let conn = self.conn();
        let rows = conn.execute(
            "DELETE FROM follow_up_emails WHERE id = ?1 AND user_id = ?2",
            [id, user_id],
        )?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::models::{CreateMeetingRequest, EmailStatus, FollowUpEmailQuery, UpdateFollowUpEmailRequest};

    fn setup() -> (Database, i64, i64) {
        let db = Database::in_memory().unwrap();
        let user = db.create_user("host@example.com", "Host", "h", "UTC").unwrap();
        let meeting = db
            .create_meeting(
                user.id,
                &CreateMeetingRequest {
                    title: "Client call".to_string(),
                    description: None,
                    scheduled_start: None,
                    scheduled_end: None,
                    meeting_url: None,
                    agent_id: None,
                    participants: vec![],
                },
            )
            .unwrap();
        (db, user.id, meeting.id)
    }

    #[test]
    fn test_draft_lifecycle() {
        let (db, user_id, meeting_id) = setup();
        let recipients = vec!["client@example.com".to_string()];
        let email = db
            .create_follow_up_email(user_id, meeting_id, "Recap", "Thanks all", &recipients)
            .unwrap();
        assert_eq!(email.status, EmailStatus::Draft);
        assert_eq!(email.recipients, recipients);
        assert!(email.sent_at.is_none());

        let edited = db
            .update_follow_up_email(email.id, user_id, &UpdateFollowUpEmailRequest {
                subject: Some("Recap: client call".to_string()),
                ..Default::default()
            })
            .unwrap()
            .unwrap();
        assert_eq!(edited.subject, "Recap: client call");

        let sent = db
            .set_follow_up_email_status(email.id, user_id, EmailStatus::Sent)
            .unwrap()
            .unwrap();
        assert_eq!(sent.status, EmailStatus::Sent);
        assert!(sent.sent_at.is_some());
    }

    #[test]
    fn test_list_filters() {
        let (db, user_id, meeting_id) = setup();
        let a = db.create_follow_up_email(user_id, meeting_id, "A", "a", &[]).unwrap();
        db.create_follow_up_email(user_id, meeting_id, "B", "b", &[]).unwrap();
        db.set_follow_up_email_status(a.id, user_id, EmailStatus::Failed).unwrap();

        let failed = db
            .list_follow_up_emails(user_id, &FollowUpEmailQuery {
                status: Some(EmailStatus::Failed),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].subject, "A");

        let for_meeting = db
            .list_follow_up_emails(user_id, &FollowUpEmailQuery {
                meeting_id: Some(meeting_id),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(for_meeting.len(), 2);
    }

    #[test]
    fn test_delete_twice() {
        let (db, user_id, meeting_id) = setup();
        let email = db.create_follow_up_email(user_id, meeting_id, "A", "a", &[]).unwrap();
        assert!(db.delete_follow_up_email(email.id, user_id).unwrap());
        assert!(!db.delete_follow_up_email(email.id, user_id).unwrap());
    }
}
