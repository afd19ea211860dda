//! Meeting analytics rows and dashboard aggregates

use chrono::{NaiveDate, Utc};
use rusqlite::{OptionalExtension, Result as SqliteResult};
use std::collections::BTreeMap;

use crate::models::{
    ActionItemCounts, AgentPerformance, AnalyticsOverview, AnalyticsSnapshot, EmailCounts,
    MeetingAnalytics, MeetingStatus, SpeakerStats, TrendPoint,
};
use super::super::sqlite::timestamp;
use crate::services::analytics::round1;
use super::super::Database;

const ANALYTICS_COLUMNS: &str = "id, meeting_id, user_id, duration_minutes, participant_count, \
     transcript_segments, word_count, agent_interventions, speaker_stats, action_item_count, \
     engagement_score, computed_at";

/// Minutes between actual start and end, SQL side
const DURATION_MINUTES_SQL: &str =
    "(julianday(actual_end) - julianday(actual_start)) * 1440.0";

fn row_to_analytics(row: &rusqlite::Row) -> SqliteResult<MeetingAnalytics> {
    let stats_json: String = row.get(8)?;
    let speaker_stats: BTreeMap<String, SpeakerStats> =
        serde_json::from_str(&stats_json).unwrap_or_default();
    Ok(MeetingAnalytics {
        id: row.get(0)?,
        meeting_id: row.get(1)?,
        user_id: row.get(2)?,
        duration_minutes: row.get(3)?,
        participant_count: row.get(4)?,
        transcript_segments: row.get(5)?,
        word_count: row.get(6)?,
        agent_interventions: row.get(7)?,
        speaker_stats,
        action_item_count: row.get(9)?,
        engagement_score: row.get(10)?,
        computed_at: timestamp(row, 11)?,
    })
}

/// Count rows grouped by a status column into a map
fn status_counts(
    conn: &rusqlite::Connection,
    table: &str,
    user_id: i64,
) -> SqliteResult<BTreeMap<String, i64>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT status, COUNT(*) FROM {} WHERE user_id = ?1 GROUP BY status",
        table
    ))?;
    let counts = stmt
        .query_map([user_id], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<SqliteResult<BTreeMap<_, _>>>()?;
    Ok(counts)
}

impl Database {
    pub fn get_meeting_analytics(&self, meeting_id: i64, user_id: i64) -> SqliteResult<Option<MeetingAnalytics>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {} FROM meeting_analytics WHERE meeting_id = ?1 AND user_id = ?2",
                ANALYTICS_COLUMNS
            ),
            [meeting_id, user_id],
            row_to_analytics,
        )
        .optional()
    }

    pub fn upsert_meeting_analytics(
        &self,
        meeting_id: i64,
        user_id: i64,
        snapshot: &AnalyticsSnapshot,
    ) -> SqliteResult<MeetingAnalytics> {
        let conn = self.conn();
        let stats_json = serde_json::to_string(&snapshot.speaker_stats).unwrap_or_else(|_| "{}".to_string());
        conn.execute(
            "INSERT INTO meeting_analytics (meeting_id, user_id, duration_minutes, participant_count,
                 transcript_segments, word_count, agent_interventions, speaker_stats,
                 action_item_count, engagement_score, computed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(meeting_id) DO UPDATE SET
                 duration_minutes = excluded.duration_minutes,
                 participant_count = excluded.participant_count,
                 transcript_segments = excluded.transcript_segments,
                 word_count = excluded.word_count,
                 agent_interventions = excluded.agent_interventions,
                 speaker_stats = excluded.speaker_stats,
                 action_item_count = excluded.action_item_count,
                 engagement_score = excluded.engagement_score,
                 computed_at = excluded.computed_at",
            rusqlite::params![
                meeting_id,
                user_id,
                snapshot.duration_minutes,
                snapshot.participant_count,
                snapshot.transcript_segments,
                snapshot.word_count,
                snapshot.agent_interventions,
                stats_json,
                snapshot.action_item_count,
                snapshot.engagement_score,
                Utc::now().to_rfc3339(),
            ],
        )?;
        drop(conn);

        self.get_meeting_analytics(meeting_id, user_id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    pub fn count_meeting_action_items(&self, meeting_id: i64) -> SqliteResult<i64> {
        let conn = self.conn();
        conn.query_row(
            "SELECT COUNT(*) FROM action_items WHERE meeting_id = ?1",
            [meeting_id],
            |row| row.get(0),
        )
    }

    pub fn analytics_overview(&self, user_id: i64) -> SqliteResult<AnalyticsOverview> {
        let active_agents = self.count_active_agents(user_id)?;
        let conn = self.conn();

        let mut meetings_by_status = status_counts(&conn, "meetings", user_id)?;
        for status in MeetingStatus::all() {
            meetings_by_status.entry(status.as_ref().to_string()).or_insert(0);
        }
        let total_meetings = meetings_by_status.values().sum();

        let (total_minutes, completed_with_times): (f64, i64) = conn.query_row(
            &format!(
                "SELECT COALESCE(SUM({d}), 0.0), COUNT(*) FROM meetings
                 WHERE user_id = ?1 AND status = 'completed'
                   AND actual_start IS NOT NULL AND actual_end IS NOT NULL",
                d = DURATION_MINUTES_SQL
            ),
            [user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let items = status_counts(&conn, "action_items", user_id)?;
        let count = |map: &BTreeMap<String, i64>, key: &str| map.get(key).copied().unwrap_or(0);
        let total_items: i64 = items.values().sum();
        let completed_items = count(&items, "completed");
        let action_items = ActionItemCounts {
            total: total_items,
            pending: count(&items, "pending"),
            in_progress: count(&items, "in_progress"),
            completed: completed_items,
            cancelled: count(&items, "cancelled"),
            completion_rate: if total_items > 0 {
                round1(completed_items as f64 * 100.0 / total_items as f64)
            } else {
                0.0
            },
        };

        let emails = status_counts(&conn, "follow_up_emails", user_id)?;
        let emails = EmailCounts {
            draft: count(&emails, "draft"),
            sent: count(&emails, "sent"),
            failed: count(&emails, "failed"),
        };

        Ok(AnalyticsOverview {
            total_meetings,
            meetings_by_status,
            total_meeting_minutes: round1(total_minutes),
            average_meeting_minutes: if completed_with_times > 0 {
                round1(total_minutes / completed_with_times as f64)
            } else {
                0.0
            },
            action_items,
            emails,
            active_agents,
        })
    }

    /// Per-day meeting counts for `since..=until`, cancelled meetings excluded
    pub fn meeting_trends(&self, user_id: i64, since: NaiveDate, until: NaiveDate) -> SqliteResult<Vec<TrendPoint>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {day} AS day,
                    COUNT(*),
                    COALESCE(SUM(CASE WHEN actual_start IS NOT NULL AND actual_end IS NOT NULL
                                      THEN {d} ELSE 0 END), 0.0)
             FROM meetings
             WHERE user_id = ?1 AND status != 'cancelled' AND {day} >= ?2 AND {day} <= ?3
             GROUP BY day ORDER BY day",
            day = "substr(COALESCE(actual_start, scheduled_start, created_at), 1, 10)",
            d = DURATION_MINUTES_SQL
        ))?;
        let rows = stmt
            .query_map(
                rusqlite::params![
                    user_id,
                    since.format("%Y-%m-%d").to_string(),
                    until.format("%Y-%m-%d").to_string()
                ],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, f64>(2)?,
                    ))
                },
            )?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(day, meetings, minutes)| {
                NaiveDate::parse_from_str(&day, "%Y-%m-%d").ok().map(|date| TrendPoint {
                    date,
                    meetings,
                    minutes: round1(minutes),
                })
            })
            .collect())
    }

    pub fn agent_performance(&self, user_id: i64) -> SqliteResult<Vec<AgentPerformance>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT a.id, a.name, a.agent_type, a.is_active,
                    (SELECT COUNT(*) FROM meetings m WHERE m.agent_id = a.id),
                    (SELECT COUNT(*) FROM meetings m WHERE m.agent_id = a.id AND m.status = 'completed'),
                    (SELECT COUNT(*) FROM transcripts t JOIN meetings m ON t.meeting_id = m.id
                      WHERE m.agent_id = a.id AND t.is_agent = 1)
             FROM agents a WHERE a.user_id = ?1 ORDER BY a.name",
        )?;
        let rows = stmt
            .query_map([user_id], |row| {
                let is_active: i64 = row.get(3)?;
                Ok(AgentPerformance {
                    agent_id: row.get(0)?,
                    name: row.get(1)?,
                    agent_type: row.get(2)?,
                    is_active: is_active != 0,
                    meetings_assigned: row.get(4)?,
                    meetings_completed: row.get(5)?,
                    interventions: row.get(6)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::db::Database;
    use crate::models::{
        ActionItemStatus, AnalyticsSnapshot, CreateActionItemRequest, CreateMeetingRequest,
        EmailStatus, MeetingStatus, SpeakerStats,
    };

    fn meeting(db: &Database, user_id: i64, title: &str) -> i64 {
        db.create_meeting(
            user_id,
            &CreateMeetingRequest {
                title: title.to_string(),
                description: None,
                scheduled_start: Some(Utc::now() - Duration::days(1)),
                scheduled_end: None,
                meeting_url: None,
                agent_id: None,
                participants: vec![],
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn test_overview_empty_user() {
        let db = Database::in_memory().unwrap();
        let user = db.create_user("a@example.com", "A", "h", "UTC").unwrap();
        let overview = db.analytics_overview(user.id).unwrap();

        assert_eq!(overview.total_meetings, 0);
        assert_eq!(overview.meetings_by_status.get("scheduled"), Some(&0));
        assert_eq!(overview.action_items.completion_rate, 0.0);
        assert_eq!(overview.average_meeting_minutes, 0.0);
    }

    #[test]
    fn test_overview_counts() {
        let db = Database::in_memory().unwrap();
        let user = db.create_user("a@example.com", "A", "h", "UTC").unwrap();
        let done = meeting(&db, user.id, "Done");
        meeting(&db, user.id, "Later");
        db.set_meeting_status(done, user.id, MeetingStatus::InProgress).unwrap();
        db.set_meeting_status(done, user.id, MeetingStatus::Completed).unwrap();

        for (title, status) in [("a", ActionItemStatus::Completed), ("b", ActionItemStatus::Pending)] {
            db.create_action_item(user.id, &CreateActionItemRequest {
                title: title.to_string(),
                description: None,
                meeting_id: Some(done),
                assignee: None,
                due_date: None,
                priority: None,
                status: Some(status),
            })
            .unwrap();
        }
        let email = db.create_follow_up_email(user.id, done, "s", "b", &[]).unwrap();
        db.set_follow_up_email_status(email.id, user.id, EmailStatus::Sent).unwrap();

        let overview = db.analytics_overview(user.id).unwrap();
        assert_eq!(overview.total_meetings, 2);
        assert_eq!(overview.meetings_by_status.get("completed"), Some(&1));
        assert_eq!(overview.action_items.total, 2);
        assert_eq!(overview.action_items.completion_rate, 50.0);
        assert_eq!(overview.emails.sent, 1);
        assert_eq!(db.count_meeting_action_items(done).unwrap(), 2);
    }

    #[test]
    fn test_trends_group_by_day() {
        let db = Database::in_memory().unwrap();
        let user = db.create_user("a@example.com", "A", "h", "UTC").unwrap();
        meeting(&db, user.id, "One");
        meeting(&db, user.id, "Two");
        let cancelled = meeting(&db, user.id, "Gone");
        db.set_meeting_status(cancelled, user.id, MeetingStatus::Cancelled).unwrap();

        let today = Utc::now().date_naive();
        let since = today - Duration::days(7);
        let trends = db.meeting_trends(user.id, since, today).unwrap();
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].meetings, 2);

        let future = today + Duration::days(3);
        assert!(db.meeting_trends(user.id, future, future).unwrap().is_empty());
    }

    #[test]
    fn test_trends_stop_at_until() {
        let db = Database::in_memory().unwrap();
        let user = db.create_user("a@example.com", "A", "h", "UTC").unwrap();
        meeting(&db, user.id, "Yesterday");
        db.create_meeting(user.id, &CreateMeetingRequest {
            title: "Next week".to_string(),
            description: None,
            scheduled_start: Some(Utc::now() + Duration::days(5)),
            scheduled_end: None,
            meeting_url: None,
            agent_id: None,
            participants: vec![],
        })
        .unwrap();

        let today = Utc::now().date_naive();
        let trends = db.meeting_trends(user.id, today - Duration::days(29), today).unwrap();
        assert_eq!(trends.len(), 1);
        assert!(trends.iter().all(|p| p.date <= today));
    }

    #[test]
    fn test_analytics_upsert_roundtrip() {
        let db = Database::in_memory().unwrap();
        let user = db.create_user("a@example.com", "A", "h", "UTC").unwrap();
        let id = meeting(&db, user.id, "Stats");
        let mut snapshot = AnalyticsSnapshot {
            participant_count: 3,
            transcript_segments: 10,
            ..Default::default()
        };
        snapshot.speaker_stats.insert("Ana".to_string(), SpeakerStats {
            segments: 6,
            words: 120,
            talk_seconds: 95.5,
        });

        let first = db.upsert_meeting_analytics(id, user.id, &snapshot).unwrap();
        snapshot.participant_count = 4;
        let second = db.upsert_meeting_analytics(id, user.id, &snapshot).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.participant_count, 4);
        assert_eq!(second.speaker_stats["Ana"].words, 120);

        let other = db.create_user("b@example.com", "B", "h", "UTC").unwrap();
        assert!(db.get_meeting_analytics(id, other.id).unwrap().is_none());
    }

    #[test]
    fn test_agent_performance_counts() {
        let db = Database::in_memory().unwrap();
        let user = db.create_user("a@example.com", "A", "h", "UTC").unwrap();
        let agent = db
            .create_agent(user.id, &crate::models::CreateAgentRequest {
                name: "Scribe".to_string(),
                description: None,
                agent_type: None,
                instructions: None,
                trigger_keywords: vec![],
                response_templates: vec![],
                is_active: None,
            })
            .unwrap();
        let id = meeting(&db, user.id, "With agent");
        db.update_meeting(id, user.id, &crate::models::UpdateMeetingRequest {
            agent_id: Some(agent.id),
            ..Default::default()
        })
        .unwrap();
        db.add_transcript(id, &crate::models::NewTranscript {
            speaker: "Scribe".to_string(),
            content: "Noted".to_string(),
            is_agent: true,
            ..Default::default()
        })
        .unwrap();

        let perf = db.agent_performance(user.id).unwrap();
        assert_eq!(perf.len(), 1);
        assert_eq!(perf[0].meetings_assigned, 1);
        assert_eq!(perf[0].meetings_completed, 0);
        assert_eq!(perf[0].interventions, 1);
    }
}
