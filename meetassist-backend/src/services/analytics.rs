use std::collections::{BTreeMap, HashSet};

use rusqlite::Result as SqliteResult;

use crate::db::Database;
use crate::models::{AnalyticsSnapshot, Meeting, MeetingAnalytics, Participant, SpeakerStats, Transcript};

const MAX_ENGAGEMENT: f64 = 100.0;

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// min(100, 10·participants + 2·segments/max(1, minutes) + 5·action_items)
pub fn engagement_score(participants: i64, segments: i64, minutes: f64, action_items: i64) -> f64 {
    let score = 10.0 * participants as f64
        + 2.0 * segments as f64 / minutes.max(1.0)
        + 5.0 * action_items as f64;
    round1(score.min(MAX_ENGAGEMENT))
}

pub fn compute_snapshot(
    meeting: &Meeting,
    participants: &[Participant],
    transcripts: &[Transcript],
    action_item_count: i64,
) -> AnalyticsSnapshot {
    // Fall back to the transcript span when the meeting has no recorded run
    let duration_minutes = meeting.duration_minutes().unwrap_or_else(|| {
        transcripts
            .iter()
            .filter_map(|t| t.end_time.or(t.start_time))
            .fold(0.0_f64, f64::max)
            / 60.0
    });

    let mut speaker_stats: BTreeMap<String, SpeakerStats> = BTreeMap::new();
    for t in transcripts {
        let stats = speaker_stats.entry(t.speaker.clone()).or_default();
        stats.segments += 1;
        stats.words += t.word_count() as i64;
        stats.talk_seconds += t.talk_seconds();
    }
    for stats in speaker_stats.values_mut() {
        stats.talk_seconds = round1(stats.talk_seconds);
    }

    let participant_count = if participants.is_empty() {
        transcripts
            .iter()
            .filter(|t| !t.is_agent)
            .map(|t| t.speaker.as_str())
            .collect::<HashSet<_>>()
            .len() as i64
    } else {
        participants.len() as i64
    };

    let transcript_segments = transcripts.len() as i64;
    AnalyticsSnapshot {
        duration_minutes: round1(duration_minutes),
        participant_count,
        transcript_segments,
        word_count: transcripts.iter().map(|t| t.word_count() as i64).sum(),
        agent_interventions: transcripts.iter().filter(|t| t.is_agent).count() as i64,
        speaker_stats,
        action_item_count,
        engagement_score: engagement_score(
            participant_count,
            transcript_segments,
            duration_minutes,
            action_item_count,
        ),
    }
}

/// Recompute and store analytics for a meeting
pub fn refresh(db: &Database, meeting: &Meeting) -> SqliteResult<MeetingAnalytics> {
    let participants = db.list_participants(meeting.id)?;
    let transcripts = db.list_transcripts(meeting.id, None)?;
    let action_items = db.count_meeting_action_items(meeting.id)?;
    let snapshot = compute_snapshot(meeting, &participants, &transcripts, action_items);
    db.upsert_meeting_analytics(meeting.id, meeting.user_id, &snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MeetingStatus;
    use chrono::{Duration, Utc};

    #[test]
    fn test_round1() {
        assert_eq!(round1(12.345), 12.3);
        assert_eq!(round1(0.05), 0.1);
    }

    fn meeting(minutes: Option<i64>) -> Meeting {
        let start = Utc::now() - Duration::hours(2);
        Meeting {
            id: 1,
            user_id: 1,
            agent_id: None,
            title: "Retro".to_string(),
            description: None,
            status: MeetingStatus::Completed,
            scheduled_start: None,
            scheduled_end: None,
            actual_start: minutes.map(|_| start),
            actual_end: minutes.map(|m| start + Duration::minutes(m)),
            meeting_url: None,
            recording_url: None,
            calendar_event_id: None,
            created_at: start,
            updated_at: start,
        }
    }

    fn segment(speaker: &str, content: &str, span: Option<(f64, f64)>, is_agent: bool) -> Transcript {
        Transcript {
            id: 0,
            meeting_id: 1,
            speaker: speaker.to_string(),
            content: content.to_string(),
            start_time: span.map(|s| s.0),
            end_time: span.map(|s| s.1),
            confidence: None,
            is_agent,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_engagement_score_formula() {
        // 10*3 + 2*20/10 + 5*2 = 44
        assert_eq!(engagement_score(3, 20, 10.0, 2), 44.0);
        // minutes below one count as one
        assert_eq!(engagement_score(0, 3, 0.0, 0), 6.0);
        assert_eq!(engagement_score(12, 0, 30.0, 0), 100.0);
        assert_eq!(engagement_score(0, 1, 3.0, 0), 0.7);
    }

    #[test]
    fn test_snapshot_from_transcripts() {
        let transcripts = vec![
            segment("Ana", "hello there team", Some((0.0, 4.0)), false),
            segment("Ben", "hi", Some((4.0, 5.5)), false),
            segment("Ana", "let's start", None, false),
            segment("Scribe", "noted", None, true),
        ];
        let snapshot = compute_snapshot(&meeting(Some(30)), &[], &transcripts, 1);

        assert_eq!(snapshot.duration_minutes, 30.0);
        assert_eq!(snapshot.participant_count, 2);
        assert_eq!(snapshot.transcript_segments, 4);
        assert_eq!(snapshot.word_count, 7);
        assert_eq!(snapshot.agent_interventions, 1);
        assert_eq!(snapshot.speaker_stats["Ana"].segments, 2);
        assert_eq!(snapshot.speaker_stats["Ana"].talk_seconds, 4.0);
        assert_eq!(snapshot.speaker_stats["Ben"].talk_seconds, 1.5);
        // 10*2 + 2*4/30 + 5*1 = 25.27
        assert_eq!(snapshot.engagement_score, 25.3);
    }

    #[test]
    fn test_duration_falls_back_to_transcript_span() {
        let transcripts = vec![segment("Ana", "a", Some((0.0, 90.0)), false)];
        let snapshot = compute_snapshot(&meeting(None), &[], &transcripts, 0);
        assert_eq!(snapshot.duration_minutes, 1.5);
    }

    #[test]
    fn test_refresh_persists() {
        let db = Database::in_memory().unwrap();
        let user = db.create_user("a@example.com", "A", "h", "UTC").unwrap();
        let stored = db
            .create_meeting(user.id, &crate::models::CreateMeetingRequest {
                title: "Sync".to_string(),
                description: None,
                scheduled_start: None,
                scheduled_end: None,
                meeting_url: None,
                agent_id: None,
                participants: vec![],
            })
            .unwrap();
        db.add_transcript(stored.id, &crate::models::NewTranscript {
            speaker: "Ana".to_string(),
            content: "one two three".to_string(),
            ..Default::default()
        })
        .unwrap();

        let analytics = refresh(&db, &stored).unwrap();
        assert_eq!(analytics.meeting_id, stored.id);
        assert_eq!(analytics.word_count, 3);
        assert!(db.get_meeting_analytics(stored.id, user.id).unwrap().is_some());
    }
}
