use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeakerStats {
    pub segments: i64,
    pub words: i64,
    pub talk_seconds: f64,
}

/// Per-meeting metrics, computed after a meeting completes or on request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingAnalytics {
    pub id: i64,
    pub meeting_id: i64,
    pub user_id: i64,
    pub duration_minutes: f64,
    pub participant_count: i64,
    pub transcript_segments: i64,
    pub word_count: i64,
    pub agent_interventions: i64,
    pub speaker_stats: BTreeMap<String, SpeakerStats>,
    pub action_item_count: i64,
    pub engagement_score: f64,
    pub computed_at: DateTime<Utc>,
}

/// Computed metrics before they are stored
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsSnapshot {
    pub duration_minutes: f64,
    pub participant_count: i64,
    pub transcript_segments: i64,
    pub word_count: i64,
    pub agent_interventions: i64,
    pub speaker_stats: BTreeMap<String, SpeakerStats>,
    pub action_item_count: i64,
    pub engagement_score: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ActionItemCounts {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EmailCounts {
    pub draft: i64,
    pub sent: i64,
    pub failed: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalyticsOverview {
    pub total_meetings: i64,
    pub meetings_by_status: BTreeMap<String, i64>,
    pub total_meeting_minutes: f64,
    pub average_meeting_minutes: f64,
    pub action_items: ActionItemCounts,
    pub emails: EmailCounts,
    pub active_agents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub meetings: i64,
    pub minutes: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentPerformance {
    pub agent_id: i64,
    pub name: String,
    pub agent_type: String,
    pub is_active: bool,
    pub meetings_assigned: i64,
    pub meetings_completed: i64,
    pub interventions: i64,
}

pub const DEFAULT_TREND_DAYS: i64 = 30;
pub const MAX_TREND_DAYS: i64 = 365;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrendQuery {
    pub days: Option<i64>,
}
