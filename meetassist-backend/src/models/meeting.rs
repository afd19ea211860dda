use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// What a calendar import did to the matching meeting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarSync {
    Imported,
    Updated,
    /// Already started, finished or cancelled, so calendar edits are ignored
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MeetingStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl MeetingStatus {
    /// Allowed lifecycle moves: scheduled -> in_progress -> completed,
    /// with cancellation possible until completion.
    pub fn can_transition_to(&self, next: MeetingStatus) -> bool {
        matches!(
            (self, next),
            (Self::Scheduled, Self::InProgress)
                | (Self::Scheduled, Self::Cancelled)
                | (Self::InProgress, Self::Completed)
                | (Self::InProgress, Self::Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn all() -> &'static [MeetingStatus] {
        &[Self::Scheduled, Self::InProgress, Self::Completed, Self::Cancelled]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: i64,
    pub user_id: i64,
    pub agent_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub status: MeetingStatus,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub meeting_url: Option<String>,
    pub recording_url: Option<String>,
    pub calendar_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    /// Minutes between actual start and end, if the meeting ran
    pub fn duration_minutes(&self) -> Option<f64> {
        match (self.actual_start, self.actual_end) {
            (Some(start), Some(end)) if end >= start => {
                Some((end - start).num_seconds() as f64 / 60.0)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MeetingDetail {
    #[serde(flatten)]
    pub meeting: Meeting,
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ParticipantRole {
    Host,
    #[default]
    Attendee,
    Agent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: i64,
    pub meeting_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub role: ParticipantRole,
    pub joined_at: Option<DateTime<Utc>>,
    pub left_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewParticipant {
    pub name: String,
    pub email: Option<String>,
    pub role: Option<ParticipantRole>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMeetingRequest {
    pub title: String,
    pub description: Option<String>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub meeting_url: Option<String>,
    pub agent_id: Option<i64>,
    #[serde(default)]
    pub participants: Vec<NewParticipant>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMeetingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub meeting_url: Option<String>,
    pub recording_url: Option<String>,
    pub agent_id: Option<i64>,
    pub status: Option<MeetingStatus>,
}

impl UpdateMeetingRequest {
    pub fn is_empty(&self) -> bool {
        !self.has_field_changes() && self.status.is_none()
    }

    /// Anything other than a status change
    pub fn has_field_changes(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.scheduled_start.is_some()
            || self.scheduled_end.is_some()
            || self.meeting_url.is_some()
            || self.recording_url.is_some()
            || self.agent_id.is_some()
    }
}

pub const DEFAULT_MEETING_PAGE: i64 = 50;
pub const MAX_MEETING_PAGE: i64 = 200;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeetingQuery {
    pub status: Option<MeetingStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl MeetingQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_MEETING_PAGE)
            .clamp(1, MAX_MEETING_PAGE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}
