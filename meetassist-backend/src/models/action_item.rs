use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionItemStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl ActionItemStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionItem {
    pub id: i64,
    pub meeting_id: Option<i64>,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub status: ActionItemStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Action item as produced by extraction, before it has an owner
#[derive(Debug, Clone, PartialEq)]
pub struct ActionItemDraft {
    pub title: String,
    pub assignee: Option<String>,
    pub priority: Priority,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateActionItemRequest {
    pub title: String,
    pub description: Option<String>,
    pub meeting_id: Option<i64>,
    pub assignee: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub status: Option<ActionItemStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateActionItemRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub status: Option<ActionItemStatus>,
}

impl UpdateActionItemRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.assignee.is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
            && self.status.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionItemQuery {
    pub status: Option<ActionItemStatus>,
    pub priority: Option<Priority>,
    pub meeting_id: Option<i64>,
    pub assignee: Option<String>,
}
