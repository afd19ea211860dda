use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EmailStatus {
    #[default]
    Draft,
    Sent,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpEmail {
    pub id: i64,
    pub meeting_id: i64,
    pub user_id: i64,
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
    pub status: EmailStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFollowUpEmailRequest {
    pub meeting_id: i64,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFollowUpEmailRequest {
    pub subject: Option<String>,
    pub body: Option<String>,
    pub recipients: Option<Vec<String>>,
}

impl UpdateFollowUpEmailRequest {
    pub fn is_empty(&self) -> bool {
        self.subject.is_none() && self.body.is_none() && self.recipients.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FollowUpEmailQuery {
    pub meeting_id: Option<i64>,
    pub status: Option<EmailStatus>,
}
