use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub id: i64,
    pub meeting_id: i64,
    pub content: String,
    pub key_points: Vec<String>,
    pub decisions: Vec<String>,
    pub topics: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Summary content before it is stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryDraft {
    pub content: String,
    pub key_points: Vec<String>,
    pub decisions: Vec<String>,
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSummaryRequest {
    pub content: Option<String>,
    pub key_points: Option<Vec<String>>,
    pub decisions: Option<Vec<String>>,
    pub topics: Option<Vec<String>>,
}

impl UpdateSummaryRequest {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.key_points.is_none()
            && self.decisions.is_none()
            && self.topics.is_none()
    }
}
