use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One spoken segment of a meeting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub id: i64,
    pub meeting_id: i64,
    pub speaker: String,
    pub content: String,
    /// Seconds from meeting start
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub confidence: Option<f64>,
    pub is_agent: bool,
    pub created_at: DateTime<Utc>,
}

impl Transcript {
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }

    pub fn talk_seconds(&self) -> f64 {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) if end > start => end - start,
            _ => 0.0,
        }
    }
}

/// Insert payload shared by REST, WebSocket and agent replies
#[derive(Debug, Clone, Default)]
pub struct NewTranscript {
    pub speaker: String,
    pub content: String,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub confidence: Option<f64>,
    pub is_agent: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTranscriptRequest {
    pub speaker: String,
    pub content: Option<String>,
    /// Raw audio, routed through speech-to-text when `content` is absent
    pub audio_base64: Option<String>,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptQuery {
    pub speaker: Option<String>,
}
