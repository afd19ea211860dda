//! Meeting workflows shared by the REST controllers and the WebSocket gateway

pub mod analytics;
pub mod follow_up;
pub mod meetings;
pub mod post_meeting;
pub mod transcripts;

use std::sync::Arc;

use crate::ai::{AgentResponder, ExtractiveSummarizer, KeywordResponder, MockTranscriber, Summarizer, Transcriber};
use crate::integrations::{CalendarProvider, EmailSender, MockCalendar, MockMailer};

/// External intelligence and delivery backends
pub struct Providers {
    pub transcriber: Arc<dyn Transcriber>,
    pub summarizer: Arc<dyn Summarizer>,
    pub responder: Arc<dyn AgentResponder>,
    pub calendar: Arc<dyn CalendarProvider>,
    pub mailer: Arc<dyn EmailSender>,
}

impl Providers {
    /// Local stand-ins for every backend
    pub fn mock() -> Self {
        Self {
            transcriber: Arc::new(MockTranscriber),
            summarizer: Arc::new(ExtractiveSummarizer),
            responder: Arc::new(KeywordResponder),
            calendar: Arc::new(MockCalendar),
            mailer: Arc::new(MockMailer),
        }
    }
}
