use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptionResult {
    pub text: String,
    pub confidence: f64,
    pub duration_seconds: f64,
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<TranscriptionResult, String>;
}

const CANNED_PHRASES: &[&str] = &[
    "Let's review the status of the current sprint.",
    "I think we should revisit the timeline for the launch.",
    "Can everyone share their updates on the open tasks?",
    "We need to follow up with the design team by Friday.",
    "The budget numbers look good for this quarter.",
    "I will send the meeting notes to everyone after the call.",
];

/// 16 kHz mono 16-bit PCM
const BYTES_PER_SECOND: f64 = 32_000.0;

/// Offline stand-in: picks a canned phrase from the payload size
pub struct MockTranscriber;

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<TranscriptionResult, String> {
        if audio.is_empty() {
            return Err("Audio payload is empty".to_string());
        }
        let text = CANNED_PHRASES[audio.len() % CANNED_PHRASES.len()].to_string();
        let confidence = 0.85 + (audio.len() % 15) as f64 / 100.0;
        let duration_seconds = (audio.len() as f64 / BYTES_PER_SECOND).max(0.5);
        log::debug!("Mock transcription of {} bytes: {:?}", audio.len(), text);
        Ok(TranscriptionResult {
            text,
            confidence: (confidence * 100.0).round() / 100.0,
            duration_seconds,
        })
    }
}
