use crate::models::{Meeting, MeetingStatus, Participant, Summary, Transcript};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event types for gateway broadcasts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    // Presence events
    ParticipantJoined,
    ParticipantLeft,
    // Live transcript events
    TranscriptionUpdate,
    // Agent events
    AgentResponse,
    AgentStatus,
    // Lifecycle events
    MeetingStatusChanged,
    SummaryReady,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParticipantJoined => "participant_joined",
            Self::ParticipantLeft => "participant_left",
            Self::TranscriptionUpdate => "transcription_update",
            Self::AgentResponse => "agent_response",
            Self::AgentStatus => "agent_status",
            Self::MeetingStatusChanged => "meeting_status_changed",
            Self::SummaryReady => "summary_ready",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        event_type.as_str().to_string()
    }
}

/// JSON-RPC request from client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// JSON-RPC response to client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(id: String, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: String, error: RpcError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error() -> Self {
        Self::new(-32700, "Parse error")
    }

    pub fn method_not_found() -> Self {
        Self::new(-32601, "Method not found")
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(-32602, message)
    }

    /// Request understood but refused by meeting rules
    pub fn domain(message: impl Into<String>) -> Self {
        Self::new(-32000, message)
    }
}

impl From<crate::error::ApiError> for RpcError {
    fn from(err: crate::error::ApiError) -> Self {
        if let crate::error::ApiError::Internal(detail) = &err {
            log::error!("Gateway internal error: {}", detail);
        }
        Self::domain(err.public_message())
    }
}

/// Server-push event to subscribed clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEvent {
    #[serde(rename = "type")]
    pub type_: String,
    pub event: String,
    pub data: Value,
}

impl GatewayEvent {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            type_: "event".to_string(),
            event: event.into(),
            data,
        }
    }

    pub fn participant_joined(meeting_id: i64, user_id: i64, name: &str, participants: &[Participant]) -> Self {
        Self::new(
            EventType::ParticipantJoined,
            serde_json::json!({
                "meeting_id": meeting_id,
                "user_id": user_id,
                "name": name,
                "participants": participants
            }),
        )
    }

    pub fn participant_left(meeting_id: i64, user_id: i64, name: &str) -> Self {
        Self::new(
            EventType::ParticipantLeft,
            serde_json::json!({
                "meeting_id": meeting_id,
                "user_id": user_id,
                "name": name
            }),
        )
    }

    pub fn transcription_update(transcript: &Transcript) -> Self {
        Self::new(
            EventType::TranscriptionUpdate,
            serde_json::json!({
                "meeting_id": transcript.meeting_id,
                "transcript": transcript
            }),
        )
    }

    pub fn agent_response(agent_id: i64, keyword: &str, transcript: &Transcript) -> Self {
        Self::new(
            EventType::AgentResponse,
            serde_json::json!({
                "meeting_id": transcript.meeting_id,
                "agent_id": agent_id,
                "keyword": keyword,
                "transcript": transcript
            }),
        )
    }

    pub fn agent_status(meeting_id: i64, agent_id: i64, status: &str) -> Self {
        Self::new(
            EventType::AgentStatus,
            serde_json::json!({
                "meeting_id": meeting_id,
                "agent_id": agent_id,
                "status": status
            }),
        )
    }

    pub fn meeting_status_changed(meeting: &Meeting, previous: MeetingStatus) -> Self {
        Self::new(
            EventType::MeetingStatusChanged,
            serde_json::json!({
                "meeting_id": meeting.id,
                "previous_status": previous,
                "status": meeting.status,
                "meeting": meeting
            }),
        )
    }

    pub fn summary_ready(summary: &Summary) -> Self {
        Self::new(
            EventType::SummaryReady,
            serde_json::json!({
                "meeting_id": summary.meeting_id,
                "summary": summary
            }),
        )
    }
}
