//! RPC methods a meeting client can call over the socket

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::agent_sessions::AgentAction;
use super::protocol::{GatewayEvent, RpcError, RpcRequest, RpcResponse};
use crate::error::ApiError;
use crate::models::{Meeting, MeetingStatus, NewTranscript, User};
use crate::services::{meetings, transcripts};
use crate::AppState;

/// Available RPC methods
pub enum RpcMethod {
    JoinMeeting,
    LeaveMeeting,
    TranscriptionUpdate,
    AgentControl,
    MeetingStatusChange,
}

impl RpcMethod {
    pub fn from_str(method: &str) -> Option<Self> {
        match method {
            "join_meeting" => Some(Self::JoinMeeting),
            "leave_meeting" => Some(Self::LeaveMeeting),
            "transcription_update" => Some(Self::TranscriptionUpdate),
            "agent_control" => Some(Self::AgentControl),
            "meeting_status_change" => Some(Self::MeetingStatusChange),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MeetingParams {
    meeting_id: i64,
}

#[derive(Debug, Deserialize)]
struct TranscriptionParams {
    meeting_id: i64,
    speaker: Option<String>,
    content: String,
    start_time: Option<f64>,
    end_time: Option<f64>,
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AgentControlParams {
    meeting_id: i64,
    action: String,
}

#[derive(Debug, Deserialize)]
struct StatusChangeParams {
    meeting_id: i64,
    status: MeetingStatus,
}

type MethodResult = Result<Value, RpcError>;

/// Route one request from an authenticated connection
pub async fn dispatch(state: &AppState, client_id: &str, user: &User, request: RpcRequest) -> RpcResponse {
    let RpcRequest { id, method, params } = request;

    let result = match RpcMethod::from_str(&method) {
        Some(RpcMethod::JoinMeeting) => join_meeting(state, client_id, user, params),
        Some(RpcMethod::LeaveMeeting) => leave_meeting(state, client_id, user, params),
        Some(RpcMethod::TranscriptionUpdate) => transcription_update(state, client_id, user, params).await,
        Some(RpcMethod::AgentControl) => agent_control(state, user, params),
        Some(RpcMethod::MeetingStatusChange) => meeting_status_change(state, user, params).await,
        None => Err(RpcError::method_not_found()),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(error) => {
            log::debug!("RPC {} from {} failed: {}", method, client_id, error.message);
            RpcResponse::error(id, error)
        }
    }
}

/// Drop a closed connection from its rooms and tell the others it left
pub fn disconnect(state: &AppState, client_id: &str, user: &User) {
    let broadcaster = state.gateway.broadcaster();
    for meeting_id in broadcaster.unsubscribe(client_id) {
        mark_left(state, meeting_id, user);
        broadcaster.broadcast_to_room(meeting_id, GatewayEvent::participant_left(meeting_id, user.id, &user.name));
    }
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, RpcError> {
    serde_json::from_value(params).map_err(|e| RpcError::invalid_params(e.to_string()))
}

fn owned_meeting(state: &AppState, user: &User, meeting_id: i64) -> Result<Meeting, RpcError> {
    state
        .db
        .get_meeting(meeting_id, user.id)
        .map_err(ApiError::from)?
        .ok_or_else(|| RpcError::domain("Meeting not found"))
}

fn mark_left(state: &AppState, meeting_id: i64, user: &User) {
    if let Err(e) = state.db.mark_participant_left(meeting_id, &user.name, Some(&user.email)) {
        log::warn!("Failed to record {} leaving meeting {}: {}", user.id, meeting_id, e);
    }
}

fn join_meeting(state: &AppState, client_id: &str, user: &User, params: Value) -> MethodResult {
    let params: MeetingParams = parse_params(params)?;
    let meeting = owned_meeting(state, user, params.meeting_id)?;

    state
        .db
        .mark_participant_joined(meeting.id, &user.name, Some(&user.email))
        .map_err(ApiError::from)?;
    let participants = state.db.list_participants(meeting.id).map_err(ApiError::from)?;

    let broadcaster = state.gateway.broadcaster();
    broadcaster.join(meeting.id, client_id);
    broadcaster.broadcast_to_room(
        meeting.id,
        GatewayEvent::participant_joined(meeting.id, user.id, &user.name, &participants),
    );
    log::info!("User {} joined meeting {} ({})", user.id, meeting.id, client_id);

    Ok(json!({
        "meeting_id": meeting.id,
        "participants": participants,
    }))
}

fn leave_meeting(state: &AppState, client_id: &str, user: &User, params: Value) -> MethodResult {
    let params: MeetingParams = parse_params(params)?;
    let broadcaster = state.gateway.broadcaster();
    if !broadcaster.leave(params.meeting_id, client_id) {
        return Ok(json!({ "left": false }));
    }

    mark_left(state, params.meeting_id, user);
    broadcaster.broadcast_to_room(
        params.meeting_id,
        GatewayEvent::participant_left(params.meeting_id, user.id, &user.name),
    );
    log::info!("User {} left meeting {} ({})", user.id, params.meeting_id, client_id);
    Ok(json!({ "left": true }))
}

async fn transcription_update(state: &AppState, client_id: &str, user: &User, params: Value) -> MethodResult {
    let params: TranscriptionParams = parse_params(params)?;
    if !state.gateway.broadcaster().is_member(params.meeting_id, client_id) {
        return Err(RpcError::domain("Join the meeting before sending transcripts"));
    }
    let meeting = owned_meeting(state, user, params.meeting_id)?;

    // Untimed live segments follow the last timed one
    let start_time = match (params.start_time, params.end_time) {
        (None, None) => state.db.last_transcript_end(meeting.id).map_err(ApiError::from)?,
        (start, _) => start,
    };
    let segment = NewTranscript {
        speaker: params.speaker.unwrap_or_else(|| user.name.clone()),
        content: params.content,
        start_time,
        end_time: params.end_time,
        confidence: params.confidence,
        is_agent: false,
    };
    let recorded = transcripts::record_segment(state, &meeting, segment).await?;
    serde_json::to_value(recorded).map_err(|e| RpcError::domain(e.to_string()))
}

fn agent_control(state: &AppState, user: &User, params: Value) -> MethodResult {
    let params: AgentControlParams = parse_params(params)?;
    let action: AgentAction = params
        .action
        .parse()
        .map_err(|_| RpcError::invalid_params(format!("Unknown agent action: {}", params.action)))?;
    let meeting = owned_meeting(state, user, params.meeting_id)?;
    let agent_id = meeting
        .agent_id
        .ok_or_else(|| RpcError::domain("No agent assigned to this meeting"))?;
    if meeting.status.is_terminal() && action != AgentAction::Stop {
        return Err(RpcError::domain(format!("Meeting is {}", meeting.status)));
    }

    let status = state
        .gateway
        .agent_sessions()
        .apply(meeting.id, agent_id, action)
        .map_err(RpcError::domain)?;
    state
        .gateway
        .broadcaster()
        .broadcast_to_room(meeting.id, GatewayEvent::agent_status(meeting.id, agent_id, status.as_ref()));

    Ok(json!({
        "meeting_id": meeting.id,
        "agent_id": agent_id,
        "status": status,
    }))
}

async fn meeting_status_change(state: &AppState, user: &User, params: Value) -> MethodResult {
    let params: StatusChangeParams = parse_params(params)?;
    let meeting = owned_meeting(state, user, params.meeting_id)?;
    let updated = meetings::transition(state, meeting, params.status).await?;
    serde_json::to_value(updated).map_err(|e| RpcError::domain(e.to_string()))
}
