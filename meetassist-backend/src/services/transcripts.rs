use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::gateway::protocol::GatewayEvent;
use crate::models::{Meeting, NewTranscript, Transcript};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RecordedSegment {
    pub transcript: Transcript,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_response: Option<Transcript>,
}

/// Store a spoken segment, broadcast it, and let the meeting's agent answer
/// when its session is active.
pub async fn record_segment(state: &AppState, meeting: &Meeting, segment: NewTranscript) -> ApiResult<RecordedSegment> {
    if segment.speaker.trim().is_empty() {
        return Err(ApiError::bad_request("Speaker is required"));
    }
    if segment.content.trim().is_empty() {
        return Err(ApiError::bad_request("Transcript content is required"));
    }
    if let Some(confidence) = segment.confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ApiError::bad_request("Confidence must be between 0 and 1"));
        }
    }
    if let (Some(start), Some(end)) = (segment.start_time, segment.end_time) {
        if end < start {
            return Err(ApiError::bad_request("end_time must not be before start_time"));
        }
    }

    let transcript = state.db.add_transcript(meeting.id, &segment)?;
    let broadcaster = state.gateway.broadcaster();
    broadcaster.broadcast_to_room(meeting.id, GatewayEvent::transcription_update(&transcript));

    let agent_response = match meeting.agent_id {
        Some(agent_id) if state.gateway.agent_sessions().is_active(meeting.id) => {
            agent_reply(state, meeting, agent_id, &transcript).await?
        }
        _ => None,
    };

    Ok(RecordedSegment {
        transcript,
        agent_response,
    })
}

async fn agent_reply(
    state: &AppState,
    meeting: &Meeting,
    agent_id: i64,
    heard: &Transcript,
) -> ApiResult<Option<Transcript>> {
    let Some(agent) = state.db.get_agent_by_id(agent_id)? else {
        log::warn!("Meeting {} references missing agent {}", meeting.id, agent_id);
        return Ok(None);
    };
    let Some(reply) = state
        .providers
        .responder
        .respond(&agent, &heard.speaker, &heard.content)
        .await
    else {
        return Ok(None);
    };

    let at = heard.end_time.or(heard.start_time);
    let row = state.db.add_transcript(meeting.id, &NewTranscript {
        speaker: agent.name.clone(),
        content: reply.response,
        start_time: at,
        end_time: at,
        confidence: None,
        is_agent: true,
    })?;
    log::info!("Agent {} responded in meeting {} on '{}'", agent.id, meeting.id, reply.keyword);
    state
        .gateway
        .broadcaster()
        .broadcast_to_room(meeting.id, GatewayEvent::agent_response(agent.id, &reply.keyword, &row));
    Ok(Some(row))
}
