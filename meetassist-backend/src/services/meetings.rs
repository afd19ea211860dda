use crate::error::{ApiError, ApiResult};
use crate::gateway::agent_sessions::AgentSessionStatus;
use crate::gateway::protocol::GatewayEvent;
use crate::models::{Meeting, MeetingStatus};
use crate::services::post_meeting;
use crate::AppState;

fn transition_error(from: MeetingStatus, to: MeetingStatus) -> ApiError {
    let message = match to {
        MeetingStatus::InProgress => format!("Cannot start meeting in status {}", from),
        MeetingStatus::Completed => format!("Cannot end meeting in status {}", from),
        MeetingStatus::Cancelled => format!("Cannot cancel meeting in status {}", from),
        MeetingStatus::Scheduled => format!("Cannot change meeting status from {} to {}", from, to),
    };
    ApiError::BadRequest(message)
}

/// Move a meeting through its lifecycle, notifying the meeting room.
/// Completion runs the post-meeting pipeline; any terminal state stops the agent.
pub async fn transition(state: &AppState, meeting: Meeting, next: MeetingStatus) -> ApiResult<Meeting> {
    let previous = meeting.status;
    if !previous.can_transition_to(next) {
        return Err(transition_error(previous, next));
    }

    let updated = state
        .db
        .set_meeting_status(meeting.id, meeting.user_id, next)?
        .ok_or_else(|| ApiError::not_found("Meeting not found"))?;
    log::info!("Meeting {} status {} -> {}", updated.id, previous, next);

    let broadcaster = state.gateway.broadcaster();
    if next.is_terminal() {
        if let Some(session) = state.gateway.agent_sessions().clear(updated.id) {
            broadcaster.broadcast_to_room(
                updated.id,
                GatewayEvent::agent_status(updated.id, session.agent_id, AgentSessionStatus::Stopped.as_ref()),
            );
        }
    }
    broadcaster.broadcast_to_room(updated.id, GatewayEvent::meeting_status_changed(&updated, previous));

    if next == MeetingStatus::Completed {
        let report = post_meeting::finalize(&state.db, &state.providers, &updated).await;
        if let Some(summary) = &report.summary {
            broadcaster.broadcast_to_room(updated.id, GatewayEvent::summary_ready(summary));
        }
    }

    Ok(updated)
}
