//! In-memory agent run state per meeting

use dashmap::DashMap;
use serde::Serialize;
use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum AgentAction {
    Start,
    Pause,
    Resume,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AgentSessionStatus {
    Active,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSession {
    pub agent_id: i64,
    pub status: AgentSessionStatus,
}

/// Stopped sessions are removed rather than stored
pub struct AgentSessions {
    sessions: DashMap<i64, AgentSession>,
}

impl AgentSessions {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn get(&self, meeting_id: i64) -> Option<AgentSession> {
        self.sessions.get(&meeting_id).map(|s| *s)
    }

    /// True when the agent should be listening in this meeting
    pub fn is_active(&self, meeting_id: i64) -> bool {
        matches!(self.get(meeting_id), Some(s) if s.status == AgentSessionStatus::Active)
    }

    pub fn apply(&self, meeting_id: i64, agent_id: i64, action: AgentAction) -> Result<AgentSessionStatus, String> {
        let current = self.get(meeting_id).map(|s| s.status);
        let next = match (action, current) {
            (AgentAction::Start, None) => AgentSessionStatus::Active,
            (AgentAction::Start, Some(_)) => return Err("Agent is already running".to_string()),
            (AgentAction::Pause, Some(AgentSessionStatus::Active)) => AgentSessionStatus::Paused,
            (AgentAction::Pause, _) => return Err("Agent is not active".to_string()),
            (AgentAction::Resume, Some(AgentSessionStatus::Paused)) => AgentSessionStatus::Active,
            (AgentAction::Resume, _) => return Err("Agent is not paused".to_string()),
            (AgentAction::Stop, Some(_)) => AgentSessionStatus::Stopped,
            (AgentAction::Stop, None) => return Err("Agent is not running".to_string()),
        };

        if next == AgentSessionStatus::Stopped {
            self.sessions.remove(&meeting_id);
        } else {
            self.sessions.insert(meeting_id, AgentSession { agent_id, status: next });
        }
        log::info!("Agent {} in meeting {}: {} -> {}", agent_id, meeting_id, action, next);
        Ok(next)
    }

    /// Forget a meeting's session, returning it if one existed
    pub fn clear(&self, meeting_id: i64) -> Option<AgentSession> {
        self.sessions.remove(&meeting_id).map(|(_, s)| s)
    }
}

impl Default for AgentSessions {
    fn default() -> Self {
        Self::new()
    }
}
