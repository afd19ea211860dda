pub mod actix_ws;
pub mod agent_sessions;
pub mod events;
pub mod methods;
pub mod protocol;

pub use agent_sessions::AgentSessions;
pub use events::EventBroadcaster;

use std::sync::Arc;

/// Realtime side of the server: room broadcaster plus live agent state
pub struct Gateway {
    broadcaster: Arc<EventBroadcaster>,
    agent_sessions: Arc<AgentSessions>,
}

impl Gateway {
    pub fn new() -> Self {
        Self {
            broadcaster: Arc::new(EventBroadcaster::new()),
            agent_sessions: Arc::new(AgentSessions::new()),
        }
    }

    /// Get the event broadcaster for emitting events
    pub fn broadcaster(&self) -> Arc<EventBroadcaster> {
        self.broadcaster.clone()
    }

    pub fn agent_sessions(&self) -> Arc<AgentSessions> {
        self.agent_sessions.clone()
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new()
    }
}
