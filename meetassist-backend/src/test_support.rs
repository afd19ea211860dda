//! Fixtures shared by handler, service and gateway tests

use std::sync::Arc;

use actix_web::web;

use crate::auth::{hash_password, issue_token};
use crate::config::Config;
use crate::db::Database;
use crate::gateway::Gateway;
use crate::models::{Agent, CreateAgentRequest, CreateMeetingRequest, Meeting, User};
use crate::services::Providers;
use crate::AppState;

pub const PASSWORD: &str = "password123";

pub fn config() -> Config {
    Config {
        secret_key: "test-secret".to_string(),
        port: 8080,
        database_url: ":memory:".to_string(),
        jwt_expiry_hours: 24,
        frontend_dist: None,
    }
}

pub fn state() -> web::Data<AppState> {
    web::Data::new(AppState {
        db: Arc::new(Database::in_memory().unwrap()),
        config: config(),
        gateway: Arc::new(Gateway::new()),
        providers: Arc::new(Providers::mock()),
    })
}

/// Registered user plus a valid bearer token
pub fn user(state: &AppState, email: &str) -> (User, String) {
    let name = email.split('@').next().unwrap_or(email);
    let hash = hash_password(PASSWORD).unwrap();
    let user = state.db.create_user(email, name, &hash, "UTC").unwrap();
    let (token, _) = issue_token(&user, &state.config.secret_key, state.config.jwt_expiry_hours).unwrap();
    (user, token)
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub fn meeting(state: &AppState, user_id: i64, title: &str) -> Meeting {
    create_meeting(state, user_id, title, None)
}

pub fn meeting_with_agent(state: &AppState, user_id: i64, title: &str, agent_id: i64) -> Meeting {
    create_meeting(state, user_id, title, Some(agent_id))
}

fn create_meeting(state: &AppState, user_id: i64, title: &str, agent_id: Option<i64>) -> Meeting {
    state
        .db
        .create_meeting(user_id, &CreateMeetingRequest {
            title: title.to_string(),
            description: None,
            scheduled_start: None,
            scheduled_end: None,
            meeting_url: None,
            agent_id,
            participants: vec![],
        })
        .unwrap()
}

pub fn agent(state: &AppState, user_id: i64, name: &str, keywords: &[&str]) -> Agent {
    state
        .db
        .create_agent(user_id, &CreateAgentRequest {
            name: name.to_string(),
            description: None,
            agent_type: None,
            instructions: None,
            trigger_keywords: keywords.iter().map(|k| k.to_string()).collect(),
            response_templates: vec![],
            is_active: Some(true),
        })
        .unwrap()
}
