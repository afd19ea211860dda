pub mod action_items;
pub mod agents;
pub mod analytics;
pub mod auth;
pub mod dashboard;
pub mod follow_up_emails;
pub mod health;
pub mod meetings;
pub mod summaries;
pub mod transcripts;
pub mod users;

use actix_web::web;

use crate::error::{extractor_error, ApiError, ApiResult};
use crate::models::Meeting;
use crate::AppState;

/// Every REST route plus the extractor error handlers
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| extractor_error(err)))
        .app_data(web::PathConfig::default().error_handler(|err, _| extractor_error(err)))
        .app_data(web::QueryConfig::default().error_handler(|err, _| extractor_error(err)));

    cfg.configure(health::config)
        .configure(auth::config)
        .configure(users::config)
        .configure(agents::config)
        // Nested meeting resources go before the /api/meetings scope
        .configure(transcripts::config)
        .configure(summaries::config)
        .configure(action_items::config)
        .configure(follow_up_emails::config)
        .configure(meetings::config)
        .configure(analytics::config)
        .configure(dashboard::config);
}

/// Meeting owned by the caller, or 404
pub(crate) fn owned_meeting(state: &AppState, meeting_id: i64, user_id: i64) -> ApiResult<Meeting> {
    state
        .db
        .get_meeting(meeting_id, user_id)?
        .ok_or_else(|| ApiError::not_found("Meeting not found"))
}
