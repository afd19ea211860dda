use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::Serialize;

use crate::error::ApiResult;
use crate::middleware::jwt_auth::authenticate;
use crate::models::{ActionItem, AnalyticsOverview, Meeting, MeetingQuery, MeetingStatus};
use crate::AppState;

const UPCOMING_LIMIT: i64 = 5;
const RECENT_LIMIT: i64 = 5;
const OPEN_ITEMS_LIMIT: i64 = 10;

#[derive(Serialize)]
struct Dashboard {
    upcoming_meetings: Vec<Meeting>,
    in_progress_meetings: Vec<Meeting>,
    recent_meetings: Vec<Meeting>,
    open_action_items: Vec<ActionItem>,
    overview: AnalyticsOverview,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/dashboard").route(web::get().to(get_dashboard)));
}

async fn get_dashboard(state: web::Data<AppState>, req: HttpRequest) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let in_progress = MeetingQuery {
        status: Some(MeetingStatus::InProgress),
        ..Default::default()
    };

    let dashboard = Dashboard {
        upcoming_meetings: state.db.list_upcoming_meetings(user.id, Utc::now(), UPCOMING_LIMIT)?,
        in_progress_meetings: state.db.list_meetings(user.id, &in_progress)?,
        recent_meetings: state.db.list_recent_completed_meetings(user.id, RECENT_LIMIT)?,
        open_action_items: state.db.list_open_action_items(user.id, OPEN_ITEMS_LIMIT)?,
        overview: state.db.analytics_overview(user.id)?,
    };
    Ok(HttpResponse::Ok().json(dashboard))
}
