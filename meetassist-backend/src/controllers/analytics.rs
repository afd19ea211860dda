use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{Duration, Utc};

use super::owned_meeting;
use crate::error::{ApiError, ApiResult};
use crate::middleware::jwt_auth::authenticate;
use crate::models::{TrendQuery, DEFAULT_TREND_DAYS, MAX_TREND_DAYS};
use crate::services::analytics;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/analytics")
            .route("/overview", web::get().to(overview))
            .route("/trends", web::get().to(trends))
            .route("/agents", web::get().to(agent_performance))
            .route("/meetings/{id}", web::get().to(meeting_analytics))
            .route("/meetings/{id}/refresh", web::post().to(refresh_meeting_analytics)),
    );
}

async fn overview(state: web::Data<AppState>, req: HttpRequest) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    Ok(HttpResponse::Ok().json(state.db.analytics_overview(user.id)?))
}

/// Stored numbers, computed on first request
async fn meeting_analytics(state: web::Data<AppState>, req: HttpRequest, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let meeting = owned_meeting(&state, path.into_inner(), user.id)?;
    let stats = match state.db.get_meeting_analytics(meeting.id, user.id)? {
        Some(stats) => stats,
        None => analytics::refresh(&state.db, &meeting)?,
    };
    Ok(HttpResponse::Ok().json(stats))
}

async fn refresh_meeting_analytics(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let meeting = owned_meeting(&state, path.into_inner(), user.id)?;
    let stats = analytics::refresh(&state.db, &meeting)?;
    log::info!("Refreshed analytics for meeting {}", meeting.id);
    Ok(HttpResponse::Ok().json(stats))
}

async fn trends(state: web::Data<AppState>, req: HttpRequest, query: web::Query<TrendQuery>) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let days = query.days.unwrap_or(DEFAULT_TREND_DAYS);
    if !(1..=MAX_TREND_DAYS).contains(&days) {
        return Err(ApiError::BadRequest(format!("days must be between 1 and {}", MAX_TREND_DAYS)));
    }

    let today = Utc::now().date_naive();
    let since = today - Duration::days(days - 1);
    Ok(HttpResponse::Ok().json(state.db.meeting_trends(user.id, since, today)?))
}

async fn agent_performance(state: web::Data<AppState>, req: HttpRequest) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    Ok(HttpResponse::Ok().json(state.db.agent_performance(user.id)?))
}
