use actix_web::{web, HttpRequest, HttpResponse};

use super::owned_meeting;
use crate::error::{ApiError, ApiResult};
use crate::gateway::protocol::GatewayEvent;
use crate::middleware::jwt_auth::authenticate;
use crate::models::UpdateSummaryRequest;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/meetings/{id}/summary")
            .route(web::get().to(get_summary))
            .route(web::post().to(generate_summary))
            .route(web::put().to(update_summary)),
    );
}

async fn get_summary(state: web::Data<AppState>, req: HttpRequest, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let meeting = owned_meeting(&state, path.into_inner(), user.id)?;
    let summary = state
        .db
        .get_summary(meeting.id)?
        .ok_or_else(|| ApiError::not_found("Summary not found"))?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Rebuild the summary from the transcript as it stands now
async fn generate_summary(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let meeting = owned_meeting(&state, path.into_inner(), user.id)?;
    let transcripts = state.db.list_transcripts(meeting.id, None)?;
    if transcripts.is_empty() {
        return Err(ApiError::bad_request("No transcripts to summarize"));
    }

    let draft = state
        .providers
        .summarizer
        .summarize(&transcripts)
        .await
        .map_err(|e| ApiError::Internal(format!("Summarizer failed: {}", e)))?;
    let summary = state.db.upsert_summary(meeting.id, &draft)?;
    log::info!("Generated summary for meeting {} from {} segments", meeting.id, transcripts.len());

    state
        .gateway
        .broadcaster()
        .broadcast_to_room(meeting.id, GatewayEvent::summary_ready(&summary));
    Ok(HttpResponse::Created().json(summary))
}

async fn update_summary(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateSummaryRequest>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let meeting = owned_meeting(&state, path.into_inner(), user.id)?;
    if body.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let summary = state
        .db
        .update_summary(meeting.id, &body)?
        .ok_or_else(|| ApiError::not_found("Summary not found"))?;
    Ok(HttpResponse::Ok().json(summary))
}
