use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use super::owned_meeting;
use crate::error::{ApiError, ApiResult};
use crate::middleware::jwt_auth::authenticate;
use crate::models::{ActionItemQuery, CreateActionItemRequest, UpdateActionItemRequest};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/meetings/{id}/action-items").route(web::get().to(list_for_meeting)));
    cfg.service(
        web::scope("/api/action-items")
            .route("", web::get().to(list_action_items))
            .route("", web::post().to(create_action_item))
            .route("/{id}", web::get().to(get_action_item))
            .route("/{id}", web::put().to(update_action_item))
            .route("/{id}", web::delete().to(delete_action_item)),
    );
}

async fn list_action_items(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ActionItemQuery>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    Ok(HttpResponse::Ok().json(state.db.list_action_items(user.id, &query)?))
}

async fn list_for_meeting(state: web::Data<AppState>, req: HttpRequest, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let meeting = owned_meeting(&state, path.into_inner(), user.id)?;
    let query = ActionItemQuery {
        meeting_id: Some(meeting.id),
        ..Default::default()
    };
    Ok(HttpResponse::Ok().json(state.db.list_action_items(user.id, &query)?))
}

async fn create_action_item(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateActionItemRequest>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    if body.title.trim().is_empty() {
        return Err(ApiError::bad_request("Action item title is required"));
    }
    if let Some(meeting_id) = body.meeting_id {
        if state.db.get_meeting(meeting_id, user.id)?.is_none() {
            return Err(ApiError::bad_request("Meeting not found"));
        }
    }

    let item = state.db.create_action_item(user.id, &body)?;
    log::info!("User {} created action item {}", user.id, item.id);
    Ok(HttpResponse::Created().json(item))
}

async fn get_action_item(state: web::Data<AppState>, req: HttpRequest, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let item = state
        .db
        .get_action_item(path.into_inner(), user.id)?
        .ok_or_else(|| ApiError::not_found("Action item not found"))?;
    Ok(HttpResponse::Ok().json(item))
}

async fn update_action_item(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateActionItemRequest>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    if body.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    if matches!(&body.title, Some(title) if title.trim().is_empty()) {
        return Err(ApiError::bad_request("Action item title cannot be empty"));
    }

    let item = state
        .db
        .update_action_item(path.into_inner(), user.id, &body)?
        .ok_or_else(|| ApiError::not_found("Action item not found"))?;
    Ok(HttpResponse::Ok().json(item))
}

async fn delete_action_item(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    if !state.db.delete_action_item(path.into_inner(), user.id)? {
        return Err(ApiError::not_found("Action item not found"));
    }
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
