use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use super::owned_meeting;
use crate::error::{ApiError, ApiResult};
use crate::middleware::jwt_auth::authenticate;
use crate::models::{
    is_valid_email, ActionItemQuery, CreateFollowUpEmailRequest, EmailStatus, FollowUpEmail, FollowUpEmailQuery,
    UpdateFollowUpEmailRequest,
};
use crate::services::follow_up;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/meetings/{id}/follow-up-emails/generate").route(web::post().to(generate_email)),
    );
    cfg.service(
        web::scope("/api/follow-up-emails")
            .route("", web::get().to(list_emails))
            .route("", web::post().to(create_email))
            .route("/{id}", web::get().to(get_email))
            .route("/{id}", web::put().to(update_email))
            .route("/{id}", web::delete().to(delete_email))
            .route("/{id}/send", web::post().to(send_email)),
    );
}

fn check_recipients(recipients: &[String]) -> ApiResult<()> {
    if recipients.is_empty() {
        return Err(ApiError::bad_request("At least one recipient is required"));
    }
    if let Some(bad) = recipients.iter().find(|r| !is_valid_email(r)) {
        return Err(ApiError::BadRequest(format!("Invalid recipient: {}", bad)));
    }
    Ok(())
}

fn owned_email(state: &AppState, id: i64, user_id: i64) -> ApiResult<FollowUpEmail> {
    state
        .db
        .get_follow_up_email(id, user_id)?
        .ok_or_else(|| ApiError::not_found("Email not found"))
}

async fn list_emails(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<FollowUpEmailQuery>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    Ok(HttpResponse::Ok().json(state.db.list_follow_up_emails(user.id, &query)?))
}

async fn create_email(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateFollowUpEmailRequest>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    if state.db.get_meeting(body.meeting_id, user.id)?.is_none() {
        return Err(ApiError::bad_request("Meeting not found"));
    }
    if body.subject.trim().is_empty() {
        return Err(ApiError::bad_request("Subject is required"));
    }
    check_recipients(&body.recipients)?;

    let email = state
        .db
        .create_follow_up_email(user.id, body.meeting_id, &body.subject, &body.body, &body.recipients)?;
    log::info!("User {} drafted email {} for meeting {}", user.id, email.id, email.meeting_id);
    Ok(HttpResponse::Created().json(email))
}

/// Draft a recap from what the meeting produced
async fn generate_email(state: web::Data<AppState>, req: HttpRequest, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let meeting = owned_meeting(&state, path.into_inner(), user.id)?;

    let summary = state.db.get_summary(meeting.id)?;
    let action_items = state.db.list_action_items(
        user.id,
        &ActionItemQuery {
            meeting_id: Some(meeting.id),
            ..Default::default()
        },
    )?;
    let participants = state.db.list_participants(meeting.id)?;

    let composed = follow_up::compose(&meeting, summary.as_ref(), &action_items, &participants);
    let email = state.db.create_follow_up_email(
        user.id,
        meeting.id,
        &composed.subject,
        &composed.body,
        &composed.recipients,
    )?;
    log::info!(
        "Generated follow-up email {} for meeting {} ({} recipients)",
        email.id,
        meeting.id,
        email.recipients.len()
    );
    Ok(HttpResponse::Created().json(email))
}

async fn get_email(state: web::Data<AppState>, req: HttpRequest, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    Ok(HttpResponse::Ok().json(owned_email(&state, path.into_inner(), user.id)?))
}

async fn update_email(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateFollowUpEmailRequest>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let email = owned_email(&state, path.into_inner(), user.id)?;
    if email.status == EmailStatus::Sent {
        return Err(ApiError::bad_request("Cannot modify a sent email"));
    }
    if body.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    if matches!(&body.subject, Some(subject) if subject.trim().is_empty()) {
        return Err(ApiError::bad_request("Subject cannot be empty"));
    }
    if let Some(recipients) = &body.recipients {
        check_recipients(recipients)?;
    }

    let email = state
        .db
        .update_follow_up_email(email.id, user.id, &body)?
        .ok_or_else(|| ApiError::not_found("Email not found"))?;
    Ok(HttpResponse::Ok().json(email))
}

async fn delete_email(state: web::Data<AppState>, req: HttpRequest, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    if !state.db.delete_follow_up_email(path.into_inner(), user.id)? {
        return Err(ApiError::not_found("Email not found"));
    }
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// Hand the email to the mailer and record the outcome
async fn send_email(state: web::Data<AppState>, req: HttpRequest, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let email = owned_email(&state, path.into_inner(), user.id)?;
    if email.status == EmailStatus::Sent {
        return Err(ApiError::bad_request("Email has already been sent"));
    }
    if email.recipients.is_empty() {
        return Err(ApiError::bad_request("Email has no recipients"));
    }

    match state.providers.mailer.send(&email).await {
        Ok(receipt) => {
            let sent = state
                .db
                .set_follow_up_email_status(email.id, user.id, EmailStatus::Sent)?
                .ok_or_else(|| ApiError::not_found("Email not found"))?;
            log::info!("Email {} sent as {}", sent.id, receipt.message_id);
            Ok(HttpResponse::Ok().json(sent))
        }
        Err(e) => {
            state.db.set_follow_up_email_status(email.id, user.id, EmailStatus::Failed)?;
            Err(ApiError::Internal(format!("Delivery of email {} failed: {}", email.id, e)))
        }
    }
}
