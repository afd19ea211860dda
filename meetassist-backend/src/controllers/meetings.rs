use std::collections::HashSet;

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde_json::json;

use super::owned_meeting;
use crate::db::sqlite::is_unique_violation;
use crate::error::{ApiError, ApiResult};
use crate::middleware::jwt_auth::authenticate;
use crate::models::{
    is_valid_email, CalendarSync, CreateMeetingRequest, Meeting, MeetingDetail, MeetingQuery, MeetingStatus, NewParticipant,
    ParticipantRole, UpdateMeetingRequest, User,
};
use crate::services::meetings::transition;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/meetings")
            .route("", web::get().to(list_meetings))
            .route("", web::post().to(create_meeting))
            .route("/sync-calendar", web::post().to(sync_calendar))
            .route("/{id}", web::get().to(get_meeting))
            .route("/{id}", web::put().to(update_meeting))
            .route("/{id}", web::delete().to(delete_meeting))
            .route("/{id}/start", web::post().to(start_meeting))
            .route("/{id}/end", web::post().to(end_meeting))
            .route("/{id}/cancel", web::post().to(cancel_meeting))
            .route("/{id}/participants", web::get().to(list_participants))
            .route("/{id}/participants", web::post().to(add_participant))
            .route("/{id}/participants/{participant_id}", web::delete().to(remove_participant)),
    );
}

fn check_schedule(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> ApiResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(ApiError::bad_request("scheduled_end must not be before scheduled_start"));
        }
    }
    Ok(())
}

fn check_agent(state: &AppState, user: &User, agent_id: Option<i64>) -> ApiResult<()> {
    if let Some(id) = agent_id {
        if state.db.get_agent(id, user.id)?.is_none() {
            return Err(ApiError::bad_request("Agent not found"));
        }
    }
    Ok(())
}

fn check_participant(participant: &NewParticipant) -> ApiResult<()> {
    if participant.name.trim().is_empty() {
        return Err(ApiError::bad_request("Participant name is required"));
    }
    if matches!(&participant.email, Some(email) if !is_valid_email(email)) {
        return Err(ApiError::bad_request("Participant email is invalid"));
    }
    Ok(())
}

fn duplicate_participant(err: rusqlite::Error) -> ApiError {
    if is_unique_violation(&err) {
        ApiError::Conflict("Participant with this email already exists".to_string())
    } else {
        err.into()
    }
}

fn detail(state: &AppState, meeting: Meeting) -> ApiResult<MeetingDetail> {
    let participants = state.db.list_participants(meeting.id)?;
    Ok(MeetingDetail { meeting, participants })
}

async fn list_meetings(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<MeetingQuery>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    Ok(HttpResponse::Ok().json(state.db.list_meetings(user.id, &query)?))
}

async fn create_meeting(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateMeetingRequest>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let request = body.into_inner();
    if request.title.trim().is_empty() {
        return Err(ApiError::bad_request("Meeting title is required"));
    }
    check_schedule(request.scheduled_start, request.scheduled_end)?;
    check_agent(&state, &user, request.agent_id)?;

    let mut emails = HashSet::new();
    for participant in &request.participants {
        check_participant(participant)?;
        if let Some(email) = &participant.email {
            if !emails.insert(email.trim().to_lowercase()) {
                return Err(ApiError::Conflict("Participant with this email already exists".to_string()));
            }
        }
    }

    let meeting = state.db.create_meeting(user.id, &request)?;
    for participant in &request.participants {
        state.db.add_participant(meeting.id, participant).map_err(duplicate_participant)?;
    }
    log::info!("User {} created meeting {} '{}'", user.id, meeting.id, meeting.title);

    Ok(HttpResponse::Created().json(detail(&state, meeting)?))
}

async fn get_meeting(state: web::Data<AppState>, req: HttpRequest, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let meeting = owned_meeting(&state, path.into_inner(), user.id)?;
    Ok(HttpResponse::Ok().json(detail(&state, meeting)?))
}

async fn update_meeting(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateMeetingRequest>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let mut meeting = owned_meeting(&state, path.into_inner(), user.id)?;
    let request = body.into_inner();
    if request.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    if matches!(&request.title, Some(title) if title.trim().is_empty()) {
        return Err(ApiError::bad_request("Meeting title cannot be empty"));
    }
    check_schedule(
        request.scheduled_start.or(meeting.scheduled_start),
        request.scheduled_end.or(meeting.scheduled_end),
    )?;
    check_agent(&state, &user, request.agent_id)?;

    // Status goes first so a rejected transition leaves the fields untouched
    if let Some(status) = request.status {
        if status != meeting.status {
            meeting = transition(&state, meeting, status).await?;
        }
    }
    if request.has_field_changes() {
        meeting = state
            .db
            .update_meeting(meeting.id, user.id, &request)?
            .ok_or_else(|| ApiError::not_found("Meeting not found"))?;
    }
    log::info!("Updated meeting {}", meeting.id);

    Ok(HttpResponse::Ok().json(detail(&state, meeting)?))
}

async fn delete_meeting(state: web::Data<AppState>, req: HttpRequest, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let id = path.into_inner();
    if !state.db.delete_meeting(id, user.id)? {
        return Err(ApiError::not_found("Meeting not found"));
    }
    state.gateway.agent_sessions().clear(id);
    log::info!("Deleted meeting {}", id);
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

async fn change_status(
    state: web::Data<AppState>,
    req: HttpRequest,
    meeting_id: i64,
    next: MeetingStatus,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let meeting = owned_meeting(&state, meeting_id, user.id)?;
    let meeting = transition(&state, meeting, next).await?;
    Ok(HttpResponse::Ok().json(meeting))
}

async fn start_meeting(state: web::Data<AppState>, req: HttpRequest, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    change_status(state, req, path.into_inner(), MeetingStatus::InProgress).await
}

async fn end_meeting(state: web::Data<AppState>, req: HttpRequest, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    change_status(state, req, path.into_inner(), MeetingStatus::Completed).await
}

async fn cancel_meeting(state: web::Data<AppState>, req: HttpRequest, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    change_status(state, req, path.into_inner(), MeetingStatus::Cancelled).await
}

/// Import the caller's calendar. Attendees are only added to newly created meetings.
async fn sync_calendar(state: web::Data<AppState>, req: HttpRequest) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let events = state
        .providers
        .calendar
        .fetch_events(&user)
        .await
        .map_err(|e| ApiError::Internal(format!("Calendar sync failed: {}", e)))?;

    let mut imported = 0;
    let mut updated = 0;
    let mut unchanged = 0;
    let mut meetings = Vec::with_capacity(events.len());
    for event in &events {
        let (meeting, outcome) = state.db.upsert_calendar_meeting(user.id, event)?;
        if outcome == CalendarSync::Imported {
            imported += 1;
            for email in &event.attendees {
                let role = if email.eq_ignore_ascii_case(&user.email) {
                    ParticipantRole::Host
                } else {
                    ParticipantRole::Attendee
                };
                let name = email.split('@').next().unwrap_or(email).to_string();
                let attendee = NewParticipant {
                    name,
                    email: Some(email.clone()),
                    role: Some(role),
                };
                if let Err(e) = state.db.add_participant(meeting.id, &attendee) {
                    log::warn!("Skipping attendee {} for meeting {}: {}", email, meeting.id, e);
                }
            }
        } else if outcome == CalendarSync::Updated {
            updated += 1;
        } else {
            unchanged += 1;
        }
        meetings.push(meeting);
    }
    log::info!(
        "Calendar sync for user {}: {} imported, {} updated, {} unchanged",
        user.id,
        imported,
        updated,
        unchanged
    );

    Ok(HttpResponse::Ok().json(json!({
        "imported": imported,
        "updated": updated,
        "unchanged": unchanged,
        "meetings": meetings,
    })))
}

async fn list_participants(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let meeting = owned_meeting(&state, path.into_inner(), user.id)?;
    Ok(HttpResponse::Ok().json(state.db.list_participants(meeting.id)?))
}

async fn add_participant(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<NewParticipant>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let meeting = owned_meeting(&state, path.into_inner(), user.id)?;
    check_participant(&body)?;

    let participant = state
        .db
        .add_participant(meeting.id, &body)
        .map_err(duplicate_participant)?;
    log::info!("Added participant {} to meeting {}", participant.id, meeting.id);
    Ok(HttpResponse::Created().json(participant))
}

async fn remove_participant(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(i64, i64)>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let (meeting_id, participant_id) = path.into_inner();
    let meeting = owned_meeting(&state, meeting_id, user.id)?;

    if !state.db.remove_participant(meeting.id, participant_id)? {
        return Err(ApiError::not_found("Participant not found"));
    }
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use crate::controllers::configure;
    use crate::models::{MeetingStatus, NewTranscript};
    use crate::test_support::{self, bearer};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_meeting_crud_contract() {
        let state = test_support::state();
        let (user, token) = test_support::user(&state, "host@example.com");
        let (_, other_token) = test_support::user(&state, "other@example.com");
        let agent = test_support::agent(&state, user.id, "Scribe", &[]);
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/meetings")
            .insert_header(bearer(&token))
            .set_json(json!({
                "title": "Design review",
                "scheduled_start": "2026-05-01T10:00:00Z",
                "scheduled_end": "2026-05-01T11:00:00Z",
                "agent_id": agent.id,
                "participants": [{ "name": "Ana", "email": "ana@example.com" }],
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let meeting: Value = test::read_body_json(resp).await;
        assert_eq!(meeting["status"], "scheduled");
        assert_eq!(meeting["agent_id"], agent.id);
        assert_eq!(meeting["participants"][0]["email"], "ana@example.com");
        let uri = format!("/api/meetings/{}", meeting["id"]);

        let req = test::TestRequest::get().uri(&uri).insert_header(bearer(&other_token)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::put().uri(&uri).insert_header(bearer(&token)).set_json(json!({})).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&token))
            .set_json(json!({ "title": "Design review v2" }))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["title"], "Design review v2");

        let req = test::TestRequest::get().uri("/api/meetings").insert_header(bearer(&token)).to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let req = test::TestRequest::delete().uri(&uri).insert_header(bearer(&token)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        let req = test::TestRequest::delete().uri(&uri).insert_header(bearer(&token)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_create_validation() {
        let state = test_support::state();
        let (_, token) = test_support::user(&state, "host@example.com");
        let (other, _) = test_support::user(&state, "other@example.com");
        let foreign_agent = test_support::agent(&state, other.id, "Theirs", &[]);
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let cases = [
            (json!({ "title": " " }), StatusCode::BAD_REQUEST),
            (
                json!({
                    "title": "Backwards",
                    "scheduled_start": "2026-05-01T11:00:00Z",
                    "scheduled_end": "2026-05-01T10:00:00Z",
                }),
                StatusCode::BAD_REQUEST,
            ),
            (json!({ "title": "Borrowed", "agent_id": foreign_agent.id }), StatusCode::BAD_REQUEST),
            (
                json!({
                    "title": "Twins",
                    "participants": [
                        { "name": "A", "email": "same@example.com" },
                        { "name": "B", "email": "SAME@example.com" },
                    ],
                }),
                StatusCode::CONFLICT,
            ),
        ];
        for (payload, expected) in cases {
            let req = test::TestRequest::post()
                .uri("/api/meetings")
                .insert_header(bearer(&token))
                .set_json(payload)
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), expected);
        }
    }

    #[actix_web::test]
    async fn test_lifecycle_endpoints() {
        let state = test_support::state();
        let (user, token) = test_support::user(&state, "host@example.com");
        let meeting = test_support::meeting(&state, user.id, "Retro");
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let post = |path: &str| {
            test::TestRequest::post()
                .uri(&format!("/api/meetings/{}/{}", meeting.id, path))
                .insert_header(bearer(&token))
                .to_request()
        };

        let resp = test::call_service(&app, post("end")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["message"], "Cannot end meeting in status scheduled");

        let body: Value = test::read_body_json(test::call_service(&app, post("start")).await).await;
        assert_eq!(body["status"], "in_progress");
        assert!(body["actual_start"].is_string());

        state
            .db
            .add_transcript(meeting.id, &NewTranscript {
                speaker: "Ana".to_string(),
                content: "We decided to keep the format. I will send the notes by Friday.".to_string(),
                ..Default::default()
            })
            .unwrap();

        let body: Value = test::read_body_json(test::call_service(&app, post("end")).await).await;
        assert_eq!(body["status"], "completed");
        assert!(state.db.get_summary(meeting.id).unwrap().is_some());

        let resp = test::call_service(&app, post("cancel")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_status_through_update() {
        let state = test_support::state();
        let (user, token) = test_support::user(&state, "host@example.com");
        let meeting = test_support::meeting(&state, user.id, "Retro");
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let uri = format!("/api/meetings/{}", meeting.id);

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&token))
            .set_json(json!({ "status": "completed" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&token))
            .set_json(json!({ "status": "cancelled" }))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["status"], "cancelled");
    }

    #[actix_web::test]
    async fn test_calendar_sync_is_idempotent() {
        let state = test_support::state();
        let (user, token) = test_support::user(&state, "host@example.com");
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let sync = || {
            test::TestRequest::post()
                .uri("/api/meetings/sync-calendar")
                .insert_header(bearer(&token))
                .to_request()
        };

        let first: Value = test::read_body_json(test::call_service(&app, sync()).await).await;
        assert_eq!(first["imported"], 3);
        assert_eq!(first["updated"], 0);
        let meeting_id = first["meetings"][0]["id"].as_i64().unwrap();
        let participants = state.db.list_participants(meeting_id).unwrap();
        assert_eq!(participants[0].role, crate::models::ParticipantRole::Host);

        let second: Value = test::read_body_json(test::call_service(&app, sync()).await).await;
        assert_eq!(second["imported"], 0);
        assert_eq!(second["updated"], 3);

        state.db.set_meeting_status(meeting_id, user.id, MeetingStatus::Cancelled).unwrap();
        let third: Value = test::read_body_json(test::call_service(&app, sync()).await).await;
        assert_eq!(third["updated"], 2);
        assert_eq!(third["unchanged"], 1);
    }

    #[actix_web::test]
    async fn test_participants() {
        let state = test_support::state();
        let (user, token) = test_support::user(&state, "host@example.com");
        let meeting = test_support::meeting(&state, user.id, "Retro");
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let uri = format!("/api/meetings/{}/participants", meeting.id);

        let add = |payload: Value| {
            test::TestRequest::post()
                .uri(&uri)
                .insert_header(bearer(&token))
                .set_json(payload)
                .to_request()
        };
        let resp = test::call_service(&app, add(json!({ "name": "Ben", "email": "ben@example.com" }))).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let participant: Value = test::read_body_json(resp).await;
        assert_eq!(participant["role"], "attendee");

        let resp = test::call_service(&app, add(json!({ "name": "Ben again", "email": "ben@example.com" }))).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::get().uri(&uri).insert_header(bearer(&token)).to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let remove = format!("{}/{}", uri, participant["id"]);
        let req = test::TestRequest::delete().uri(&remove).insert_header(bearer(&token)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        let req = test::TestRequest::delete().uri(&remove).insert_header(bearer(&token)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
