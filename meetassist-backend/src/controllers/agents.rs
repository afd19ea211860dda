use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::db::sqlite::is_unique_violation;
use crate::error::{ApiError, ApiResult};
use crate::middleware::jwt_auth::authenticate;
use crate::models::{Agent, AgentQuery, CreateAgentRequest, TestAgentRequest, UpdateAgentRequest};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/agents")
            .route("", web::get().to(list_agents))
            .route("", web::post().to(create_agent))
            .route("/{id}", web::get().to(get_agent))
            .route("/{id}", web::put().to(update_agent))
            .route("/{id}", web::delete().to(delete_agent))
            .route("/{id}/test", web::post().to(test_agent)),
    );
}

fn duplicate_name(err: rusqlite::Error) -> ApiError {
    if is_unique_violation(&err) {
        ApiError::Conflict("An agent with this name already exists".to_string())
    } else {
        err.into()
    }
}

fn owned_agent(state: &AppState, id: i64, user_id: i64) -> ApiResult<Agent> {
    state
        .db
        .get_agent(id, user_id)?
        .ok_or_else(|| ApiError::not_found("Agent not found"))
}

async fn list_agents(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<AgentQuery>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    Ok(HttpResponse::Ok().json(state.db.list_agents(user.id, query.active)?))
}

async fn create_agent(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateAgentRequest>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    if body.name.trim().is_empty() {
        return Err(ApiError::bad_request("Agent name is required"));
    }

    let agent = state.db.create_agent(user.id, &body).map_err(duplicate_name)?;
    log::info!("User {} created agent {} ({})", user.id, agent.id, agent.agent_type);
    Ok(HttpResponse::Created().json(agent))
}

async fn get_agent(state: web::Data<AppState>, req: HttpRequest, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    Ok(HttpResponse::Ok().json(owned_agent(&state, path.into_inner(), user.id)?))
}

async fn update_agent(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateAgentRequest>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let id = path.into_inner();
    if body.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    if matches!(&body.name, Some(name) if name.trim().is_empty()) {
        return Err(ApiError::bad_request("Agent name cannot be empty"));
    }

    let agent = state
        .db
        .update_agent(id, user.id, &body)
        .map_err(duplicate_name)?
        .ok_or_else(|| ApiError::not_found("Agent not found"))?;
    log::info!("Updated agent {}", agent.id);
    Ok(HttpResponse::Ok().json(agent))
}

async fn delete_agent(state: web::Data<AppState>, req: HttpRequest, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let id = path.into_inner();
    if !state.db.delete_agent(id, user.id)? {
        return Err(ApiError::not_found("Agent not found"));
    }
    log::info!("Deleted agent {}", id);
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// Dry run of the responder against some text; nothing is stored
async fn test_agent(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<TestAgentRequest>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let agent = owned_agent(&state, path.into_inner(), user.id)?;
    let speaker = body.speaker.as_deref().unwrap_or(&user.name);

    let reply = state.providers.responder.respond(&agent, speaker, &body.text).await;
    Ok(HttpResponse::Ok().json(match reply {
        Some(reply) => json!({
            "triggered": true,
            "keyword": reply.keyword,
            "response": reply.response,
        }),
        None => json!({
            "triggered": false,
            "keyword": null,
            "response": null,
        }),
    }))
}

#[cfg(test)]
mod tests {
    use crate::controllers::configure;
    use crate::test_support::{self, bearer};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_agent_crud_contract() {
        let state = test_support::state();
        let (_, token) = test_support::user(&state, "host@example.com");
        let (_, other_token) = test_support::user(&state, "other@example.com");
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/agents")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "Scribe", "agent_type": "note_taker", "trigger_keywords": ["Budget"] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let agent: Value = test::read_body_json(resp).await;
        assert_eq!(agent["agent_type"], "note_taker");
        assert_eq!(agent["trigger_keywords"], json!(["budget"]));
        let uri = format!("/api/agents/{}", agent["id"]);

        let req = test::TestRequest::post()
            .uri("/api/agents")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "Scribe" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::post()
            .uri("/api/agents")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "Other", "agent_type": "moderator" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri(&uri).insert_header(bearer(&other_token)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::put().uri(&uri).insert_header(bearer(&token)).set_json(json!({})).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&token))
            .set_json(json!({ "is_active": false }))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["is_active"], false);

        let req = test::TestRequest::get()
            .uri("/api/agents?active=true")
            .insert_header(bearer(&token))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert!(body.as_array().unwrap().is_empty());

        let req = test::TestRequest::delete().uri(&uri).insert_header(bearer(&token)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        let req = test::TestRequest::delete().uri(&uri).insert_header(bearer(&token)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_dry_run_response() {
        let state = test_support::state();
        let (user, token) = test_support::user(&state, "host@example.com");
        let agent = test_support::agent(&state, user.id, "Scribe", &["deadline"]);
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let uri = format!("/api/agents/{}/test", agent.id);

        let req = test::TestRequest::post()
            .uri(&uri)
            .insert_header(bearer(&token))
            .set_json(json!({ "text": "What is the Deadline again?", "speaker": "Ana" }))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["triggered"], true);
        assert_eq!(body["keyword"], "deadline");

        let req = test::TestRequest::post()
            .uri(&uri)
            .insert_header(bearer(&token))
            .set_json(json!({ "text": "Nothing relevant" }))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["triggered"], false);
        assert!(state.db.list_transcripts(1, None).unwrap().is_empty());
    }
}
