//! WebSocket endpoint served by actix on the HTTP port

use ::actix_ws::{CloseReason, Message, Session};
use actix_web::{rt, web, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

use super::methods;
use super::protocol::{RpcError, RpcRequest, RpcResponse};
use crate::middleware::jwt_auth::{authenticate_token, extract_token};
use crate::models::User;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// Upgrade an authenticated request and run the connection loop
pub async fn ws_handler(
    req: HttpRequest,
    body: web::Payload,
    state: web::Data<AppState>,
    query: web::Query<WsQuery>,
) -> Result<HttpResponse, actix_web::Error> {
    let token = query.into_inner().token.or_else(|| extract_token(&req));
    let user = authenticate_token(&state, token.as_deref())?;

    let (response, session, msg_stream) = ::actix_ws::handle(&req, body)?;
    let client_id = uuid::Uuid::new_v4().to_string();
    log::info!("[WS] User {} connected as {}", user.id, client_id);

    rt::spawn(run_connection(state.into_inner(), user, client_id, session, msg_stream));
    Ok(response)
}

async fn run_connection(
    state: std::sync::Arc<AppState>,
    user: User,
    client_id: String,
    mut session: Session,
    mut msg_stream: ::actix_ws::MessageStream,
) {
    let mut events = state.gateway.broadcaster().subscribe(&client_id);
    let mut close_reason: Option<CloseReason> = None;

    loop {
        tokio::select! {
            msg = msg_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_frame(&state, &client_id, &user, &text).await;
                        if send_json(&mut session, &response).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(bytes))) => {
                        if session.pong(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(reason))) => {
                        close_reason = reason;
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        log::warn!("[WS] Protocol error on {}: {}", client_id, e);
                        break;
                    }
                    None => break,
                }
            }
            event = events.recv() => {
                match event {
                    Some(event) => {
                        if send_json(&mut session, &event).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    methods::disconnect(&state, &client_id, &user);
    let _ = session.close(close_reason).await;
    log::info!("[WS] {} disconnected", client_id);
}

async fn handle_frame(state: &AppState, client_id: &str, user: &User, text: &str) -> RpcResponse {
    match serde_json::from_str::<RpcRequest>(text) {
        Ok(request) => methods::dispatch(state, client_id, user, request).await,
        Err(e) => {
            log::debug!("[WS] Malformed frame from {}: {}", client_id, e);
            RpcResponse::error(salvage_id(text), RpcError::parse_error())
        }
    }
}

/// Best-effort request id from a frame that failed to parse
fn salvage_id(text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(str::to_string))
        .unwrap_or_default()
}

async fn send_json<T: Serialize>(session: &mut Session, value: &T) -> Result<(), ::actix_ws::Closed> {
    match serde_json::to_string(value) {
        Ok(text) => session.text(text).await,
        Err(e) => {
            log::error!("[WS] Failed to serialize outgoing frame: {}", e);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use actix_web::{http::StatusCode, test::{call_service, init_service, TestRequest}, App};

    #[test]
    fn test_salvage_id() {
        assert_eq!(salvage_id(r#"{"id":"42","method":5}"#), "42");
        assert_eq!(salvage_id("not json"), "");
    }

    #[actix_web::test]
    async fn test_malformed_frame_gets_parse_error() {
        let state = test_support::state();
        let (user, _) = test_support::user(&state, "host@example.com");
        let resp = handle_frame(&state, "c1", &user, r#"{"id":"7","method":"join_meeting","params":"#).await;
        assert_eq!(resp.id, "");
        assert_eq!(resp.error.unwrap().code, -32700);

        let resp = handle_frame(&state, "c1", &user, r#"{"id":"8"}"#).await;
        assert_eq!(resp.id, "8");
        assert_eq!(resp.error.unwrap().code, -32700);
    }

    #[actix_web::test]
    async fn test_upgrade_requires_token() {
        let state = test_support::state();
        let app = init_service(
            App::new()
                .app_data(state.clone())
                .route("/ws", web::get().to(ws_handler)),
        )
        .await;

        let resp = call_service(&app, TestRequest::get().uri("/ws").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = call_service(&app, TestRequest::get().uri("/ws?token=garbage").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
