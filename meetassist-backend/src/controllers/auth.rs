use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::auth::{hash_password, issue_token, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::middleware::jwt_auth::authenticate;
use crate::models::{
    is_valid_email, AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, User, MIN_PASSWORD_LENGTH,
};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/me", web::get().to(me))
            .route("/change-password", web::post().to(change_password)),
    );
}

fn check_password(password: &str) -> ApiResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

fn auth_response(state: &AppState, user: User) -> ApiResult<AuthResponse> {
    let (token, expires_at) = issue_token(&user, &state.config.secret_key, state.config.jwt_expiry_hours)?;
    Ok(AuthResponse { token, expires_at, user })
}

async fn register(state: web::Data<AppState>, body: web::Json<RegisterRequest>) -> ApiResult<HttpResponse> {
    let request = body.into_inner();
    let email = request.email.trim();
    let name = request.name.trim();
    if !is_valid_email(email) {
        return Err(ApiError::bad_request("A valid email is required"));
    }
    if name.is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    check_password(&request.password)?;

    if state.db.get_user_by_email(email)?.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let hash = hash_password(&request.password)?;
    let timezone = request.timezone.as_deref().unwrap_or("UTC");
    let user = state.db.create_user(email, name, &hash, timezone)?;
    log::info!("Registered user {} ({})", user.id, user.email);

    Ok(HttpResponse::Created().json(auth_response(&state, user)?))
}

async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> ApiResult<HttpResponse> {
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = state.db.get_user_by_email(&body.email)?.ok_or_else(invalid)?;
    if !verify_password(&body.password, &user.password_hash) {
        log::warn!("Failed login for {}", user.email);
        return Err(invalid());
    }
    log::info!("User {} logged in", user.id);

    Ok(HttpResponse::Ok().json(auth_response(&state, user)?))
}

async fn me(state: web::Data<AppState>, req: HttpRequest) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    Ok(HttpResponse::Ok().json(user))
}

async fn change_password(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ChangePasswordRequest>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    if !verify_password(&body.current_password, &user.password_hash) {
        return Err(ApiError::bad_request("Current password is incorrect"));
    }
    check_password(&body.new_password)?;

    let hash = hash_password(&body.new_password)?;
    if !state.db.update_password_hash(user.id, &hash)? {
        return Err(ApiError::not_found("User not found"));
    }
    log::info!("User {} changed password", user.id);

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
