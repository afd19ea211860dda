use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::error::{ApiError, ApiResult};
use crate::middleware::jwt_auth::{authenticate, require_admin};
use crate::models::{is_valid_email, UpdateUserRequest, User};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/users")
            .route("", web::get().to(list_users))
            .route("/{id}", web::get().to(get_user))
            .route("/{id}", web::put().to(update_user))
            .route("/{id}", web::delete().to(delete_user)),
    );
}

/// Users may manage themselves; admins may manage anyone
fn require_self_or_admin(caller: &User, target_id: i64) -> ApiResult<()> {
    if caller.id == target_id || caller.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("You can only manage your own account".to_string()))
    }
}

async fn list_users(state: web::Data<AppState>, req: HttpRequest) -> ApiResult<HttpResponse> {
    let caller = authenticate(&state, &req)?;
    require_admin(&caller)?;
    Ok(HttpResponse::Ok().json(state.db.list_users()?))
}

async fn get_user(state: web::Data<AppState>, req: HttpRequest, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let caller = authenticate(&state, &req)?;
    let id = path.into_inner();
    require_self_or_admin(&caller, id)?;

    let user = state
        .db
        .get_user(id)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(HttpResponse::Ok().json(user))
}

async fn update_user(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateUserRequest>,
) -> ApiResult<HttpResponse> {
    let caller = authenticate(&state, &req)?;
    let id = path.into_inner();
    require_self_or_admin(&caller, id)?;

    let request = body.into_inner();
    if request.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    if request.role.is_some() && !caller.is_admin() {
        return Err(ApiError::Forbidden("Only admins can change roles".to_string()));
    }
    if matches!(&request.name, Some(name) if name.trim().is_empty()) {
        return Err(ApiError::bad_request("Name cannot be empty"));
    }
    if matches!(&request.email, Some(email) if !is_valid_email(email)) {
        return Err(ApiError::bad_request("A valid email is required"));
    }

    let user = state
        .db
        .update_user(id, &request)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    log::info!("User {} updated by {}", user.id, caller.id);
    Ok(HttpResponse::Ok().json(user))
}

async fn delete_user(state: web::Data<AppState>, req: HttpRequest, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let caller = authenticate(&state, &req)?;
    let id = path.into_inner();
    require_self_or_admin(&caller, id)?;

    if !state.db.delete_user(id)? {
        return Err(ApiError::not_found("User not found"));
    }
    log::info!("User {} deleted by {}", id, caller.id);
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use crate::controllers::configure;
    use crate::test_support::{self, bearer};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_listing_is_admin_only() {
        let state = test_support::state();
        let (_, admin_token) = test_support::user(&state, "admin@example.com");
        let (_, member_token) = test_support::user(&state, "member@example.com");
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/users").insert_header(bearer(&admin_token)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body.as_array().unwrap().len(), 2);

        let req = test::TestRequest::get().uri("/api/users").insert_header(bearer(&member_token)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_self_or_admin_access() {
        let state = test_support::state();
        let (admin, admin_token) = test_support::user(&state, "admin@example.com");
        let (member, member_token) = test_support::user(&state, "member@example.com");
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/users/{}", admin.id))
            .insert_header(bearer(&member_token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri(&format!("/api/users/{}", member.id))
            .insert_header(bearer(&admin_token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/api/users/999").insert_header(bearer(&admin_token)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/api/users/abc").insert_header(bearer(&admin_token)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_update_rules() {
        let state = test_support::state();
        test_support::user(&state, "admin@example.com");
        let (member, token) = test_support::user(&state, "member@example.com");
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let uri = format!("/api/users/{}", member.id);

        let req = test::TestRequest::put().uri(&uri).insert_header(bearer(&token)).set_json(json!({})).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["message"], "No fields to update");

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&token))
            .set_json(json!({ "role": "admin" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "Morgan", "timezone": "Europe/Oslo" }))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["name"], "Morgan");
        assert_eq!(body["timezone"], "Europe/Oslo");

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&token))
            .set_json(json!({ "email": "admin@example.com" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_delete_twice() {
        let state = test_support::state();
        let (admin, token) = test_support::user(&state, "admin@example.com");
        let (member, _) = test_support::user(&state, "member@example.com");
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let uri = format!("/api/users/{}", member.id);

        let req = test::TestRequest::delete().uri(&uri).insert_header(bearer(&token)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        let req = test::TestRequest::delete().uri(&uri).insert_header(bearer(&token)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
        assert!(state.db.get_user(admin.id).unwrap().is_some());
    }
}
