// Bearer token authentication.
// Controllers call `authenticate` at the top of each protected handler; the
// WebSocket handler passes its token through `authenticate_token`.

use actix_web::HttpRequest;

use crate::auth::decode_token;
use crate::error::{ApiError, ApiResult};
use crate::models::User;
use crate::AppState;

pub fn extract_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim_start_matches("Bearer ").trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn authenticate(state: &AppState, req: &HttpRequest) -> ApiResult<User> {
    authenticate_token(state, extract_token(req).as_deref())
}

pub fn authenticate_token(state: &AppState, token: Option<&str>) -> ApiResult<User> {
    let token = token.ok_or_else(|| ApiError::Unauthorized("No authorization token provided".to_string()))?;

    let user_id = decode_token(token, &state.config.secret_key)
        .and_then(|claims| claims.user_id())
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

    match state.db.get_user(user_id) {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(ApiError::Unauthorized("User not found".to_string())),
        Err(e) => {
            log::error!("User lookup failed during authentication: {}", e);
            Err(e.into())
        }
    }
}

pub fn require_admin(user: &User) -> ApiResult<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Admin access required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use actix_web::test::TestRequest;

    #[test]
    fn test_extract_token() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc.def"))
            .to_http_request();
        assert_eq!(extract_token(&req).as_deref(), Some("abc.def"));
        assert!(extract_token(&TestRequest::default().to_http_request()).is_none());
    }

    #[test]
    fn test_authenticate_outcomes() {
        let state = test_support::state();
        let (user, token) = test_support::user(&state, "ana@example.com");

        assert_eq!(authenticate_token(&state, Some(&token)).unwrap().id, user.id);

        let err = authenticate_token(&state, None).unwrap_err();
        assert_eq!(err.to_string(), "No authorization token provided");

        let err = authenticate_token(&state, Some("not-a-jwt")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid or expired token");

        state.db.delete_user(user.id).unwrap();
        let err = authenticate_token(&state, Some(&token)).unwrap_err();
        assert_eq!(err.to_string(), "User not found");
    }

    #[test]
    fn test_require_admin() {
        let state = test_support::state();
        let (admin, _) = test_support::user(&state, "first@example.com");
        let (member, _) = test_support::user(&state, "second@example.com");
        assert!(require_admin(&admin).is_ok());
        assert!(matches!(require_admin(&member), Err(ApiError::Forbidden(_))));
    }
}
