//! # Authentication and Authorization
//!
//! Every `/api/v1` request carries a bearer API token and an `X-User-Id`
//! header naming the acting user. The middleware validates both and passes
//! an explicit [`RequestContext`] to handlers through the request extensions.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ApiError, forbidden, unauthorized, validation_error};
use crate::models::user::UserRole;
use crate::repositories::UserRepository;
use crate::server::AppState;
use crate::validation::is_valid_uuid;

/// Header naming the acting user
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated acting user of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl RequestContext {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(forbidden(Some("Administrator role required")))
        }
    }

    /// Allows the given user themselves or an administrator
    pub fn require_self_or_admin(&self, user_id: Uuid) -> Result<(), ApiError> {
        if self.user_id == user_id || self.is_admin() {
            Ok(())
        } else {
            Err(forbidden(None))
        }
    }
}

/// Authentication middleware for the `/api/v1` routes
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = {
        let headers = request.headers();
        let token = extract_bearer_token(headers)?;
        validate_token(&state.config, token)?;
        extract_user_id(headers)?
    };

    let user = UserRepository::new(&state.db)
        .find(user_id)
        .await?
        .ok_or_else(|| unauthorized(Some("Unknown acting user")))?;

    tracing::debug!(user_id = %user.id, role = ?user.role, "Authenticated request");

    request.extensions_mut().insert(RequestContext {
        user_id: user.id,
        role: user.role,
    });

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))?
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))
}

fn validate_token(config: &AppConfig, token: &str) -> Result<(), ApiError> {
    let is_valid = config
        .api_tokens
        .iter()
        .any(|configured| ConstantTimeEq::ct_eq(token.as_bytes(), configured.as_bytes()).into());

    if is_valid {
        Ok(())
    } else {
        Err(unauthorized(Some("Invalid bearer token")))
    }
}

fn extract_user_id(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let header_value = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| unauthorized(Some("Missing X-User-Id header")))?
        .to_str()
        .map_err(|_| {
            validation_error(
                "Invalid user header",
                serde_json::json!({ "X-User-Id": "Header must be valid UTF-8" }),
            )
        })?;

    Some(header_value.trim())
        .filter(|value| is_valid_uuid(value))
        .and_then(|value| Uuid::parse_str(value).ok())
        .ok_or_else(|| {
            validation_error(
                "Invalid user ID",
                serde_json::json!({ "X-User-Id": "Must be a valid UUID" }),
            )
        })
}

/// OpenAPI header parameter for X-User-Id
#[derive(Debug, Serialize, Deserialize, IntoParams, utoipa::ToSchema)]
#[into_params(parameter_in = Header)]
pub struct UserHeader {
    /// Identifier (UUID) of the user performing the request
    #[serde(rename = "X-User-Id")]
    #[param(rename = "X-User-Id", value_type = String)]
    pub user_id: String,
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .copied()
            .ok_or_else(|| unauthorized(Some("Authentication required")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config_with_token(token: &str) -> AppConfig {
        AppConfig {
            api_tokens: vec![token.to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        assert_eq!(extract_bearer_token(&headers).unwrap(), "secret");
    }

    #[test]
    fn test_token_validation() {
        let config = config_with_token("secret");
        assert!(validate_token(&config, "secret").is_ok());
        assert!(validate_token(&config, "secret2").is_err());
        assert!(validate_token(&config, "").is_err());
    }

    #[test]
    fn test_user_id_header() {
        let mut headers = HeaderMap::new();
        let missing = extract_user_id(&headers).unwrap_err();
        assert_eq!(missing.status, axum::http::StatusCode::UNAUTHORIZED);

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        let invalid = extract_user_id(&headers).unwrap_err();
        assert_eq!(invalid.status, axum::http::StatusCode::BAD_REQUEST);

        let id = Uuid::new_v4();
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(extract_user_id(&headers).unwrap(), id);
    }

    #[test]
    fn test_role_checks() {
        let resident = RequestContext {
            user_id: Uuid::new_v4(),
            role: UserRole::Resident,
        };
        let admin = RequestContext {
            user_id: Uuid::new_v4(),
            role: UserRole::Admin,
        };

        assert!(resident.require_admin().is_err());
        assert!(admin.require_admin().is_ok());
        assert!(resident.require_self_or_admin(resident.user_id).is_ok());
        assert!(resident.require_self_or_admin(admin.user_id).is_err());
        assert!(admin.require_self_or_admin(resident.user_id).is_ok());
    }
}
