use axum::{
    Json, async_trait,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::api::AppState;
use crate::error::AppError;
use crate::models::User;

/// The caller, resolved from `Authorization: Bearer <token>`
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            tracing::warn!(path = %parts.uri.path(), "Request without bearer token");
            return Err(AppError::Unauthorized("Missing bearer token".to_string()));
        };

        match state.db.resolve_token(token).await? {
            Some(user_id) => Ok(AuthUser { user_id }),
            None => {
                tracing::warn!(path = %parts.uri.path(), "Rejected unknown bearer token");
                Err(AppError::Unauthorized("Invalid bearer token".to_string()))
            }
        }
    }
}

/// The authenticated user's profile
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> Result<Json<User>, AppError> {
    let user = state
        .db
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", auth.user_id)))?;

    Ok(Json(user))
}
