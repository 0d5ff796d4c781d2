use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::api::{AppState, auth::AuthUser};
use crate::error::AppError;
use crate::models::{Folder, NewFolder};

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn list_folders(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Folder>>, AppError> {
    let folders = state.db.list_folders(&auth.user_id).await?;
    Ok(Json(folders))
}

pub async fn create_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(mut payload): Json<NewFolder>,
) -> Result<(StatusCode, Json<Folder>), AppError> {
    payload.name = payload.name.trim().to_string();
    payload.email = non_blank(payload.email);
    payload.validate()?;

    let folder = Folder {
        id: Uuid::new_v4().to_string(),
        user_id: auth.user_id.clone(),
        name: payload.name,
        email: payload.email,
        address: non_blank(payload.address),
        created_at: Utc::now(),
    };

    state.db.create_folder(&folder).await?;

    tracing::info!(folder_id = %folder.id, user_id = %auth.user_id, name = %folder.name, "Created folder");

    Ok((StatusCode::CREATED, Json(folder)))
}

pub async fn get_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(folder_id): Path<String>,
) -> Result<Json<Folder>, AppError> {
    let folder = state
        .db
        .get_folder(&auth.user_id, &folder_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Folder {} not found", folder_id)))?;

    Ok(Json(folder))
}
