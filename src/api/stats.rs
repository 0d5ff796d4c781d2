use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use serde::Deserialize;

use crate::api::{AppState, auth::AuthUser};
use crate::error::AppError;
use crate::models::RevenueStats;
use crate::services::stats::stats_for_user;

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub folder: Option<String>,
}

pub async fn get_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<StatsQuery>,
) -> Result<Json<RevenueStats>, AppError> {
    let today = Utc::now().date_naive();
    let stats = stats_for_user(&state.db, &auth.user_id, query.folder.as_deref(), today).await?;
    Ok(Json(stats))
}
