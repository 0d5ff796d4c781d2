use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::api::{AppState, auth::AuthUser};
use crate::error::AppError;
use crate::models::{InvoiceRecord, InvoiceRequest, InvoiceStatus};
use crate::services::invoicing::{self, CreatedInvoice, InvoiceDetail, SearchQuery};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: InvoiceStatus,
}

/// Create an invoice in a folder
pub async fn create_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(folder_id): Path<String>,
    Json(payload): Json<InvoiceRequest>,
) -> Result<(StatusCode, Json<CreatedInvoice>), AppError> {
    let created = invoicing::create_invoice(&state.db, &auth.user_id, &folder_id, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Invoices of one folder, newest first
pub async fn list_folder_invoices(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(folder_id): Path<String>,
) -> Result<Json<Vec<InvoiceRecord>>, AppError> {
    if state.db.get_folder(&auth.user_id, &folder_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Folder {} not found", folder_id)));
    }

    let query = SearchQuery {
        folder: Some(folder_id),
        ..SearchQuery::default()
    };
    let invoices = invoicing::search(&state.db, &auth.user_id, &query).await?;
    Ok(Json(invoices))
}

/// All of the caller's invoices matching `?folder=&status=&q=`
pub async fn search_invoices(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<InvoiceRecord>>, AppError> {
    let invoices = invoicing::search(&state.db, &auth.user_id, &query).await?;
    Ok(Json(invoices))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invoice_id): Path<String>,
) -> Result<Json<InvoiceDetail>, AppError> {
    let invoice = invoicing::get_invoice(&state.db, &auth.user_id, &invoice_id).await?;
    Ok(Json(InvoiceDetail::from(invoice)))
}

pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invoice_id): Path<String>,
    Json(payload): Json<StatusUpdate>,
) -> Result<Json<InvoiceRecord>, AppError> {
    let record = invoicing::update_status(&state.db, &auth.user_id, &invoice_id, payload.status).await?;
    Ok(Json(record))
}

/// The rendered document as `application/pdf`
pub async fn download_pdf(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invoice_id): Path<String>,
) -> Result<Response, AppError> {
    let invoice = invoicing::get_invoice(&state.db, &auth.user_id, &invoice_id).await?;
    let bytes = state.generator.render_pdf(&invoice)?;

    let disposition = format!("attachment; filename=\"{}.pdf\"", invoice.record.id);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
