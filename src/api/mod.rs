//! HTTP API over the invoice store.

pub mod auth;
pub mod folders;
pub mod invoices;
pub mod middleware;
pub mod stats;

use anyhow::Result;
use axum::{
    Json, Router,
    routing::{get, patch},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::db::{self, Database};
use crate::invoice_gen::InvoiceGenerator;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub generator: InvoiceGenerator,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            generator: InvoiceGenerator::new(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/me", get(auth::me))
        .route("/folders", get(folders::list_folders).post(folders::create_folder))
        .route("/folders/:id", get(folders::get_folder))
        .route(
            "/folders/:id/invoices",
            get(invoices::list_folder_invoices).post(invoices::create_invoice),
        )
        .route("/invoices", get(invoices::search_invoices))
        .route("/invoices/:id", get(invoices::get_invoice))
        .route("/invoices/:id/status", patch(invoices::update_status))
        .route("/invoices/:id/pdf", get(invoices::download_pdf))
        .route("/stats", get(stats::get_stats))
        .layer(TraceLayer::new_for_http().make_span_with(middleware::make_request_span))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Open the database and serve until interrupted
pub async fn serve(config: &ServerConfig) -> Result<()> {
    let db = db::init(config).await?;
    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Invoice API listening");

    run(listener, db).await
}

/// Serve on an already bound listener
pub async fn run(listener: TcpListener, db: Database) -> Result<()> {
    axum::serve(listener, build_router(AppState::new(db)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Invoice API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
