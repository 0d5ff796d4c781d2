//! Shared setup for the API integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Once;

use axum::Router;
use chrono::NaiveDate;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use invoicer::api::{self, AppState};
use invoicer::db::Database;

static TRACING: Once = Once::new();

/// Route log output through the test harness so it only shows for failures
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("invoicer=debug,tower_http=warn")
            .with_test_writer()
            .try_init();
    });
}

pub const USER_ID: &str = "johndoe";
pub const USER_NAME: &str = "John Doe";

pub struct TestApp {
    pub db: Database,
    pub token: String,
}

impl TestApp {
    /// Fresh in-memory store with one user and a token for them
    pub async fn new() -> Self {
        init_tracing();

        let db = Database::in_memory().await.expect("Failed to open in-memory database");
        db.ensure_user(USER_ID, USER_NAME).await.expect("Failed to create user");
        let token = db.issue_token(USER_ID).await.expect("Failed to issue token");

        Self { db, token }
    }

    pub fn router(&self) -> Router {
        api::build_router(AppState::new(self.db.clone()))
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Serve the API on an ephemeral port for tests that go through HTTP
    pub async fn spawn(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no local address");

        let db = self.db.clone();
        tokio::spawn(async move {
            if let Err(e) = api::run(listener, db).await {
                eprintln!("Test server stopped: {}", e);
            }
        });

        addr
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Three items at 33.33 with 20% line tax, due at the end of January 2024
pub fn invoice_body() -> Value {
    json!({
        "sellerContact": { "name": USER_NAME, "email": "john@example.test" },
        "buyerContact": { "name": "Acme Corp" },
        "items": [
            { "description": "Consulting", "qty": 3, "unit": 33.33, "tax": 20 }
        ],
        "currency": "usd",
        "issueDate": "2024-01-01",
        "dueDate": "2024-01-31"
    })
}

/// 1000 of work with 20% invoice tax and 15% discount
pub fn adjusted_invoice_body() -> Value {
    json!({
        "sellerContact": { "name": USER_NAME },
        "buyerContact": { "name": "Acme Corp" },
        "items": [
            { "description": "Retainer", "qty": 1, "unit": 1000 }
        ],
        "currency": "EUR",
        "issueDate": "2024-02-01",
        "dueDate": "2099-02-15",
        "taxRate": 20,
        "discountRate": 15,
        "notes": "Thanks for your business"
    })
}
