use std::str::FromStr;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::models::{Folder, InvoiceStatus, StoredInvoice, User};

/// Key/value storage on top of a single SQLite table.
///
/// There are no transactions and no secondary indexes: everything is a point
/// lookup or a scan over a key prefix.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

// Key layout
fn token_key(token: &str) -> String {
    format!("token:{}", token)
}

fn user_key(user_id: &str) -> String {
    format!("user:{}", user_id)
}

fn folder_key(user_id: &str, folder_id: &str) -> String {
    format!("folder:{}:{}", user_id, folder_id)
}

fn sequence_key(user_id: &str, folder_id: &str) -> String {
    format!("seq:{}:{}", user_id, folder_id)
}

fn invoice_key(user_id: &str, invoice_id: &str) -> String {
    format!("invoice:{}:{}", user_id, invoice_id)
}

impl Database {
    /// Open (creating if needed) the database at `url` and make sure the table exists
    pub async fn connect(url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// A private in-memory store. A single connection that never expires keeps the data alive.
    pub async fn in_memory() -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> AppResult<()> {
        sqlx::query("CREATE TABLE IF NOT EXISTS kv (key TEXT PRIMARY KEY NOT NULL, value TEXT NOT NULL)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // Raw key/value operations
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let raw: Option<String> = sqlx::query_scalar("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        tracing::debug!(key, hit = raw.is_some(), "kv get");

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        let raw = serde_json::to_string(value)?;
        sqlx::query(
            "INSERT INTO kv (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(raw)
        .execute(&self.pool)
        .await?;

        tracing::debug!(key, "kv put");
        Ok(())
    }

    /// Insert only when the key is free. Returns false if it was already taken.
    pub async fn put_if_absent<T: Serialize>(&self, key: &str, value: &T) -> AppResult<bool> {
        let raw = serde_json::to_string(value)?;
        let result = sqlx::query("INSERT OR IGNORE INTO kv (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(raw)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn delete(&self, key: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// All values whose key starts with `prefix`, in key order
    pub async fn list<T: DeserializeOwned>(&self, prefix: &str) -> AppResult<Vec<T>> {
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT value FROM kv WHERE substr(key, 1, length(?)) = ? ORDER BY key ASC",
        )
        .bind(prefix)
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(prefix, count = rows.len(), "kv list");

        rows.iter()
            .map(|raw| serde_json::from_str(raw).map_err(AppError::from))
            .collect()
    }

    /// Bump the counter stored at `key` and return the new value. Starts at 1.
    pub async fn increment(&self, key: &str) -> AppResult<i64> {
        let value: String = sqlx::query_scalar(
            "INSERT INTO kv (key, value) VALUES (?, '1') \
             ON CONFLICT(key) DO UPDATE SET value = CAST(CAST(value AS INTEGER) + 1 AS TEXT) \
             RETURNING value",
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await?;

        value
            .parse()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("counter {} holds a non-integer", key)))
    }

    // Token and user operations
    pub async fn resolve_token(&self, token: &str) -> AppResult<Option<String>> {
        self.get(&token_key(token)).await
    }

    pub async fn issue_token(&self, user_id: &str) -> AppResult<String> {
        let token = uuid::Uuid::new_v4().simple().to_string();
        self.put(&token_key(&token), &user_id).await?;
        Ok(token)
    }

    pub async fn get_user(&self, user_id: &str) -> AppResult<Option<User>> {
        self.get(&user_key(user_id)).await
    }

    /// Create the user unless it already exists; returns the stored user either way
    pub async fn ensure_user(&self, user_id: &str, name: &str) -> AppResult<User> {
        // ':' separates key segments
        if user_id.trim().is_empty() || user_id.contains(':') {
            return Err(AppError::Validation(format!("Invalid user id '{}'", user_id)));
        }

        let user = User {
            id: user_id.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };

        if self.put_if_absent(&user_key(user_id), &user).await? {
            return Ok(user);
        }

        self.get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    // Folder operations
    pub async fn create_folder(&self, folder: &Folder) -> AppResult<()> {
        self.put(&folder_key(&folder.user_id, &folder.id), folder).await
    }

    pub async fn get_folder(&self, user_id: &str, folder_id: &str) -> AppResult<Option<Folder>> {
        self.get(&folder_key(user_id, folder_id)).await
    }

    pub async fn list_folders(&self, user_id: &str) -> AppResult<Vec<Folder>> {
        let mut folders: Vec<Folder> = self.list(&format!("folder:{}:", user_id)).await?;
        folders.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(folders)
    }

    /// Reserve the next invoice sequence number for a folder
    pub async fn next_sequence(&self, user_id: &str, folder_id: &str) -> AppResult<u64> {
        let value = self.increment(&sequence_key(user_id, folder_id)).await?;
        Ok(value as u64)
    }

    // Invoice operations
    /// Persist a new invoice. Returns false when the identifier is already taken.
    pub async fn insert_invoice(&self, invoice: &StoredInvoice) -> AppResult<bool> {
        let key = invoice_key(&invoice.record.user_id, &invoice.record.id);
        self.put_if_absent(&key, invoice).await
    }

    pub async fn get_invoice(&self, user_id: &str, invoice_id: &str) -> AppResult<Option<StoredInvoice>> {
        self.get(&invoice_key(user_id, invoice_id)).await
    }

    pub async fn list_invoices(&self, user_id: &str) -> AppResult<Vec<StoredInvoice>> {
        self.list(&format!("invoice:{}:", user_id)).await
    }

    /// Rewrite only the status of an invoice; every other field is carried over untouched
    pub async fn set_invoice_status(
        &self,
        user_id: &str,
        invoice_id: &str,
        status: InvoiceStatus,
    ) -> AppResult<Option<StoredInvoice>> {
        let Some(mut invoice) = self.get_invoice(user_id, invoice_id).await? else {
            return Ok(None);
        };

        invoice.record.status = status;
        self.put(&invoice_key(user_id, invoice_id), &invoice).await?;

        Ok(Some(invoice))
    }
}

/// Initialize the database from the server configuration
pub async fn init(config: &ServerConfig) -> AppResult<Database> {
    let db = Database::connect(config.database_url()).await?;
    tracing::info!(url = %config.database_url(), "Database ready");
    Ok(db)
}
