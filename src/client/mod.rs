//! Typed HTTP client for the invoice API.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::{CliConfig, QuickDefaults};
use crate::models::{Folder, InvoiceRecord, InvoiceRequest, InvoiceStatus, NewFolder, RevenueStats, User};
use crate::services::{CreatedInvoice, InvoiceDetail, SearchQuery};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Unauthorized: check the configured apiKey")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    details: Option<String>,
}

impl ErrorBody {
    fn message(self) -> String {
        match self.details {
            Some(details) if !details.is_empty() => format!("{} ({})", self.error, details),
            _ => self.error,
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    defaults: QuickDefaults,
}

impl ApiClient {
    pub fn new(config: &CliConfig) -> ClientResult<Self> {
        let base_url = config.api_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| ClientError::Config(format!("apiUrl '{}': {}", config.api_url, e)))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
            defaults: config.quick_defaults.clone(),
        })
    }

    pub fn quick_defaults(&self) -> &QuickDefaults {
        &self.defaults
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        if self.api_key.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.api_key)
        }
    }

    /// Turn non-2xx responses into the matching error kind
    async fn check(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(ErrorBody::message)
            .unwrap_or(text);

        tracing::debug!(status = status.as_u16(), %message, "API request failed");

        Err(match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::UNPROCESSABLE_ENTITY | StatusCode::BAD_REQUEST => ClientError::Validation(message),
            StatusCode::CONFLICT => ClientError::Conflict(message),
            other => ClientError::Server {
                status: other.as_u16(),
                message,
            },
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = Self::check(builder.send().await?).await?;
        Ok(response.json().await?)
    }

    pub async fn me(&self) -> ClientResult<User> {
        self.send_json(self.request(Method::GET, "/me")).await
    }

    pub async fn list_folders(&self) -> ClientResult<Vec<Folder>> {
        self.send_json(self.request(Method::GET, "/folders")).await
    }

    pub async fn create_folder(&self, folder: &NewFolder) -> ClientResult<Folder> {
        self.send_json(self.request(Method::POST, "/folders").json(folder)).await
    }

    pub async fn get_folder(&self, folder_id: &str) -> ClientResult<Folder> {
        self.send_json(self.request(Method::GET, &format!("/folders/{}", folder_id)))
            .await
    }

    pub async fn list_folder_invoices(&self, folder_id: &str) -> ClientResult<Vec<InvoiceRecord>> {
        self.send_json(self.request(Method::GET, &format!("/folders/{}/invoices", folder_id)))
            .await
    }

    pub async fn create_invoice(&self, folder_id: &str, request: &InvoiceRequest) -> ClientResult<CreatedInvoice> {
        let builder = self
            .request(Method::POST, &format!("/folders/{}/invoices", folder_id))
            .json(request);
        self.send_json(builder).await
    }

    pub async fn search_invoices(&self, query: &SearchQuery) -> ClientResult<Vec<InvoiceRecord>> {
        self.send_json(self.request(Method::GET, "/invoices").query(query))
            .await
    }

    pub async fn get_invoice(&self, invoice_id: &str) -> ClientResult<InvoiceDetail> {
        self.send_json(self.request(Method::GET, &format!("/invoices/{}", invoice_id)))
            .await
    }

    pub async fn update_status(&self, invoice_id: &str, status: InvoiceStatus) -> ClientResult<InvoiceRecord> {
        let builder = self
            .request(Method::PATCH, &format!("/invoices/{}/status", invoice_id))
            .json(&serde_json::json!({ "status": status }));
        self.send_json(builder).await
    }

    pub async fn download_pdf(&self, invoice_id: &str) -> ClientResult<Vec<u8>> {
        let builder = self.request(Method::GET, &format!("/invoices/{}/pdf", invoice_id));
        let response = Self::check(builder.send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn stats(&self, folder_id: Option<&str>) -> ClientResult<RevenueStats> {
        let mut builder = self.request(Method::GET, "/stats");
        if let Some(folder) = folder_id {
            builder = builder.query(&[("folder", folder)]);
        }
        self.send_json(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_api_url() {
        let config = CliConfig {
            api_url: "not a url".to_string(),
            ..CliConfig::default()
        };
        assert!(matches!(ApiClient::new(&config), Err(ClientError::Config(_))));
    }

    #[test]
    fn strips_trailing_slash_and_keeps_defaults() {
        let mut config = CliConfig {
            api_url: "http://localhost:8787/".to_string(),
            ..CliConfig::default()
        };
        config.quick_defaults.due_in_days = 30;

        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:8787");
        assert_eq!(client.quick_defaults().due_in_days, 30);
    }

    #[test]
    fn error_body_message_includes_details() {
        let body = ErrorBody {
            error: "Validation error".to_string(),
            details: Some("currency: must be 3 letters".to_string()),
        };
        assert_eq!(body.message(), "Validation error (currency: must be 3 letters)");
    }
}
