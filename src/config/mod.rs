use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};

/// Configuration for the HTTP service
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Address the API listens on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Default log filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_database_url() -> String {
    "sqlite://invoicer.db?mode=rwc".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// This function will:
    /// 1. Load variables from .env file if it exists
    /// 2. Deserialize environment variables into ServerConfig
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let config = envy::from_env::<ServerConfig>()?;

        Ok(config)
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            bind_addr: default_bind_addr(),
            log_level: default_log_level(),
        }
    }
}

/// Values the interactive CLI pre-fills when creating invoices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuickDefaults {
    pub due_in_days: i64,
    pub default_tax_rate: f64,
    pub default_discount_rate: f64,
}

impl Default for QuickDefaults {
    fn default() -> Self {
        Self {
            due_in_days: 14,
            default_tax_rate: 0.0,
            default_discount_rate: 0.0,
        }
    }
}

/// Client side settings, passed explicitly to the API client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CliConfig {
    pub api_url: String,
    pub api_key: String,
    pub quick_defaults: QuickDefaults,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8787".to_string(),
            api_key: String::new(),
            quick_defaults: QuickDefaults::default(),
        }
    }
}

/// `INVOICER_API_URL` / `INVOICER_API_KEY` overrides
#[derive(Debug, Default, Deserialize)]
struct CliEnv {
    api_url: Option<String>,
    api_key: Option<String>,
}

impl CliConfig {
    /// Load from a JSON file, falling back to defaults when it does not exist,
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path(),
        };

        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        let overrides = envy::prefixed("INVOICER_").from_env::<CliEnv>()?;
        config.apply_overrides(overrides.api_url, overrides.api_key);

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    fn apply_overrides(&mut self, api_url: Option<String>, api_key: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.is_empty()) {
            self.api_url = url;
        }
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.api_key = key;
        }
    }
}

/// `$INVOICER_CONFIG`, else `$HOME/.invoicer.json`
fn default_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("INVOICER_CONFIG") {
        return Some(PathBuf::from(path));
    }
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".invoicer.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_camel_case_json() {
        let config = CliConfig::from_json(
            r#"{
                "apiUrl": "https://invoices.example.com",
                "apiKey": "secret",
                "quickDefaults": { "dueInDays": 30, "defaultTaxRate": 20, "defaultDiscountRate": 5 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.api_url, "https://invoices.example.com");
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.quick_defaults.due_in_days, 30);
        assert_eq!(config.quick_defaults.default_tax_rate, 20.0);
        assert_eq!(config.quick_defaults.default_discount_rate, 5.0);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = CliConfig::from_json(r#"{ "apiKey": "k", "quickDefaults": { "dueInDays": 7 } }"#).unwrap();

        assert_eq!(config.api_url, "http://127.0.0.1:8787");
        assert_eq!(config.quick_defaults.due_in_days, 7);
        assert_eq!(config.quick_defaults.default_tax_rate, 0.0);
    }

    #[test]
    fn reads_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "apiUrl": "http://localhost:9000", "apiKey": "abc" }}"#).unwrap();

        let config = CliConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api_url, "http://localhost:9000");
        assert_eq!(config.api_key, "abc");
    }

    #[test]
    fn empty_overrides_are_ignored() {
        let mut config = CliConfig::default();
        config.apply_overrides(Some(String::new()), Some("token".to_string()));

        assert_eq!(config.api_url, "http://127.0.0.1:8787");
        assert_eq!(config.api_key, "token");
    }
}
