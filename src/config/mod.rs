//! Configuration module for the document registry.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::errors::AppError;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the JSON collection file
    pub data_path: PathBuf,
    /// Address to bind the server to, checked by [`Config::socket_addr`]
    pub bind_addr: String,
    /// Base URL of a running server; client commands use the local file when unset
    pub server_url: Option<String>,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let data_path = env::var("DOCREG_DATA_PATH")
            .unwrap_or_else(|_| "./data/documents.json".to_string())
            .into();

        let bind_addr =
            env::var("DOCREG_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());

        let server_url = env::var("DOCREG_SERVER_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let log_level = env::var("DOCREG_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("DOCREG_LOG_FORMAT") {
            Ok(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            data_path,
            bind_addr,
            server_url,
            log_level,
            log_format,
        })
    }

    /// Parse the bind address. Only the server needs it.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        self.bind_addr.parse().map_err(|_| {
            AppError::Validation(format!(
                "Invalid DOCREG_BIND_ADDR format: {}",
                self.bind_addr
            ))
        })
    }
}
