use serde::Deserialize;
use service_core::config::{self as core_config, ServerConfig, TelemetryConfig};
use service_core::error::AppError;
use std::path::PathBuf;

/// Name of the optional config file under `config/`.
pub const CONFIG_NAME: &str = "upload-service";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub upload: UploadLimits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory uploaded files are written to and served from.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// URL prefix the upload directory is served under.
    #[serde(default = "default_public_path")]
    pub public_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            public_path: default_public_path(),
        }
    }
}

impl StorageConfig {
    /// Public path without a trailing slash, suitable for `Router::nest_service`.
    pub fn route_prefix(&self) -> String {
        let trimmed = self.public_path.trim_end_matches('/');
        if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadLimits {
    /// Multipart field carrying file parts.
    #[serde(default = "default_field_name")]
    pub field_name: String,
    /// Ceiling on the whole request body, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            field_name: default_field_name(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_public_path() -> String {
    "/api/uploads".to_string()
}

fn default_field_name() -> String {
    "files".to_string()
}

fn default_max_body_bytes() -> usize {
    200 * 1024 * 1024
}

impl UploadConfig {
    pub fn load() -> Result<Self, AppError> {
        core_config::load(CONFIG_NAME)
    }
}
