use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CorsConfig {
    #[serde(default)]
    pub allow_origins: Vec<String>,
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public base URL used to build asset download URLs in manifests.
    pub base_url: String,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory for asset blobs and upload scratch space.
    pub data_dir: PathBuf,
    #[serde(default = "default_max_blob_size")]
    pub max_blob_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KeysConfig {
    /// Directory holding `private-key.pem` and `certificate.pem`.
    pub keys_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WebhookConfig {
    /// Release event endpoint. Webhooks are disabled when unset.
    #[serde(default)]
    pub on_release_url: Option<String>,
    /// Shared secret for HMAC-SHA256 payload signatures.
    #[serde(default)]
    pub secret: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GcConfig {
    /// Assets younger than this are never swept, to avoid racing an
    /// in-flight upload that has stored a file but not yet linked it.
    #[serde(default = "default_gc_grace_period")]
    pub grace_period_secs: u64,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: default_gc_grace_period(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub keys: KeysConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub gc: GcConfig,
}

fn default_cors_max_age() -> u64 {
    3600
}

fn default_max_blob_size() -> u64 {
    512 * 1024 * 1024 // 512 MB
}

fn default_gc_grace_period() -> u64 {
    3600
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.base_url", "http://localhost:3000")?
            .set_default("database.url", "sqlite://data/airlift.db?mode=rwc")?
            .set_default("storage.data_dir", "data")?
            .set_default("keys.keys_dir", "keys")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., AIRLIFT__SERVER__BASE_URL)
            .add_source(Environment::with_prefix("AIRLIFT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
