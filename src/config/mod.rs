use crate::services::session::MIN_SECRET_LENGTH;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const MAX_PAGE_SIZE: usize = 500;
/// Longest accepted `auth.session_lifetime`.
pub const MAX_SESSION_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub listing: ListingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default = "default_operator_id")]
    pub operator_id: String,
    pub email: String,
    /// argon2 PHC string, see `mediadesk hash-password`.
    pub password_hash: String,
    pub session_secret: String,
    #[serde(default = "default_session_lifetime")]
    pub session_lifetime: String,
    #[serde(default)]
    pub secure_cookie: bool,
}

impl AuthConfig {
    pub fn session_ttl(&self) -> Result<Duration> {
        parse_duration(&self.session_lifetime)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Cloudinary,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub cloud_name: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_secret: Option<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl StoreConfig {
    pub fn memory() -> Self {
        Self {
            backend: StoreBackend::Memory,
            cloud_name: None,
            api_key: None,
            api_secret: None,
            api_base_url: default_api_base_url(),
        }
    }

    /// Base of the URLs handed out by the in-memory backend.
    pub fn memory_base_url(&self) -> String {
        format!(
            "memory://{}",
            self.cloud_name.as_deref().unwrap_or("mediadesk")
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend == StoreBackend::Cloudinary {
            for (name, value) in [
                ("cloud_name", &self.cloud_name),
                ("api_key", &self.api_key),
                ("api_secret", &self.api_secret),
            ] {
                if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                    anyhow::bail!("store.{} is required for the cloudinary backend", name);
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: String,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_item_timeout_secs")]
    pub item_timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            max_file_size: default_max_file_size(),
            concurrency: default_concurrency(),
            item_timeout_secs: default_item_timeout_secs(),
        }
    }
}

impl UploadConfig {
    pub fn max_file_size_bytes(&self) -> Result<usize> {
        parse_size(&self.max_file_size)
    }

    pub fn item_timeout(&self) -> Duration {
        Duration::from_secs(self.item_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListingConfig {
    #[serde(default = "default_folder")]
    pub default_folder: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_folder: default_folder(),
            page_size: default_page_size(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_operator_id() -> String {
    "1".to_string()
}

fn default_session_lifetime() -> String {
    "7d".to_string()
}

fn default_api_base_url() -> String {
    "https://api.cloudinary.com".to_string()
}

fn default_max_batch_size() -> usize {
    50
}

fn default_max_file_size() -> String {
    "10MB".to_string()
}

fn default_concurrency() -> usize {
    4
}

fn default_item_timeout_secs() -> u64 {
    60
}

fn default_folder() -> String {
    "netflix-clone".to_string()
}

fn default_page_size() -> usize {
    100
}

/// Parses `30s`, `15m`, `12h`, `7d`; a bare number is seconds.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (value, unit) = input.split_at(split);
    let value: u64 = value
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid duration '{}'", input))?;
    let multiplier = match unit.trim().to_lowercase().as_str() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        other => anyhow::bail!("Invalid duration unit '{}' in '{}'", other, input),
    };
    if value == 0 {
        anyhow::bail!("Duration '{}' must be greater than zero", input);
    }
    Ok(Duration::from_secs(value.saturating_mul(multiplier)))
}

/// Parses `512`, `512B`, `64KB`, `10MB`, `1GB` (binary multiples).
pub fn parse_size(input: &str) -> Result<usize> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (value, unit) = input.split_at(split);
    let value: usize = value
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid size '{}'", input))?;
    let multiplier: usize = match unit.trim().to_uppercase().as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1024,
        "MB" | "M" => 1024 * 1024,
        "GB" | "G" => 1024 * 1024 * 1024,
        other => anyhow::bail!("Invalid size unit '{}' in '{}'", other, input),
    };
    Ok(value.saturating_mul(multiplier))
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!(
                "Could not read config file '{}': {}. Run 'mediadesk init' to create one.",
                path.display(),
                e
            )
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.email.trim().is_empty() {
            anyhow::bail!("auth.email must be set");
        }
        if self.auth.operator_id.trim().is_empty() {
            anyhow::bail!("auth.operator_id must not be empty");
        }
        if self.auth.session_secret.len() < MIN_SECRET_LENGTH {
            anyhow::bail!(
                "auth.session_secret must be at least {} bytes",
                MIN_SECRET_LENGTH
            );
        }
        if self.auth.session_ttl()? > MAX_SESSION_LIFETIME {
            anyhow::bail!("auth.session_lifetime must be at most 365d");
        }
        self.store.validate()?;
        if self.upload.max_batch_size == 0 {
            anyhow::bail!("upload.max_batch_size must be greater than 0");
        }
        if self.upload.concurrency == 0 {
            anyhow::bail!("upload.concurrency must be greater than 0");
        }
        if self.upload.item_timeout_secs == 0 {
            anyhow::bail!("upload.item_timeout_secs must be greater than 0");
        }
        if self.upload.max_file_size_bytes()? == 0 {
            anyhow::bail!("upload.max_file_size must be greater than 0");
        }
        if self.listing.page_size == 0 || self.listing.page_size > MAX_PAGE_SIZE {
            anyhow::bail!("listing.page_size must be between 1 and {}", MAX_PAGE_SIZE);
        }
        crate::models::validate_folder(&self.listing.default_folder)
            .map_err(|e| anyhow::anyhow!("listing.default_folder: {}", e))?;
        Ok(())
    }
}
