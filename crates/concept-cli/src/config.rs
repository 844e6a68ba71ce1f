use concept_agent::ModelConfig;
use concept_security::password::DEFAULT_ROUNDS;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct ConceptdConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for ConceptdConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            data_dir: default_data_dir(),
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
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

#[derive(Debug, Deserialize)]
pub struct SecurityConfig {
    /// Requests per client address allowed on the public concept route.
    #[serde(default = "default_rate_limit_requests")]
    pub rate_limit_requests: usize,
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,
    /// Token signing secret. Usually supplied through `JWT_SECRET_KEY`.
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_password_rounds")]
    pub password_rounds: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            rate_limit_requests: default_rate_limit_requests(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            jwt_secret: String::new(),
            password_rounds: default_password_rounds(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    File,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_rate_limit_requests() -> usize {
    5
}
fn default_rate_limit_window_secs() -> u64 {
    3600
}
fn default_password_rounds() -> u32 {
    DEFAULT_ROUNDS
}

impl ConceptdConfig {
    /// Read `path`, falling back to defaults when it does not exist.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => toml::from_str(&text).map_err(|e| {
                anyhow::anyhow!("Invalid config file '{}': {e}", path.display())
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file '{}': {e}",
                path.display()
            )),
        }
    }

    /// Apply `OPENROUTER_API_KEY`, `OPENROUTER_MODEL` and `JWT_SECRET_KEY`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var("OPENROUTER_API_KEY") {
            self.model.api_key = key;
        }
        if let Some(model) = var("OPENROUTER_MODEL") {
            self.model.model_id = model;
        }
        if let Some(secret) = var("JWT_SECRET_KEY") {
            self.security.jwt_secret = secret;
        }
    }
}
