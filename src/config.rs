use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "DMREST_CONFIG";

/// Environment variable overriding `dmrest.host_url`
pub const HOST_URL_ENV: &str = "DM4_HOST_URL";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub dmrest: DmrestConfig,
    #[serde(default)]
    pub serializer: SerializerConfig,
    #[serde(default)]
    pub http_server: HttpServerConfig,
}

/// DMRest-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DmrestConfig {
    /// SQLite file holding the topic graph.
    pub db_path: PathBuf,
    /// Base host address every `resources.*` link is built from.
    /// Left unset here, it must come from `DM4_HOST_URL`.
    #[serde(default)]
    pub host_url: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Graph serializer tuning
#[derive(Debug, Clone, Deserialize)]
pub struct SerializerConfig {
    /// Deepest child-topic level that is still expanded.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_http_port(),
            allowed_origins: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_depth() -> usize {
    32
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    8080
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in DMREST_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // A missing .env is fine
        let _ = dotenv::dotenv();

        let config_path = std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        Self::from_file(&config_path)
    }

    /// Load and validate configuration from an explicit path
    pub fn from_file(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        if let Ok(host) = std::env::var(HOST_URL_ENV) {
            if !host.trim().is_empty() {
                config.dmrest.host_url = Some(host);
            }
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.serializer.max_depth == 0 {
            anyhow::bail!("serializer.max_depth must be greater than 0");
        }

        if self.http_server.port == 0 {
            anyhow::bail!("http_server.port must be greater than 0");
        }

        if let Some(host) = &self.dmrest.host_url {
            let parsed = url::Url::parse(host)
                .with_context(|| format!("dmrest.host_url is not a valid URL: {}", host))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                anyhow::bail!("dmrest.host_url must be an http(s) URL, got: {}", host);
            }
        }

        Ok(())
    }

    /// Get database path
    pub fn db_path(&self) -> &Path {
        &self.dmrest.db_path
    }

    /// Get the configured base host address, if any
    pub fn host_url(&self) -> Option<&str> {
        self.dmrest.host_url.as_deref()
    }
}
