use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the Domo server
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// SQLite storage settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Tavus API settings
    #[serde(default)]
    pub tavus: TavusConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Listen port
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TavusConfig {
    /// API key; also read from TAVUS_API_KEY
    pub api_key: Option<String>,

    /// Base URL of the Tavus REST API
    pub base_url: String,

    /// Default replica to converse with
    pub replica_id: Option<String>,

    /// Default persona configured with the demo objectives
    pub persona_id: Option<String>,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("domo.db"),
        }
    }
}

impl Default for TavusConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://tavusapi.com/v2".to_string(),
            replica_id: None,
            persona_id: None,
            timeout_seconds: 30,
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to environment variables.
    pub fn load() -> Result<Self> {
        let config_paths = [
            "domo-server.toml",
            "config/domo-server.toml",
            "/etc/domo-server/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        config.overlay_env();
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Build configuration purely from environment variables.
    pub fn from_env() -> Result<Self> {
        let any_set = ["DOMO_HOST", "DOMO_PORT", "DOMO_DB_PATH", "TAVUS_API_KEY"]
            .iter()
            .any(|key| std::env::var(key).is_ok());

        if !any_set {
            return Err(anyhow!("No configuration file or environment variables found"));
        }

        let mut config = Config::default();
        config.overlay_env();
        Ok(config)
    }

    /// Apply environment overrides on top of whatever was loaded.
    fn overlay_env(&mut self) {
        if let Ok(host) = std::env::var("DOMO_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("DOMO_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid DOMO_PORT value: {}", port),
            }
        }
        if let Ok(path) = std::env::var("DOMO_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Ok(key) = std::env::var("TAVUS_API_KEY") {
            if !key.is_empty() {
                self.tavus.api_key = Some(key);
            }
        }
        if let Ok(replica) = std::env::var("TAVUS_REPLICA_ID") {
            self.tavus.replica_id = Some(replica);
        }
        if let Ok(persona) = std::env::var("TAVUS_PERSONA_ID") {
            self.tavus.persona_id = Some(persona);
        }
    }
}
