use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub data_service: DataServiceConfig,
    #[serde(default)]
    pub view: ViewConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
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

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Remote film table configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataServiceConfig {
    /// Gateway base URL (e.g., "https://project.supabase.co")
    pub url: String,
    /// Anonymous API key, sent as `apikey` and bearer token
    pub api_key: String,
    /// Table holding the film rows (default: "films")
    #[serde(default = "default_table")]
    pub table: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_table() -> String {
    "films".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Catalog view configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewConfig {
    /// Placeholder cards shown while loading
    #[serde(default = "default_skeleton_count")]
    pub skeleton_count: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            skeleton_count: default_skeleton_count(),
        }
    }
}

fn default_skeleton_count() -> usize {
    8
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub data_service: SanitizedDataServiceConfig,
    pub view: ViewConfig,
}

/// Sanitized data service config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDataServiceConfig {
    pub url: String,
    pub table: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            data_service: SanitizedDataServiceConfig {
                url: config.data_service.url.clone(),
                table: config.data_service.table.clone(),
                api_key_configured: !config.data_service.api_key.is_empty(),
                timeout_secs: config.data_service.timeout_secs,
            },
            view: config.view.clone(),
        }
    }
}
