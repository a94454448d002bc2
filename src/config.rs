//! Configuration management for Worktrack
//!
//! Loads settings from TOML file at ~/.worktrack/config.toml

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Summary categorization configuration
    #[serde(default)]
    pub categorizer: CategorizerConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server port (default: 8000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Server host (default: 127.0.0.1 - localhost only)
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Categorizer configuration.
///
/// Without an API key only the built-in keyword rules are used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizerConfig {
    /// Whether the LLM categorizer may be used at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// API key for the generateContent endpoint
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL (the model path is appended)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_model() -> String {
    "gemini-pro".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl CategorizerConfig {
    /// API key, if the LLM categorizer should be used
    pub fn active_api_key(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

impl Default for CategorizerConfig {
    fn default() -> Self {
        CategorizerConfig {
            enabled: true,
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let expanded_path = expand_path(path.as_ref());

        if !expanded_path.exists() {
            return Err(CoreError::Config(format!(
                "Configuration file not found: {}",
                expanded_path.display()
            )));
        }

        let content = std::fs::read_to_string(&expanded_path)?;
        let config: Config = toml::from_str(&content)?;

        Ok(config)
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|p| p.join(".worktrack").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".worktrack/config.toml"))
    }

    /// Get the server socket address
    pub fn server_addr(&self) -> SocketAddr {
        use std::net::ToSocketAddrs;

        format!("{}:{}", self.server.host, self.server.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], self.server.port)))
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CoreError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Get list of active environment overrides
    pub fn active_env_overrides() -> Vec<String> {
        ["WORKTRACK_SERVER_HOST", "WORKTRACK_SERVER_PORT", "GEMINI_API_KEY"]
            .iter()
            .filter(|name| std::env::var(name).is_ok())
            .map(|name| name.to_string())
            .collect()
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("WORKTRACK_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("WORKTRACK_SERVER_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid WORKTRACK_SERVER_PORT: {}", port),
            }
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.categorizer.api_key = if key.is_empty() { None } else { Some(key) };
        }
    }

    /// Validate values that serde cannot check
    pub fn validate(&self) -> Result<()> {
        if self.categorizer.timeout_secs == 0 {
            return Err(CoreError::Validation(
                "categorizer.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.categorizer.model.trim().is_empty() {
            return Err(CoreError::Validation(
                "categorizer.model must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a default configuration file at the given path
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let content = r#"# Worktrack Configuration

[server]
# Port to listen on (default: 8000)
port = 8000

# Host to bind to
# "127.0.0.1" = localhost only (recommended)
# "0.0.0.0" = all interfaces
host = "127.0.0.1"

[categorizer]
# Use the LLM categorizer when an API key is available.
# Without a key (or on any LLM failure) keyword rules are used.
enabled = true
# api_key = "your-api-key"   # or set GEMINI_API_KEY
model = "gemini-pro"
base_url = "https://generativelanguage.googleapis.com/v1beta"
timeout_secs = 30
"#;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;

        Ok(())
    }
}

/// Expand ~ to home directory in paths
pub fn expand_path(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.categorizer.enabled);
        assert!(config.categorizer.api_key.is_none());
        assert!(config.categorizer.active_api_key().is_none());
        assert_eq!(config.categorizer.timeout_secs, 30);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[server]
port = 9000
host = "0.0.0.0"

[categorizer]
api_key = "secret"
model = "gemini-1.5-flash"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.categorizer.active_api_key(), Some("secret"));
        assert_eq!(config.categorizer.model, "gemini-1.5-flash");
        assert_eq!(config.categorizer.timeout_secs, 30);
    }

    #[test]
    fn test_disabled_categorizer_ignores_key() {
        let toml = r#"
[categorizer]
enabled = false
api_key = "secret"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.categorizer.active_api_key().is_none());
    }

    #[test]
    fn test_blank_key_is_inactive() {
        let mut config = Config::default();
        config.categorizer.api_key = Some("   ".to_string());
        assert!(config.categorizer.active_api_key().is_none());
    }

    #[test]
    fn test_create_default_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::create_default(&path).unwrap();
        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.categorizer.model, "gemini-pro");
        config.validate().unwrap();
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.server.port = 4321;
        config.save_to_file(&path).unwrap();

        let reloaded = Config::from_file(&path).unwrap();
        assert_eq!(reloaded.server.port, 4321);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.categorizer.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_server_addr() {
        let mut config = Config::default();
        config.server.port = 8123;
        assert_eq!(config.server_addr(), SocketAddr::from(([127, 0, 0, 1], 8123)));
    }

    #[test]
    fn test_default_path() {
        let path = Config::default_path();
        assert!(path.ends_with(".worktrack/config.toml"));
    }
}
