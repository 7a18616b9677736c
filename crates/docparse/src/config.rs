//! Configuration for the parsing service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocParseConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Scratch file configuration
    #[serde(default)]
    pub scratch: ScratchConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS (any origin, method and header)
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Scratch file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchConfig {
    /// Directory for scratch files (default: OS temp dir)
    pub dir: Option<PathBuf>,
    /// File name prefix for scratch files
    pub prefix: String,
    /// Total deletion attempts before giving up
    pub delete_attempts: u32,
    /// Delay between deletion attempts in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            dir: None,
            prefix: "docparse-".to_string(),
            delete_attempts: 3,
            retry_delay_ms: 100,
        }
    }
}

impl ScratchConfig {
    /// Directory scratch files are created in
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Delay between deletion attempts
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl DocParseConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Apply `DOCPARSE_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Values that fail to parse are logged and ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("DOCPARSE_HOST") {
            self.server.host = host;
        }

        if let Some(value) = lookup("DOCPARSE_PORT") {
            match value.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(
                    "Failed to parse DOCPARSE_PORT='{}', must be a valid port",
                    value
                ),
            }
        }

        if let Some(value) = lookup("DOCPARSE_MAX_UPLOAD_SIZE") {
            match value.parse::<usize>() {
                Ok(bytes) if bytes > 0 => self.server.max_upload_size = bytes,
                _ => tracing::warn!(
                    "Failed to parse DOCPARSE_MAX_UPLOAD_SIZE='{}', must be a positive byte count",
                    value
                ),
            }
        }

        if let Some(dir) = lookup("DOCPARSE_SCRATCH_DIR") {
            if !dir.is_empty() {
                self.scratch.dir = Some(PathBuf::from(dir));
            }
        }
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.scratch.delete_attempts == 0 {
            return Err(Error::Config(
                "scratch.delete_attempts must be at least 1".to_string(),
            ));
        }
        if self.server.max_upload_size == 0 {
            return Err(Error::Config(
                "server.max_upload_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = DocParseConfig::default();
        assert_eq!(config.server.port, 8000);
        assert!(config.server.enable_cors);
        assert_eq!(config.scratch.delete_attempts, 3);
        assert_eq!(config.scratch.retry_delay(), Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DocParseConfig::from_toml_str(
            r#"
            [server]
            port = 9001

            [scratch]
            dir = "/var/tmp/docparse"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.scratch.dir, Some(PathBuf::from("/var/tmp/docparse")));
        assert_eq!(config.scratch.delete_attempts, 3);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = DocParseConfig::from_toml_str("[server\nport = ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DOCPARSE_HOST", "127.0.0.1"),
            ("DOCPARSE_PORT", "9100"),
            ("DOCPARSE_MAX_UPLOAD_SIZE", "1048576"),
            ("DOCPARSE_SCRATCH_DIR", "/tmp/scratch"),
        ]
        .into_iter()
        .collect();

        let mut config = DocParseConfig::default();
        config.apply_overrides_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.max_upload_size, 1_048_576);
        assert_eq!(config.scratch.resolved_dir(), PathBuf::from("/tmp/scratch"));
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let mut config = DocParseConfig::default();
        config.apply_overrides_from(|key| match key {
            "DOCPARSE_PORT" => Some("not-a-port".to_string()),
            "DOCPARSE_MAX_UPLOAD_SIZE" => Some("0".to_string()),
            _ => None,
        });

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.max_upload_size, 100 * 1024 * 1024);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = DocParseConfig::default();
        config.scratch.delete_attempts = 0;
        assert!(config.validate().is_err());
    }
}
