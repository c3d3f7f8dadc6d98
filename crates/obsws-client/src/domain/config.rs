//! Client configuration.
//!
//! [`ClientConfig`] is a plain struct so it can be built in code, from CLI
//! arguments, or from a TOML file:
//!
//! ```toml
//! address = "192.168.1.20:4444"
//! password = "hunter2"
//! request_timeout_secs = 10   # 0 disables the per-request deadline
//! connect_timeout_secs = 5
//! ```
//!
//! Every key is optional; missing keys fall back to the defaults listed on
//! [`ClientConfig::default`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// All runtime settings for a [`crate::Client`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// `host:port` or a full `ws://` URL of the obs-websocket server.
    pub address: String,

    /// Server password, used by `Client::connect_from_config` when the server
    /// asks for authentication.
    pub password: Option<String>,

    /// Default deadline for each request.  `None` waits until the reply
    /// arrives or the connection fails.
    pub request_timeout: Option<Duration>,

    /// Deadline for the WebSocket handshake.
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    /// | Field           | Default          |
    /// |-----------------|------------------|
    /// | address         | `127.0.0.1:4444` |
    /// | password        | none             |
    /// | request_timeout | 10 seconds       |
    /// | connect_timeout | 5 seconds        |
    fn default() -> Self {
        Self {
            address: default_address(),
            password: None,
            request_timeout: Some(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

fn default_address() -> String {
    "127.0.0.1:4444".to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

/// On-disk shape; timeouts are whole seconds.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default = "default_address")]
    address: String,
    #[serde(default)]
    password: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    connect_timeout_secs: u64,
}

impl From<ConfigFile> for ClientConfig {
    fn from(file: ConfigFile) -> Self {
        Self {
            address: file.address,
            password: file.password.filter(|p| !p.is_empty()),
            request_timeout: (file.request_timeout_secs > 0)
                .then(|| Duration::from_secs(file.request_timeout_secs)),
            connect_timeout: Duration::from_secs(file.connect_timeout_secs),
        }
    }
}

impl ClientConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML, wrong value types, or
    /// unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;
        Ok(file.into())
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if its content is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_address_is_local_obs() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.address, "127.0.0.1:4444");
    }

    #[test]
    fn test_default_timeouts() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.request_timeout, Some(Duration::from_secs(10)));
        assert_eq!(cfg.connect_timeout, Duration::from_secs(5));
        assert_eq!(cfg.password, None);
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        // Arrange / Act
        let cfg = ClientConfig::from_toml_str("").unwrap();

        // Assert
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn test_full_toml_is_parsed() {
        let text = r#"
            address = "10.0.0.5:4455"
            password = "hunter2"
            request_timeout_secs = 3
            connect_timeout_secs = 1
        "#;

        let cfg = ClientConfig::from_toml_str(text).unwrap();

        assert_eq!(cfg.address, "10.0.0.5:4455");
        assert_eq!(cfg.password.as_deref(), Some("hunter2"));
        assert_eq!(cfg.request_timeout, Some(Duration::from_secs(3)));
        assert_eq!(cfg.connect_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_zero_request_timeout_disables_deadline() {
        let cfg = ClientConfig::from_toml_str("request_timeout_secs = 0").unwrap();
        assert_eq!(cfg.request_timeout, None);
    }

    #[test]
    fn test_empty_password_is_treated_as_none() {
        let cfg = ClientConfig::from_toml_str(r#"password = """#).unwrap();
        assert_eq!(cfg.password, None);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result = ClientConfig::from_toml_str("adress = \"typo:4444\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_wrong_value_type_is_rejected() {
        let result = ClientConfig::from_toml_str("request_timeout_secs = \"ten\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let path = Path::new("/nonexistent/obsws/config.toml");
        let err = ClientConfig::load(path).unwrap_err();
        match err {
            ConfigError::Io { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_reads_file_from_disk() {
        // Arrange: write a config into the OS temp directory.
        let path = std::env::temp_dir().join(format!(
            "obsws-config-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "address = \"obs.local:4444\"\n").unwrap();

        // Act
        let cfg = ClientConfig::load(&path);
        let _ = std::fs::remove_file(&path);

        // Assert
        assert_eq!(cfg.unwrap().address, "obs.local:4444");
    }
}
