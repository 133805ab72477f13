//! TOML configuration for the compliance CLI.
//!
//! A layered model: compiled-in defaults, overridden by a config file, in
//! turn overridden by command-line options.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "COMPLIANCE_CONFIG";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded compliance configuration");
        Ok(config)
    }

    /// Resolve the configuration for this invocation.
    ///
    /// An explicit path must load. Otherwise, in order:
    /// 1. The path in the `COMPLIANCE_CONFIG` environment variable.
    /// 2. `$HOME/.config/compliance/compliance.toml`.
    /// 3. Compiled-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let user_path = std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".config/compliance/compliance.toml"));
        Ok(Self::load_first(env_path.as_deref(), user_path.as_deref()))
    }

    fn load_first(env_path: Option<&Path>, user_path: Option<&Path>) -> Self {
        if let Some(path) = env_path {
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "COMPLIANCE_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        if let Some(path) = user_path.filter(|p| p.exists()) {
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "user config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Self::default()
    }

    /// Apply command-line overrides on top of the loaded file.
    pub fn with_overrides(mut self, endpoint: Option<String>, namespace: Option<String>) -> Self {
        if let Some(endpoint) = endpoint {
            self.server.endpoint = endpoint;
        }
        if let Some(namespace) = namespace {
            self.server.namespace = namespace;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Where the compliance service lives and which run to inspect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the compliance service.
    pub endpoint: String,
    /// Namespace the compliance run was started in.
    pub namespace: String,
    /// TCP connect timeout for service requests (seconds).
    pub connect_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080".to_string(),
            namespace: "compliance".to_string(),
            connect_timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Diagnostic logging (stderr). `RUST_LOG` takes precedence when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum tracing level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_are_sane() {
        let cfg = Config::default();
        assert_eq!(cfg.server.endpoint, "http://127.0.0.1:8080");
        assert_eq!(cfg.server.namespace, "compliance");
        assert_eq!(cfg.server.connect_timeout_secs, 10);
        assert_eq!(cfg.logging.level, "warn");
        assert!(!cfg.logging.json);
    }

    #[test]
    fn test_parse_full_toml() {
        let cfg: Config = toml::from_str(
            r#"
[server]
endpoint = "https://compliance.example.com/api"
namespace = "conformance"
connect_timeout_secs = 3

[logging]
level = "debug"
json = true
"#,
        )
        .unwrap();

        assert_eq!(cfg.server.endpoint, "https://compliance.example.com/api");
        assert_eq!(cfg.server.namespace, "conformance");
        assert_eq!(cfg.server.connect_timeout_secs, 3);
        assert_eq!(cfg.logging.level, "debug");
        assert!(cfg.logging.json);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let cfg: Config = toml::from_str(
            r#"
[server]
namespace = "e2e"
"#,
        )
        .unwrap();

        assert_eq!(cfg.server.namespace, "e2e");
        assert_eq!(cfg.server.endpoint, "http://127.0.0.1:8080");
        assert_eq!(cfg.logging.level, "warn");
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config("[server]\nendpoint = \"http://10.0.0.5:9000\"\n");
        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.server.endpoint, "http://10.0.0.5:9000");
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let err = Config::resolve(Some(Path::new("/nonexistent/compliance.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let file = write_config("[server\nendpoint = ");
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("failed to parse config file"));
    }

    #[test]
    fn test_env_path_wins_over_user_path() {
        let env_file = write_config("[server]\nnamespace = \"from-env\"\n");
        let user_file = write_config("[server]\nnamespace = \"from-home\"\n");

        let cfg = Config::load_first(Some(env_file.path()), Some(user_file.path()));
        assert_eq!(cfg.server.namespace, "from-env");
    }

    #[test]
    fn test_broken_env_path_falls_back() {
        let user_file = write_config("[server]\nnamespace = \"from-home\"\n");

        let cfg = Config::load_first(Some(Path::new("/nonexistent.toml")), Some(user_file.path()));
        assert_eq!(cfg.server.namespace, "from-home");

        let cfg = Config::load_first(Some(Path::new("/nonexistent.toml")), None);
        assert_eq!(cfg.server.namespace, "compliance");
    }

    #[test]
    fn test_cli_overrides_win() {
        let cfg = Config::default().with_overrides(Some("http://override:1".to_string()), None);
        assert_eq!(cfg.server.endpoint, "http://override:1");
        assert_eq!(cfg.server.namespace, "compliance");
    }
}
