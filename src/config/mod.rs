//! # Configuration
//!
//! Deployment settings, read from a JSON file and overridable from the
//! environment. Every field has a default, so an empty object `{}` is a
//! valid configuration: instrumentation on, replay disabled (no key).

mod errors;

pub use errors::{ConfigError, ConfigResult};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::capability::{CapabilityValidator, SecretKey, TokenAlgorithm};
use crate::capture::backtrace::DEFAULT_VENDOR_DIR;
use crate::capture::{BacktraceFilter, Instrumentation};
use crate::executor::SqlExecutor;
use crate::http_server::HttpServerConfig;
use crate::observability::Event;
use crate::panel::SqlPanel;
use crate::render::ViewRenderer;
use crate::replay::ReplayDispatcher;

/// Environment variable holding the secret key
pub const ENV_SECRET_KEY: &str = "QUERYDECK_SECRET_KEY";
/// Environment variable toggling instrumentation
pub const ENV_ENABLED: &str = "QUERYDECK_ENABLED";
/// Environment variable overriding the mount path
pub const ENV_MOUNT_PATH: &str = "QUERYDECK_MOUNT_PATH";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckConfig {
    /// Secret binding capability tokens; replay is disabled when absent
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Initial state of the capture switch (default: true)
    #[serde(default = "default_instrumentation_enabled")]
    pub instrumentation_enabled: bool,

    /// Prefix the replay endpoints are mounted under
    #[serde(default = "default_mount_path")]
    pub mount_path: String,

    #[serde(default)]
    pub token_algorithm: TokenAlgorithm,

    /// Application root for backtrace filtering (default: working directory)
    #[serde(default)]
    pub app_root: Option<PathBuf>,

    /// Subdirectories of `app_root` holding third-party code
    #[serde(default = "default_vendor_dirs")]
    pub vendor_dirs: Vec<String>,

    #[serde(default)]
    pub http: HttpServerConfig,
}

fn default_instrumentation_enabled() -> bool {
    true
}

fn default_mount_path() -> String {
    "/__querydeck__".to_string()
}

fn default_vendor_dirs() -> Vec<String> {
    vec![DEFAULT_VENDOR_DIR.to_string()]
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            instrumentation_enabled: default_instrumentation_enabled(),
            mount_path: default_mount_path(),
            token_algorithm: TokenAlgorithm::default(),
            app_root: None,
            vendor_dirs: default_vendor_dirs(),
            http: HttpServerConfig::default(),
        }
    }
}

impl DeckConfig {
    /// Load and validate a JSON configuration file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: DeckConfig = serde_json::from_str(&content)?;
        config.validate()?;

        tracing::info!(
            event = %Event::ConfigLoaded,
            path = %path.display(),
            replay_enabled = config.secret().is_some(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_vars<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(ENV_SECRET_KEY) {
            self.secret_key = Some(secret);
        }
        if let Some(raw) = lookup(ENV_ENABLED) {
            self.instrumentation_enabled = parse_flag(&raw).ok_or_else(|| {
                ConfigError::invalid(format!("{} must be a boolean, got '{}'", ENV_ENABLED, raw))
            })?;
        }
        if let Some(mount) = lookup(ENV_MOUNT_PATH) {
            self.mount_path = mount;
        }
        self.validate()
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !self.mount_path.starts_with('/') {
            return Err(ConfigError::invalid(format!(
                "mount_path must start with '/', got '{}'",
                self.mount_path
            )));
        }
        if self.vendor_dirs.iter().any(|dir| dir.trim().is_empty()) {
            return Err(ConfigError::invalid("vendor_dirs must not contain blank entries"));
        }
        Ok(())
    }

    /// Mount path without a trailing slash; `/` stays `/`
    pub fn normalized_mount_path(&self) -> &str {
        match self.mount_path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        }
    }

    pub fn secret(&self) -> Option<SecretKey> {
        SecretKey::from_optional(self.secret_key.as_deref())
    }

    pub fn validator(&self) -> Option<CapabilityValidator> {
        self.secret()
            .map(|secret| CapabilityValidator::new(secret, self.token_algorithm))
    }

    pub fn instrumentation(&self) -> Instrumentation {
        Instrumentation::new(self.instrumentation_enabled)
    }

    pub fn backtrace_filter(&self) -> BacktraceFilter {
        match &self.app_root {
            Some(root) => BacktraceFilter::with_vendor_dirs(root, self.vendor_dirs.as_slice()),
            None => {
                let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                BacktraceFilter::with_vendor_dirs(root, self.vendor_dirs.as_slice())
            }
        }
    }

    pub fn dispatcher(
        &self,
        executor: Arc<dyn SqlExecutor>,
        renderer: Arc<dyn ViewRenderer>,
    ) -> ReplayDispatcher {
        ReplayDispatcher::new(self.validator(), executor, renderer)
    }

    pub fn panel(&self, renderer: Arc<dyn ViewRenderer>) -> SqlPanel {
        SqlPanel::new(
            renderer,
            self.backtrace_filter(),
            self.validator(),
            self.normalized_mount_path(),
        )
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DeckConfig::default();
        assert!(config.secret_key.is_none());
        assert!(config.instrumentation_enabled);
        assert_eq!(config.mount_path, "/__querydeck__");
        assert_eq!(config.token_algorithm, TokenAlgorithm::Sha1);
        assert_eq!(config.vendor_dirs, vec!["vendor"]);
        assert_eq!(config.http.socket_addr(), "127.0.0.1:9292");
        assert!(config.validator().is_none());
    }

    #[test]
    fn test_load_empty_object() {
        let file = write_config("{}");
        let config = DeckConfig::load(file.path()).unwrap();
        assert_eq!(config.mount_path, "/__querydeck__");
        assert!(config.instrumentation_enabled);
    }

    #[test]
    fn test_load_full() {
        let file = write_config(
            r#"{
                "secret_key": "s3cret",
                "instrumentation_enabled": false,
                "mount_path": "/debug/sql",
                "token_algorithm": "hmac-sha256",
                "app_root": "/srv/app",
                "vendor_dirs": ["vendor", "third_party"],
                "http": { "host": "0.0.0.0", "port": 8080 }
            }"#,
        );
        let config = DeckConfig::load(file.path()).unwrap();
        assert_eq!(config.token_algorithm, TokenAlgorithm::HmacSha256);
        assert!(!config.instrumentation().is_enabled());
        assert_eq!(config.http.socket_addr(), "0.0.0.0:8080");

        let validator = config.validator().unwrap();
        assert_eq!(validator.algorithm(), TokenAlgorithm::HmacSha256);

        let filter = config.backtrace_filter();
        assert!(filter.keeps("/srv/app/src/main.rs:1:1"));
        assert!(!filter.keeps("/srv/app/third_party/lib.rs:1:1"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = DeckConfig::load(Path::new("/nonexistent/querydeck.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_invalid_json() {
        let file = write_config("{ not json");
        let err = DeckConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert_eq!(err.code(), "QUERYDECK_CONFIG_PARSE");
    }

    #[test]
    fn test_rejects_relative_mount_path() {
        let file = write_config(r#"{ "mount_path": "querydeck" }"#);
        let err = DeckConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_blank_secret_disables_replay() {
        let config = DeckConfig {
            secret_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(config.validator().is_none());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = DeckConfig::default();
        config
            .apply_vars(vars(&[
                (ENV_SECRET_KEY, "from-env"),
                (ENV_ENABLED, "off"),
                (ENV_MOUNT_PATH, "/sql/"),
            ]))
            .unwrap();
        assert_eq!(config.secret().unwrap().expose(), "from-env");
        assert!(!config.instrumentation_enabled);
        assert_eq!(config.normalized_mount_path(), "/sql");
    }

    #[test]
    fn test_env_rejects_bad_flag() {
        let mut config = DeckConfig::default();
        let err = config.apply_vars(vars(&[(ENV_ENABLED, "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_normalized_root_mount() {
        let config = DeckConfig {
            mount_path: "/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.normalized_mount_path(), "/");
    }
}
