//! Configuration management for the labdash dashboard

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix, e.g. `LABDASH_API__BASE_URL`
pub const ENV_PREFIX: &str = "LABDASH";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Push channel configuration
    #[serde(default)]
    pub live: LiveConfig,

    /// Dashboard timing configuration
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Inventory presentation configuration
    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Session persistence configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// REST API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every REST path is joined onto
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

/// Push channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    /// WebSocket origin, without path
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// Path of the admin orders channel
    #[serde(default = "default_ws_path")]
    pub path: String,

    /// Reconnect after an unexpected close
    #[serde(default = "default_reconnect")]
    pub reconnect: bool,

    /// First reconnect delay in milliseconds
    #[serde(default = "default_reconnect_initial_ms")]
    pub reconnect_initial_ms: u64,

    /// Upper bound of the reconnect delay in milliseconds
    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,
}

/// Dashboard timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Poll period in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,

    /// How long a success message stays visible, in seconds
    #[serde(default = "default_success_ttl")]
    pub success_message_ttl_seconds: u64,

    /// How long teardown waits for background tasks, in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

/// Inventory presentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Quantity drawn as a full stock bar
    #[serde(default = "default_visual_max_stock")]
    pub visual_max_stock: u32,
}

/// Session persistence configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session file; the user config directory is used when unset
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_api_base_url() -> String {
    "http://127.0.0.1:8000/api".to_string()
}

const fn default_request_timeout() -> u64 {
    30
}

fn default_ws_url() -> String {
    "ws://127.0.0.1:8000".to_string()
}

fn default_ws_path() -> String {
    "/ws/admin/orders/".to_string()
}

const fn default_reconnect() -> bool {
    true
}

const fn default_reconnect_initial_ms() -> u64 {
    1_000
}

const fn default_reconnect_max_ms() -> u64 {
    30_000
}

const fn default_poll_interval() -> u64 {
    10
}

const fn default_success_ttl() -> u64 {
    3
}

const fn default_shutdown_timeout() -> u64 {
    5
}

const fn default_visual_max_stock() -> u32 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            path: default_ws_path(),
            reconnect: default_reconnect(),
            reconnect_initial_ms: default_reconnect_initial_ms(),
            reconnect_max_ms: default_reconnect_max_ms(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            success_message_ttl_seconds: default_success_ttl(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            visual_max_stock: default_visual_max_stock(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ApiConfig {
    /// Join a relative REST path onto the base URL
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Request timeout as a [`Duration`]
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl LiveConfig {
    /// Full URL of the admin orders channel
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.ws_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }

    /// First reconnect delay
    #[must_use]
    pub const fn reconnect_initial(&self) -> Duration {
        Duration::from_millis(self.reconnect_initial_ms)
    }

    /// Reconnect delay cap
    #[must_use]
    pub const fn reconnect_max(&self) -> Duration {
        Duration::from_millis(self.reconnect_max_ms)
    }
}

impl DashboardConfig {
    /// Poll period
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// Success message lifetime
    #[must_use]
    pub const fn success_message_ttl(&self) -> Duration {
        Duration::from_secs(self.success_message_ttl_seconds)
    }

    /// Teardown wait bound
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

impl SessionConfig {
    /// Session file to use, falling back to the platform config directory
    #[must_use]
    pub fn resolve_file(&self) -> Option<PathBuf> {
        self.file.clone().or_else(|| {
            directories::ProjectDirs::from("org", "labdash", "labdash")
                .map(|dirs| dirs.config_dir().join("session.json"))
        })
    }
}

impl Config {
    /// Load configuration from `labdash.toml`/`config.toml` and environment
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded, parsed or validated.
    pub fn load() -> crate::Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, reading `path` instead of the default file names
    ///
    /// An explicit `path` must exist; the default files are optional.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded, parsed or validated.
    pub fn load_from(path: Option<&Path>) -> crate::Result<Self> {
        let mut builder = config::Config::builder();

        builder = match path {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => builder
                .add_source(config::File::with_name("labdash").required(false))
                .add_source(config::File::with_name("config").required(false)),
        };

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check values that would make the dashboard misbehave
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] naming the first bad field.
    pub fn validate(&self) -> crate::Result<()> {
        if self.dashboard.poll_interval_seconds == 0 {
            return Err(crate::Error::validation(
                "dashboard.poll_interval_seconds",
                "must be greater than zero",
            ));
        }
        if self.live.reconnect_initial_ms == 0 {
            return Err(crate::Error::validation(
                "live.reconnect_initial_ms",
                "must be greater than zero",
            ));
        }
        if self.live.reconnect_max_ms < self.live.reconnect_initial_ms {
            return Err(crate::Error::validation(
                "live.reconnect_max_ms",
                "must not be smaller than live.reconnect_initial_ms",
            ));
        }
        for (field, url) in [
            ("api.base_url", &self.api.base_url),
            ("live.ws_url", &self.live.ws_url),
        ] {
            url::Url::parse(url).map_err(|e| crate::Error::validation(field, e.to_string()))?;
        }
        match self.logging.format.as_str() {
            "json" | "pretty" => Ok(()),
            other => Err(crate::Error::validation(
                "logging.format",
                format!("expected 'json' or 'pretty', got '{other}'"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.api.base_url, "http://127.0.0.1:8000/api");
        assert_eq!(config.api.request_timeout(), Duration::from_secs(30));

        assert_eq!(config.live.endpoint(), "ws://127.0.0.1:8000/ws/admin/orders/");
        assert!(config.live.reconnect);
        assert_eq!(config.live.reconnect_initial(), Duration::from_secs(1));
        assert_eq!(config.live.reconnect_max(), Duration::from_secs(30));

        assert_eq!(config.dashboard.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.dashboard.success_message_ttl(), Duration::from_secs(3));
        assert_eq!(config.dashboard.shutdown_timeout(), Duration::from_secs(5));

        assert_eq!(config.inventory.visual_max_stock, 100);
        assert!(config.session.file.is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_endpoint_joins_slashes() {
        let api = ApiConfig {
            base_url: "http://lab.local/api/".to_string(),
            request_timeout_seconds: 5,
        };

        assert_eq!(api.endpoint("admin/orders/"), "http://lab.local/api/admin/orders/");
        assert_eq!(api.endpoint("/products/"), "http://lab.local/api/products/");
    }

    #[test]
    fn test_partial_config_deserialization() {
        let json_str = r#"{
            "api": {"base_url": "http://backend:9000/api"},
            "dashboard": {"poll_interval_seconds": 2}
        }"#;

        let config: Config = serde_json::from_str(json_str).unwrap();

        assert_eq!(config.api.base_url, "http://backend:9000/api");
        assert_eq!(config.api.request_timeout_seconds, 30);
        assert_eq!(config.dashboard.poll_interval_seconds, 2);
        assert_eq!(config.dashboard.success_message_ttl_seconds, 3);
        assert_eq!(config.live.path, "/ws/admin/orders/");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[live]
ws_url = "ws://lab.local:8000"
reconnect = false

[inventory]
visual_max_stock = 250

[session]
file = "/tmp/labdash-session.json"
"#
        )
        .unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();

        assert_eq!(config.live.endpoint(), "ws://lab.local:8000/ws/admin/orders/");
        assert!(!config.live.reconnect);
        assert_eq!(config.inventory.visual_max_stock, 250);
        assert_eq!(
            config.session.resolve_file(),
            Some(PathBuf::from("/tmp/labdash-session.json"))
        );
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_from(Some(&dir.path().join("absent.toml")));

        assert!(matches!(result, Err(crate::Error::Configuration { .. })));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.dashboard.poll_interval_seconds = 0;
        assert!(matches!(
            config.validate(),
            Err(crate::Error::Validation { field, .. }) if field == "dashboard.poll_interval_seconds"
        ));

        let mut config = Config::default();
        config.live.reconnect_max_ms = 10;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }
}
