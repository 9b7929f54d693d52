//! Pipeline configuration.
//!
//! A [`PipelineConfig`] carries the client's defaults: the base address,
//! timeouts, the accepted status range, default headers, and the paths and
//! names the classifier needs.
//!
//! Configuration can come from the environment, a TOML document, or code:
//!
//! ```ignore
//! // COURIER_BASE_API=https://api.example.com/backend
//! let config = PipelineConfig::from_env()?;
//!
//! let config = PipelineConfig::from_toml_str(r#"
//!     base_url = "https://api.example.com/backend"
//!     timeout_ms = 15000
//!
//!     [accepted_status]
//!     min = 200
//!     max = 500
//! "#)?;
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use courier_core::logging::targets;
use serde::Deserialize;

use crate::error::{PipelineError, Result};

/// Environment variable holding the upstream base address.
pub const BASE_URL_ENV: &str = "COURIER_BASE_API";

/// Inclusive range of HTTP statuses handed to the classifier.
///
/// Statuses outside the range are treated as transport failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct StatusRange {
    /// Lowest accepted status.
    pub min: u16,
    /// Highest accepted status.
    pub max: u16,
}

impl StatusRange {
    /// Create a range accepting `min..=max`.
    pub const fn new(min: u16, max: u16) -> Self {
        Self { min, max }
    }

    /// Whether `status` falls inside the range.
    pub fn contains(&self, status: u16) -> bool {
        (self.min..=self.max).contains(&status)
    }
}

impl Default for StatusRange {
    fn default() -> Self {
        Self::new(200, 500)
    }
}

/// Configuration for an [`ApiClient`](crate::http::ApiClient).
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upstream base address; request paths are appended to it.
    pub base_url: String,
    /// Overall per-call timeout in milliseconds.
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Statuses delivered to the classifier instead of failing at transport level.
    pub accepted_status: StatusRange,
    /// Keep cookies across requests.
    pub with_credentials: bool,
    /// User agent sent with every request.
    pub user_agent: Option<String>,
    /// Headers sent with every request.
    pub default_headers: BTreeMap<String, String>,
    /// Path fragment identifying the verification-code endpoint.
    pub verify_code_path: String,
    /// Filename used when a download has no suggested name.
    pub default_download_name: String,
    /// How long notices stay on screen, in milliseconds.
    pub notice_duration_ms: u64,
    /// Directory downloads are saved into. Defaults to the user's download dir.
    pub download_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            accepted_status: StatusRange::default(),
            with_credentials: true,
            user_agent: Some(format!("courier/{}", env!("CARGO_PKG_VERSION"))),
            default_headers: BTreeMap::new(),
            verify_code_path: "/auth/getVerifyCode".to_string(),
            default_download_name: "download.zip".to_string(),
            notice_duration_ms: 3_000,
            download_dir: None,
        }
    }
}

impl PipelineConfig {
    /// Default configuration pointed at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Read the base address from `COURIER_BASE_API`.
    ///
    /// The runtime environment wins; otherwise the value present when the
    /// crate was built is used.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| option_env!("COURIER_BASE_API").map(str::to_string))
            .ok_or_else(|| PipelineError::Config(format!("{BASE_URL_ENV} is not set")))?;

        tracing::debug!(target: targets::CONFIG, %base_url, "base address from environment");
        let config = Self::new(base_url);
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        tracing::debug!(target: targets::CONFIG, path = %path.display(), "loading configuration");
        Self::from_toml_str(&source)
    }

    /// Check the configuration for values the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(PipelineError::Config("base_url is empty".to_string()));
        }
        url::Url::parse(&self.base_url)?;
        if self.accepted_status.min > self.accepted_status.max {
            return Err(PipelineError::Config(format!(
                "accepted_status range {}..={} is empty",
                self.accepted_status.min, self.accepted_status.max
            )));
        }
        if self.default_download_name.trim().is_empty() {
            return Err(PipelineError::Config(
                "default_download_name is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Overall per-call timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Notice display duration.
    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_duration_ms)
    }

    /// Base address without a trailing slash.
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::new("https://api.example.com/");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.accepted_status, StatusRange::new(200, 500));
        assert!(config.with_credentials);
        assert_eq!(config.verify_code_path, "/auth/getVerifyCode");
        assert_eq!(config.default_download_name, "download.zip");
        assert_eq!(config.notice_duration(), Duration::from_secs(3));
        assert_eq!(config.normalized_base_url(), "https://api.example.com");
    }

    #[test]
    fn test_status_range_is_inclusive() {
        let range = StatusRange::default();
        assert!(range.contains(200));
        assert!(range.contains(404));
        assert!(range.contains(500));
        assert!(!range.contains(199));
        assert!(!range.contains(501));
    }

    #[test]
    fn test_from_toml() {
        let config = PipelineConfig::from_toml_str(
            r#"
            base_url = "https://api.example.com/backend"
            timeout_ms = 5000
            with_credentials = false

            [accepted_status]
            min = 200
            max = 299

            [default_headers]
            X-Client = "courier"
            "#,
        )
        .expect("valid config");

        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(!config.with_credentials);
        assert!(!config.accepted_status.contains(404));
        assert_eq!(
            config.default_headers.get("X-Client").map(String::as_str),
            Some("courier")
        );
        // untouched keys keep their defaults
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(matches!(
            PipelineConfig::default().validate(),
            Err(PipelineError::Config(_))
        ));
        assert!(matches!(
            PipelineConfig::new("not a url").validate(),
            Err(PipelineError::InvalidUrl(_))
        ));

        let mut config = PipelineConfig::new("https://api.example.com");
        config.accepted_status = StatusRange::new(500, 200);
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_from_toml_reports_syntax_errors() {
        let err = PipelineConfig::from_toml_str("base_url = ").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("courier.toml");
        std::fs::write(&path, "base_url = \"http://localhost:8099/backend\"\n").expect("write");

        let config = PipelineConfig::load(&path).expect("load");
        assert_eq!(config.base_url, "http://localhost:8099/backend");
    }
}
