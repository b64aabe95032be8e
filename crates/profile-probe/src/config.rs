//! Client configuration loading and resolution.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::types::{ProbeError, ProbeResult};

/// Config file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "profile-probe.json";

const DEFAULT_USER_AGENT: &str = "Instagram 133.0.0.34.124 Android \
    (28/9; 320dpi; 720x1280; Xiaomi; Redmi 5; rosy; qcom; en_US)";

/// Which upstream document the profile fetcher asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProfileEndpoint {
    /// JSON web API: `/api/v1/users/web_profile_info/?username=`.
    #[default]
    WebProfileInfo,
    /// Public HTML profile page: `/<username>/`.
    ProfilePage,
}

impl std::str::FromStr for ProfileEndpoint {
    type Err = ProbeError;

    fn from_str(s: &str) -> ProbeResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" | "web_profile_info" => Ok(ProfileEndpoint::WebProfileInfo),
            "page" | "html" | "profile_page" => Ok(ProfileEndpoint::ProfilePage),
            other => Err(ProbeError::Config(format!("unknown endpoint: {other}"))),
        }
    }
}

/// Logging settings handed to the subscriber at start-up.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive (trace, debug, info, warn, error, or a full EnvFilter string).
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Settings for one client run. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Public web origin; root of CSRF discovery and the HTML profile page.
    pub web_base: String,
    /// Private web API origin.
    pub api_base: String,
    /// Path on `web_base` requested by the session validator.
    pub validation_path: String,
    pub user_agent: String,
    pub accept_language: String,
    pub endpoint: ProfileEndpoint,
    pub request_timeout_ms: u64,
    /// Page size for follower/following listings.
    pub connection_limit: u32,
    pub log: LogConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            web_base: "https://www.instagram.com/".to_string(),
            api_base: "https://i.instagram.com/".to_string(),
            validation_path: "/".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
            endpoint: ProfileEndpoint::default(),
            request_timeout_ms: 15_000,
            connection_limit: 50,
            log: LogConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Default configuration with both origins pointed at `base`.
    ///
    /// Mostly useful for tests against a local mock server.
    pub fn with_base(base: &str) -> Self {
        Self {
            web_base: base.to_string(),
            api_base: base.to_string(),
            ..Self::default()
        }
    }

    /// Read a JSON config file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: ClientConfig = serde_json::from_str(&raw).map_err(|e| {
            ProbeError::Config(format!("invalid config {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the origins parse and the numbers are usable.
    pub fn validate(&self) -> ProbeResult<()> {
        self.web_url()?;
        self.api_url()?;
        if self.request_timeout_ms == 0 {
            return Err(ProbeError::Config(
                "request_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.connection_limit == 0 {
            return Err(ProbeError::Config(
                "connection_limit must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn web_url(&self) -> ProbeResult<Url> {
        parse_origin(&self.web_base)
    }

    pub fn api_url(&self) -> ProbeResult<Url> {
        parse_origin(&self.api_base)
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_origin(raw: &str) -> ProbeResult<Url> {
    let mut url = Url::parse(raw.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ProbeError::Config(format!(
            "unsupported scheme in {raw}: expected http or https"
        )));
    }
    // `Url::join` drops the last segment unless the path ends with a slash.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Resolve the config to use: explicit path, then `./profile-probe.json`, then defaults.
pub fn resolve_config(explicit: Option<&Path>) -> ProbeResult<ClientConfig> {
    if let Some(path) = explicit {
        return ClientConfig::load(path);
    }

    let cwd_config = PathBuf::from(DEFAULT_CONFIG_FILE);
    if cwd_config.exists() {
        tracing::debug!("Using config file: {}", cwd_config.display());
        return ClientConfig::load(&cwd_config);
    }

    Ok(ClientConfig::default())
}
