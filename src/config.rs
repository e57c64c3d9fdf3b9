//! Configuration module for bookfeed.

use serde::Deserialize;
use std::path::Path;

use crate::{BookfeedError, Result};

/// Web API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,
    /// Port number for the Web API.
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// CORS allowed origins. Empty means any origin (`*`).
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    3000
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// Upstream fetch configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Total timeout per acquisition attempt in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Maximum response body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,
    /// User agent sent upstream. Some origins reject non-browser agents.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Accept header sent upstream.
    #[serde(default = "default_accept")]
    pub accept: String,
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_body_bytes() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124 Safari/537.36".to_string()
}

fn default_accept() -> String {
    "application/rss+xml, application/atom+xml, application/xml;q=0.9, text/xml;q=0.9, */*;q=0.5"
        .to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            timeout_secs: default_fetch_timeout(),
            max_redirects: default_max_redirects(),
            max_body_bytes: default_max_body_bytes(),
            user_agent: default_user_agent(),
            accept: default_accept(),
        }
    }
}

/// Feed source locations used to build the acquisition tiers.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    /// Origin over plaintext transport.
    #[serde(default = "default_origin_http")]
    pub origin_http: String,
    /// Origin over encrypted transport.
    #[serde(default = "default_origin_https")]
    pub origin_https: String,
    /// Path of the new-release feed.
    #[serde(default = "default_shinkan_path")]
    pub shinkan_path: String,
    /// Path of the forthcoming feed.
    #[serde(default = "default_kinkan_path")]
    pub kinkan_path: String,
    /// Read-only content-proxy prefix. The full upstream URL is appended.
    /// Empty disables the proxy tiers.
    #[serde(default = "default_proxy_prefix")]
    pub proxy_prefix: String,
    /// Path of the site search endpoint (served from `origin_https`).
    #[serde(default = "default_search_path")]
    pub search_path: String,
    /// Search response formats, tried in order.
    #[serde(default = "default_search_formats")]
    pub search_formats: Vec<String>,
    /// Search term used when the query is empty.
    #[serde(default = "default_search_placeholder")]
    pub search_placeholder: String,
    /// Origin domain fragment that marks an upstream error page.
    #[serde(default = "default_error_page_marker")]
    pub error_page_marker: String,
    /// Unrelated URL probed first by the connectivity check, to tell a
    /// network outage from an origin outage. Empty skips it.
    #[serde(default = "default_probe_baseline_url")]
    pub probe_baseline_url: String,
}

fn default_origin_http() -> String {
    "http://www.hanmoto.com".to_string()
}

fn default_origin_https() -> String {
    "https://www.hanmoto.com".to_string()
}

fn default_shinkan_path() -> String {
    "/bd/shinkan/feed/".to_string()
}

fn default_kinkan_path() -> String {
    "/bd/kinkan/feed/".to_string()
}

fn default_proxy_prefix() -> String {
    "https://r.jina.ai/".to_string()
}

fn default_search_path() -> String {
    "/bd/search/index.php".to_string()
}

fn default_search_formats() -> Vec<String> {
    vec!["R2MODS".to_string(), "RSS".to_string()]
}

fn default_search_placeholder() -> String {
    "の".to_string()
}

fn default_error_page_marker() -> String {
    "hanmoto".to_string()
}

fn default_probe_baseline_url() -> String {
    "https://example.com/".to_string()
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            origin_http: default_origin_http(),
            origin_https: default_origin_https(),
            shinkan_path: default_shinkan_path(),
            kinkan_path: default_kinkan_path(),
            proxy_prefix: default_proxy_prefix(),
            search_path: default_search_path(),
            search_formats: default_search_formats(),
            search_placeholder: default_search_placeholder(),
            error_page_marker: default_error_page_marker(),
            probe_baseline_url: default_probe_baseline_url(),
        }
    }
}

/// Smallest accepted `filter.local_offset_hours`.
pub const MIN_OFFSET_HOURS: i64 = -14;
/// Largest accepted `filter.local_offset_hours`.
pub const MAX_OFFSET_HOURS: i64 = 14;

/// Temporal admission configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Fixed offset (hours) added to the UTC instant to get the reference time.
    #[serde(default = "default_local_offset_hours")]
    pub local_offset_hours: i64,
    /// Admit items whose publish date cannot be parsed.
    #[serde(default = "default_admit_unparsable")]
    pub admit_unparsable_dates: bool,
}

fn default_local_offset_hours() -> i64 {
    9
}

fn default_admit_unparsable() -> bool {
    true
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            local_offset_hours: default_local_offset_hours(),
            admit_unparsable_dates: default_admit_unparsable(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file. Logs go to stdout only when unset.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Upstream fetch configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Feed source configuration.
    #[serde(default)]
    pub sources: SourcesConfig,
    /// Admission filter configuration.
    #[serde(default)]
    pub filter: FilterConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(BookfeedError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| BookfeedError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `BOOKFEED_HOST`: Override the bind host
    /// - `BOOKFEED_PORT`: Override the bind port (ignored when not a number)
    /// - `BOOKFEED_LOG_LEVEL`: Override the log level
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("BOOKFEED_HOST") {
            if !host.is_empty() {
                self.web.host = host;
            }
        }
        if let Ok(port) = std::env::var("BOOKFEED_PORT") {
            if let Ok(port) = port.trim().parse() {
                self.web.port = port;
            }
        }
        if let Ok(level) = std::env::var("BOOKFEED_LOG_LEVEL") {
            if !level.is_empty() {
                self.logging.level = level;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if a timeout is zero, the local offset is outside
    /// real-world time zones, or an origin is not an absolute URL.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.timeout_secs == 0 || self.fetch.connect_timeout_secs == 0 {
            return Err(BookfeedError::Validation(
                "fetch timeouts must be greater than zero".to_string(),
            ));
        }
        if !(MIN_OFFSET_HOURS..=MAX_OFFSET_HOURS).contains(&self.filter.local_offset_hours) {
            return Err(BookfeedError::Validation(format!(
                "local_offset_hours must be between {MIN_OFFSET_HOURS} and {MAX_OFFSET_HOURS}, got {}",
                self.filter.local_offset_hours
            )));
        }
        for (name, origin) in [
            ("origin_http", &self.sources.origin_http),
            ("origin_https", &self.sources.origin_https),
        ] {
            if origin.is_empty() {
                return Err(BookfeedError::Validation(format!("{name} is empty")));
            }
            url::Url::parse(origin)
                .map_err(|e| BookfeedError::Validation(format!("{name} is invalid: {e}")))?;
        }
        Ok(())
    }
}
