//! Configuration types for bakraload
//!
//! Configuration is built once at startup (from defaults, an optional JSON
//! file and environment variables) and is read-only afterwards. It is shared
//! as `Arc<Config>` and injected into the fetcher and API layers.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};
use utoipa::ToSchema;

/// Workspace allocation settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct WorkspaceConfig {
    /// Directory under which per-request workspaces are created
    /// (default: the system temporary directory)
    #[serde(default)]
    pub temp_root: Option<PathBuf>,

    /// Prefix for workspace directory names (default: "bakraload")
    #[serde(default = "default_workspace_prefix")]
    pub prefix: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            temp_root: None,
            prefix: default_workspace_prefix(),
        }
    }
}

impl WorkspaceConfig {
    /// Directory that will hold the workspaces
    pub fn root(&self) -> PathBuf {
        self.temp_root.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// External fetcher settings (yt-dlp, ffmpeg)
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FetcherConfig {
    /// Path to yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub yt_dlp_path: Option<PathBuf>,

    /// Path to ffmpeg executable (auto-detected if None)
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// User-Agent sent to third-party platforms
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum time one fetch may take (default: 600 seconds)
    #[serde(with = "duration_serde", default = "default_fetch_timeout")]
    #[schema(value_type = u64)]
    pub timeout: Duration,

    /// MP3 bitrate in kbps passed to the transcoder (default: "192")
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: None,
            ffmpeg_path: None,
            search_path: true,
            user_agent: default_user_agent(),
            timeout: default_fetch_timeout(),
            audio_quality: default_audio_quality(),
        }
    }
}

/// Bulk request settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkConfig {
    /// Maximum number of URLs accepted in one bulk request (default: 50)
    #[serde(default = "default_bulk_max_urls")]
    pub max_urls: usize,

    /// Number of URLs fetched at the same time (default: 1 = sequential)
    #[serde(default = "default_bulk_concurrency")]
    pub concurrency: usize,

    /// Time after which a single URL of a bulk request is abandoned (default: 900 seconds)
    #[serde(with = "duration_serde", default = "default_bulk_item_timeout")]
    #[schema(value_type = u64)]
    pub per_url_timeout: Duration,

    /// Add an `errors.txt` manifest to the archive when some URLs failed (default: false)
    #[serde(default)]
    pub write_manifest: bool,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            max_urls: default_bulk_max_urls(),
            concurrency: default_bulk_concurrency(),
            per_url_timeout: default_bulk_item_timeout(),
            write_manifest: false,
        }
    }
}

/// Main configuration for bakraload
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Workspace allocation
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// External fetcher tools
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Bulk request behavior
    #[serde(default)]
    pub bulk: BulkConfig,

    /// API server
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Load configuration from a JSON file, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
            key: None,
        })?;
        config.with_env_overrides()
    }

    /// Default configuration with environment overrides applied
    pub fn from_env() -> Result<Self> {
        Config::default().with_env_overrides()
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`
    ///
    /// Recognised keys: `HOST`, `PORT`, `ALLOWED_ORIGINS`, `FORCE_HTTPS`,
    /// `RATE_LIMIT_PER_MINUTE`, `BAKRALOAD_TEMP_DIR`, `YT_DLP_PATH`,
    /// `FFMPEG_PATH`, `BULK_CONCURRENCY`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("HOST") {
            let ip: IpAddr = host.trim().parse().map_err(|_| Error::Config {
                message: format!("invalid HOST: {}", host),
                key: Some("HOST".into()),
            })?;
            self.api.bind_address.set_ip(ip);
        }
        if let Some(port) = get("PORT") {
            self.api.bind_address.set_port(parse_env("PORT", &port)?);
        }
        if let Some(origins) = get("ALLOWED_ORIGINS") {
            self.api.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Some(force) = get("FORCE_HTTPS") {
            self.api.force_https = force.trim().eq_ignore_ascii_case("true");
        }
        if let Some(per_minute) = get("RATE_LIMIT_PER_MINUTE") {
            self.api.rate_limit.per_minute = parse_env("RATE_LIMIT_PER_MINUTE", &per_minute)?;
        }
        if let Some(dir) = get("BAKRALOAD_TEMP_DIR") {
            self.workspace.temp_root = Some(PathBuf::from(dir));
        }
        if let Some(path) = get("YT_DLP_PATH") {
            self.fetcher.yt_dlp_path = Some(PathBuf::from(path));
        }
        if let Some(path) = get("FFMPEG_PATH") {
            self.fetcher.ffmpeg_path = Some(PathBuf::from(path));
        }
        if let Some(concurrency) = get("BULK_CONCURRENCY") {
            self.bulk.concurrency = parse_env("BULK_CONCURRENCY", &concurrency)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject settings that cannot work
    pub fn validate(&self) -> Result<()> {
        if self.bulk.concurrency == 0 {
            return Err(Error::Config {
                message: "bulk concurrency must be at least 1".into(),
                key: Some("bulk.concurrency".into()),
            });
        }
        if self.bulk.max_urls == 0 {
            return Err(Error::Config {
                message: "bulk max_urls must be at least 1".into(),
                key: Some("bulk.max_urls".into()),
            });
        }
        if self.api.rate_limit.enabled && self.api.rate_limit.per_minute == 0 {
            return Err(Error::Config {
                message: "rate limit must allow at least one request per minute".into(),
                key: Some("api.rate_limit.per_minute".into()),
            });
        }
        if self.workspace.prefix.is_empty()
            || self
                .workspace
                .prefix
                .contains(|c: char| c == '/' || c == '\\')
        {
            return Err(Error::Config {
                message: format!("invalid workspace prefix: {:?}", self.workspace.prefix),
                key: Some("workspace.prefix".into()),
            });
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| Error::Config {
        message: format!("invalid {}: {}", key, value),
        key: Some(key.to_string()),
    })
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 0.0.0.0:5000)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,

    /// Send HSTS and a strict content security policy (default: false)
    #[serde(default)]
    pub force_https: bool,

    /// Maximum accepted request body size in bytes (default: 500 MiB)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
            force_https: false,
            max_body_bytes: default_max_body_bytes(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Per-route rate limit override
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RouteLimit {
    /// Exact request path (e.g., "/download")
    pub path: String,
    /// Requests per minute per IP on this path
    pub per_minute: u32,
}

/// Rate limiting configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RateLimitConfig {
    /// Enable rate limiting (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Requests per minute per IP for routes without an override (default: 30)
    #[serde(default = "default_requests_per_minute")]
    pub per_minute: u32,

    /// Stricter limits for expensive routes
    #[serde(default = "default_route_limits")]
    pub route_limits: Vec<RouteLimit>,

    /// Endpoints exempt from rate limiting
    #[serde(default = "default_exempt_paths")]
    pub exempt_paths: Vec<String>,

    /// IPs exempt from rate limiting
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub exempt_ips: Vec<IpAddr>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            per_minute: default_requests_per_minute(),
            route_limits: default_route_limits(),
            exempt_paths: default_exempt_paths(),
            exempt_ips: Vec::new(),
        }
    }
}

impl RateLimitConfig {
    /// Requests per minute allowed on `path`
    pub fn limit_for(&self, path: &str) -> u32 {
        self.route_limits
            .iter()
            .find(|r| r.path == path)
            .map(|r| r.per_minute)
            .unwrap_or(self.per_minute)
    }
}

// Default value functions
fn default_workspace_prefix() -> String {
    "bakraload".to_string()
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_audio_quality() -> String {
    "192".to_string()
}

fn default_bulk_max_urls() -> usize {
    50
}

fn default_bulk_concurrency() -> usize {
    1
}

fn default_bulk_item_timeout() -> Duration {
    Duration::from_secs(900)
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

fn default_max_body_bytes() -> usize {
    500 * 1024 * 1024
}

fn default_requests_per_minute() -> u32 {
    30
}

fn default_route_limits() -> Vec<RouteLimit> {
    vec![
        RouteLimit {
            path: "/download".to_string(),
            per_minute: 10,
        },
        RouteLimit {
            path: "/bulk-download".to_string(),
            per_minute: 3,
        },
    ]
}

fn default_exempt_paths() -> Vec<String> {
    vec!["/health".to_string()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
