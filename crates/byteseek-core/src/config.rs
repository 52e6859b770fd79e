use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetch::TransportOptions;
use crate::reader::{ReaderOptions, StrategyKind, DEFAULT_ESTIMATED_WORKLOAD, DEFAULT_PREFETCH_WINDOW};
use crate::retry::RetryPolicy;
use crate::source::SessionOptions;

/// Retry policy parameters (optional section in config.toml).
/// Absent means a single attempt per fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per fetch (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(self.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// `[reader]`: how sessions resolve size and read chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// "direct" or "prefetch".
    pub strategy: StrategyKind,
    /// Minimum bytes fetched on a prefetch miss.
    pub prefetch_window: u64,
    /// Denominator of the progress percentage.
    pub estimated_workload: u64,
    /// Try HEAD before the one-byte range probe.
    pub probe_head: bool,
    /// Route reads through this gateway (e.g. "http://127.0.0.1:8787").
    pub gateway_url: Option<String>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Prefetch,
            prefetch_window: DEFAULT_PREFETCH_WINDOW,
            estimated_workload: DEFAULT_ESTIMATED_WORKLOAD,
            probe_head: true,
            gateway_url: None,
        }
    }
}

/// `[transport]`: libcurl settings for the reader and the gateway upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub connect_timeout_secs: u64,
    /// Give up when the origin sends nothing for this long.
    pub response_timeout_secs: u64,
    pub max_redirects: u32,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        let defaults = TransportOptions::default();
        Self {
            connect_timeout_secs: defaults.connect_timeout.as_secs(),
            response_timeout_secs: defaults.response_timeout.as_secs(),
            max_redirects: defaults.max_redirects,
            user_agent: defaults.user_agent,
        }
    }
}

impl TransportConfig {
    pub fn options(&self) -> TransportOptions {
        TransportOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs.max(1)),
            response_timeout: Duration::from_secs(self.response_timeout_secs.max(1)),
            max_redirects: self.max_redirects,
            user_agent: self.user_agent.clone(),
        }
    }
}

/// `[gateway]`: the proxy server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub listen: SocketAddr,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8787)),
        }
    }
}

/// Global configuration loaded from `~/.config/byteseek/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ByteseekConfig {
    #[serde(default)]
    pub reader: ReaderConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Optional retry policy; if missing, fetches are attempted once.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl ByteseekConfig {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            probe_head: self.reader.probe_head,
            reader: ReaderOptions {
                strategy: self.reader.strategy.with_window(self.reader.prefetch_window),
                retry: self
                    .retry
                    .as_ref()
                    .map(RetryConfig::policy)
                    .unwrap_or_else(RetryPolicy::no_retry),
                estimated_workload: self.reader.estimated_workload,
            },
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("byteseek")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ByteseekConfig> {
    load_or_init_at(&config_path()?)
}

pub fn load_or_init_at(path: &Path) -> Result<ByteseekConfig> {
    if !path.exists() {
        let default_cfg = ByteseekConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)
            .with_context(|| format!("write default config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: ByteseekConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
