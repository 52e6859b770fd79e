//! CLI command handlers, one per file.

mod analyze;
mod read;
mod serve;
mod size;

pub use analyze::{run_analyze, AnalyzeArgs};
pub use read::run_read;
pub use serve::run_serve;
pub use size::run_size;

use std::sync::Arc;

use anyhow::{Context, Result};
use byteseek_core::config::ByteseekConfig;
use byteseek_core::control::CancelToken;
use byteseek_core::fetch::{CurlFetcher, Endpoint, Target};
use byteseek_core::progress::StatusObserver;
use byteseek_core::source::SessionOptions;
use byteseek_core::RemoteByteSource;

/// `--via` wins over `reader.gateway_url` from the config.
fn endpoint(cfg: &ByteseekConfig, via: Option<&str>) -> Result<Endpoint> {
    match via.or(cfg.reader.gateway_url.as_deref()) {
        Some(base) => Endpoint::gateway(base).with_context(|| format!("gateway URL: {}", base)),
        None => Ok(Endpoint::Direct),
    }
}

/// A session over `url` plus the token that cancels its transfers.
fn open_session(
    cfg: &ByteseekConfig,
    url: &str,
    via: Option<&str>,
    options: SessionOptions,
    observer: Arc<dyn StatusObserver>,
) -> Result<(RemoteByteSource<CurlFetcher>, CancelToken)> {
    let target = Target::new(url, endpoint(cfg, via)?)?;
    let cancel = CancelToken::new();
    let fetcher = CurlFetcher::new(cfg.transport.options(), cancel.clone());
    tracing::info!(url, proxied = target.is_proxied(), "opening session");
    Ok((
        RemoteByteSource::with_observer(fetcher, target, options, observer),
        cancel,
    ))
}

/// Cancels the session on Ctrl-C. Abort the returned handle once done.
fn cancel_on_ctrl_c(cancel: CancelToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received; cancelling session");
            cancel.cancel();
        }
    })
}
