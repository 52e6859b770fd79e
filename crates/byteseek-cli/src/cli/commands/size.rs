//! `byteseek size <url>` – resolve the total size of a resource.

use anyhow::{Context, Result};
use byteseek_core::config::ByteseekConfig;
use byteseek_core::progress::NoopObserver;
use byteseek_core::ByteSource;
use std::sync::Arc;

use super::{cancel_on_ctrl_c, open_session};

pub async fn run_size(cfg: &ByteseekConfig, url: &str, via: Option<&str>) -> Result<()> {
    let (mut source, cancel) =
        open_session(cfg, url, via, cfg.session_options(), Arc::new(NoopObserver))?;
    let interrupt = cancel_on_ctrl_c(cancel);

    let result = tokio::task::spawn_blocking(move || -> Result<_> {
        let size = source.get_size()?;
        let support = source.descriptor().map(|d| d.range_support());
        Ok((size, support))
    })
    .await
    .context("size task join");
    interrupt.abort();
    let (size, support) = result??;

    println!("{size}");
    if let Some(support) = support {
        println!("range support: {}", format!("{:?}", support).to_lowercase());
    }
    Ok(())
}
