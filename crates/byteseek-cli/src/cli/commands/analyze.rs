//! `byteseek analyze <url>` – outline a remote media container.

use anyhow::{Context, Result};
use byteseek_core::analyzer::{self, AnalyzeOptions, OutputFormat};
use byteseek_core::config::ByteseekConfig;
use byteseek_core::progress::{ChannelObserver, StatusEvent};
use byteseek_core::reader::StrategyKind;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::{cancel_on_ctrl_c, open_session};

#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    pub url: String,
    pub via: Option<String>,
    /// Overrides `reader.strategy` from the config.
    pub strategy: Option<StrategyKind>,
    pub format: OutputFormat,
    pub skip_cover_art: bool,
    pub full_metadata: bool,
    pub backend: String,
}

pub async fn run_analyze(cfg: &ByteseekConfig, args: AnalyzeArgs) -> Result<()> {
    let backend = analyzer::backend(&args.backend)?;

    let mut options = cfg.session_options();
    if let Some(kind) = args.strategy {
        options.reader.strategy = kind.with_window(cfg.reader.prefetch_window);
    }

    let (tx, mut rx) = mpsc::channel(64);
    let (mut source, cancel) = open_session(
        cfg,
        &args.url,
        args.via.as_deref(),
        options,
        Arc::new(ChannelObserver::new(tx)),
    )?;

    // Status lines go to stderr so the report on stdout stays clean.
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                StatusEvent::Status(msg) => eprintln!("{msg}"),
                StatusEvent::Progress(pct) => eprintln!("progress: {pct}%"),
            }
        }
    });
    let interrupt = cancel_on_ctrl_c(cancel);

    let analyze_options = AnalyzeOptions {
        format: args.format,
        skip_cover_art: args.skip_cover_art,
        full_metadata: args.full_metadata,
    };
    let result = tokio::task::spawn_blocking(move || -> Result<_> {
        let report = backend.analyze(&mut source, &analyze_options)?;
        source.finish();
        Ok(report)
    })
    .await
    .context("analyze task join");
    interrupt.abort();
    let report = result??;

    // The session (and with it the sender) is gone; drain remaining status lines.
    let _ = printer.await;
    tracing::info!(url = %args.url, boxes = report.outline.boxes.len(), "analysis complete");
    print!("{}", report.rendered);
    Ok(())
}
