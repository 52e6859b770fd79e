//! CLI for byteseek.

mod commands;

use anyhow::Result;
use byteseek_core::analyzer::{OutputFormat, DEFAULT_BACKEND};
use byteseek_core::config;
use byteseek_core::reader::StrategyKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

use commands::{run_analyze, run_read, run_serve, run_size, AnalyzeArgs};

/// Top-level CLI for byteseek.
#[derive(Debug, Parser)]
#[command(name = "byteseek")]
#[command(
    about = "byteseek: random-access reads over HTTP origins, with a sanitizing range proxy",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// One request per read, no cache.
    Direct,
    /// Fetch a larger window and serve nearby reads from it.
    Prefetch,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Direct => StrategyKind::Direct,
            StrategyArg::Prefetch => StrategyKind::Prefetch,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the proxy gateway until interrupted.
    Serve {
        /// Listen address (default from config, 127.0.0.1:8787).
        #[arg(long, value_name = "ADDR")]
        listen: Option<SocketAddr>,
    },

    /// Resolve the total size of a remote resource.
    Size {
        /// HTTP/HTTPS URL of the resource.
        url: String,
        /// Route requests through this gateway (e.g. http://127.0.0.1:8787).
        #[arg(long, value_name = "GATEWAY")]
        via: Option<String>,
    },

    /// Read one chunk and print it as a hex dump (or write it to a file).
    Read {
        /// HTTP/HTTPS URL of the resource.
        url: String,
        /// Byte offset of the chunk.
        #[arg(long)]
        offset: u64,
        /// Number of bytes to read; clipped at the end of the resource.
        #[arg(long)]
        length: u64,
        /// Route requests through this gateway.
        #[arg(long, value_name = "GATEWAY")]
        via: Option<String>,
        /// Write raw bytes here instead of printing a hex dump.
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Outline the container structure of a remote media file.
    Analyze {
        /// HTTP/HTTPS URL of the resource.
        url: String,
        /// Route requests through this gateway.
        #[arg(long, value_name = "GATEWAY")]
        via: Option<String>,
        /// Read strategy (default from config).
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
        /// Output format: text, json, xml or html.
        #[arg(long, default_value = "text")]
        format: OutputFormat,
        /// Do not read embedded cover art.
        #[arg(long)]
        skip_cover_art: bool,
        /// Descend into metadata containers.
        #[arg(long)]
        full: bool,
        /// Analyzer backend.
        #[arg(long, default_value = DEFAULT_BACKEND)]
        backend: String,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Serve { listen } => run_serve(&cfg, listen).await?,
            CliCommand::Size { url, via } => run_size(&cfg, &url, via.as_deref()).await?,
            CliCommand::Read {
                url,
                offset,
                length,
                via,
                out,
            } => run_read(&cfg, &url, offset, length, via.as_deref(), out.as_deref()).await?,
            CliCommand::Analyze {
                url,
                via,
                strategy,
                format,
                skip_cover_art,
                full,
                backend,
            } => {
                let args = AnalyzeArgs {
                    url,
                    via,
                    strategy: strategy.map(StrategyKind::from),
                    format,
                    skip_cover_art,
                    full_metadata: full,
                    backend,
                };
                run_analyze(&cfg, args).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
