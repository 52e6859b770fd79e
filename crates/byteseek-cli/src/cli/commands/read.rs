//! `byteseek read <url> --offset N --length N` – fetch one chunk.

use anyhow::{Context, Result};
use byteseek_core::config::ByteseekConfig;
use byteseek_core::progress::NoopObserver;
use byteseek_core::ByteSource;
use std::path::Path;
use std::sync::Arc;

use super::{cancel_on_ctrl_c, open_session};

const DUMP_WIDTH: usize = 16;

/// `xxd`-style dump: offset, hex bytes, printable ASCII.
fn hex_dump(data: &[u8], base_offset: u64) -> String {
    let mut out = String::new();
    for (i, row) in data.chunks(DUMP_WIDTH).enumerate() {
        let hex: Vec<String> = row.iter().map(|b| format!("{:02x}", b)).collect();
        let ascii: String = row
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    char::from(b)
                } else {
                    '.'
                }
            })
            .collect();
        out.push_str(&format!(
            "{:08x}  {:<width$}  |{}|\n",
            base_offset + (i * DUMP_WIDTH) as u64,
            hex.join(" "),
            ascii,
            width = DUMP_WIDTH * 3 - 1
        ));
    }
    out
}

pub async fn run_read(
    cfg: &ByteseekConfig,
    url: &str,
    offset: u64,
    length: u64,
    via: Option<&str>,
    out: Option<&Path>,
) -> Result<()> {
    let (mut source, cancel) =
        open_session(cfg, url, via, cfg.session_options(), Arc::new(NoopObserver))?;
    let interrupt = cancel_on_ctrl_c(cancel);

    let result = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
        source.get_size()?;
        Ok(source.read_chunk(length, offset)?)
    })
    .await
    .context("read task join");
    interrupt.abort();
    let data = result??;

    match out {
        Some(path) => {
            std::fs::write(path, &data)
                .with_context(|| format!("write chunk: {}", path.display()))?;
            println!("Wrote {} bytes to {}", data.len(), path.display());
        }
        None => print!("{}", hex_dump(&data, offset)),
    }
    Ok(())
}
