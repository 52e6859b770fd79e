//! libcurl-backed `RangeFetch`.
//!
//! Follows redirects, applies connect and low-speed timeouts, and stops the
//! body early once the request's limit is reached so an origin that ignores
//! `Range` never streams the whole resource into memory.

use std::cell::{Cell, RefCell};
use std::str;
use std::time::Duration;

use super::parse::{parse_headers, parse_status_line};
use super::{FetchMethod, FetchRequest, FetchResponse, RangeFetch};
use crate::control::CancelToken;
use crate::error::{ByteSourceError, Result};

/// Bytes kept from a non-2xx response body.
const ERROR_BODY_LIMIT: usize = 4096;

/// Per-handle libcurl settings shared by the reader and the gateway upstream.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub connect_timeout: Duration,
    /// Abort when no body bytes arrive for this long.
    pub response_timeout: Duration,
    pub max_redirects: u32,
    pub user_agent: String,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            response_timeout: Duration::from_secs(30),
            max_redirects: 10,
            user_agent: concat!("byteseek/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl TransportOptions {
    /// Applies redirect and timeout settings to a handle.
    pub fn apply(&self, easy: &mut curl::easy::Easy) -> std::result::Result<(), curl::Error> {
        easy.follow_location(true)?;
        easy.max_redirections(self.max_redirects)?;
        easy.connect_timeout(self.connect_timeout)?;
        // A connection that accepts but never sends anything trips the low-speed guard.
        easy.low_speed_limit(1)?;
        easy.low_speed_time(self.response_timeout)?;
        easy.useragent(&self.user_agent)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CurlFetcher {
    options: TransportOptions,
    cancel: CancelToken,
}

impl CurlFetcher {
    pub fn new(options: TransportOptions, cancel: CancelToken) -> Self {
        Self { options, cancel }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}

impl RangeFetch for CurlFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        if self.cancel.is_cancelled() {
            return Err(ByteSourceError::Cancelled);
        }

        let mut easy = curl::easy::Easy::new();
        easy.url(&request.url)
            .map_err(|_| ByteSourceError::InvalidUrl(request.url.clone()))?;
        self.options
            .apply(&mut easy)
            .map_err(ByteSourceError::Transport)?;
        match request.method {
            FetchMethod::Head => easy.nobody(true),
            FetchMethod::Get => easy.get(true),
        }
        .map_err(ByteSourceError::Transport)?;
        if let Some(window) = request.range {
            easy.range(&window.curl_range())
                .map_err(ByteSourceError::Transport)?;
        }
        easy.progress(true).map_err(ByteSourceError::Transport)?;

        let lines: RefCell<Vec<String>> = RefCell::new(Vec::new());
        let body: RefCell<Vec<u8>> = RefCell::new(Vec::new());
        let stopped = Cell::new(false);
        let limit = request
            .body_limit
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);
        let cancel = &self.cancel;

        {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        let line = s.trim_end();
                        // Each redirect hop starts a new block; keep only the last one.
                        if line.starts_with("HTTP/") {
                            lines.borrow_mut().clear();
                        }
                        lines.borrow_mut().push(line.to_string());
                    }
                    true
                })
                .map_err(ByteSourceError::Transport)?;
            transfer
                .write_function(|data| {
                    if cancel.is_cancelled() {
                        return Ok(0);
                    }
                    let status = lines.borrow().first().and_then(|l| parse_status_line(l));
                    if request.abort_on_full_body && status == Some(200) {
                        stopped.set(true);
                        return Ok(0);
                    }
                    // The window limit is for payload; error bodies are kept as diagnostics.
                    let limit = match status {
                        Some(200..=299) => limit,
                        _ => ERROR_BODY_LIMIT,
                    };
                    let mut body = body.borrow_mut();
                    let room = limit.saturating_sub(body.len());
                    if data.len() > room {
                        body.extend_from_slice(&data[..room]);
                        stopped.set(true);
                        return Ok(0);
                    }
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(ByteSourceError::Transport)?;
            transfer
                .progress_function(|_, _, _, _| !cancel.is_cancelled())
                .map_err(ByteSourceError::Transport)?;

            if let Err(e) = transfer.perform() {
                if cancel.is_cancelled() {
                    return Err(ByteSourceError::Cancelled);
                }
                if !(stopped.get() && e.is_write_error()) {
                    return Err(ByteSourceError::Transport(e));
                }
            }
        }

        let status = easy.response_code().map_err(ByteSourceError::Transport)?;
        let headers = parse_headers(&lines.borrow());
        let body = body.into_inner();
        tracing::trace!(
            url = %request.url,
            status,
            bytes = body.len(),
            truncated = stopped.get(),
            "fetch complete"
        );
        Ok(FetchResponse {
            status,
            headers,
            body,
        })
    }
}
