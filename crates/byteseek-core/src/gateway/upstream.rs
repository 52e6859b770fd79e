//! Upstream transfer: one libcurl handle per proxied request.
//!
//! The transfer runs on the blocking pool. The response head is handed back
//! through a oneshot as soon as the first body bytes arrive (or the transfer
//! ends), and the body follows through a bounded channel that becomes the
//! streamed response body. Dropping the receiver aborts the transfer.

use std::cell::RefCell;
use std::io;
use std::str;
use std::time::Duration;

use bytes::Bytes;
use hyper::body::Frame;
use tokio::sync::{mpsc, oneshot};
use url::Url;

use crate::fetch::{parse_status_line, FetchMethod, TransportOptions};

/// Body chunks as they come off the upstream connection.
pub type BodyChunk = Result<Frame<Bytes>, io::Error>;

const BODY_CHANNEL_DEPTH: usize = 16;

#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub url: Url,
    pub method: FetchMethod,
    /// Already filtered `Name: value` lines.
    pub headers: Vec<String>,
}

/// Status and raw header lines of the final upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamHead {
    pub status: u16,
    pub lines: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("no response from upstream within {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Transfer(String),
}

/// Starts the transfer and waits (bounded) for the response head.
pub async fn forward(
    request: UpstreamRequest,
    transport: &TransportOptions,
) -> Result<(UpstreamHead, mpsc::Receiver<BodyChunk>), UpstreamError> {
    let (head_tx, head_rx) = oneshot::channel();
    let (body_tx, body_rx) = mpsc::channel(BODY_CHANNEL_DEPTH);
    let head_timeout = transport.connect_timeout + transport.response_timeout;
    let transport = transport.clone();

    tokio::task::spawn_blocking(move || run_transfer(request, transport, head_tx, body_tx));

    match tokio::time::timeout(head_timeout, head_rx).await {
        Err(_) => Err(UpstreamError::Timeout(head_timeout)),
        Ok(Err(_)) => Err(UpstreamError::Transfer("upstream worker exited".to_string())),
        Ok(Ok(Err(msg))) => Err(UpstreamError::Transfer(msg)),
        Ok(Ok(Ok(head))) => Ok((head, body_rx)),
    }
}

fn head_from_lines(lines: &[String]) -> UpstreamHead {
    let status = lines
        .first()
        .and_then(|l| parse_status_line(l))
        .and_then(|s| u16::try_from(s).ok())
        .unwrap_or(502);
    UpstreamHead {
        status,
        lines: lines.to_vec(),
    }
}

fn referer_for(url: &Url) -> String {
    format!("{}/", url.origin().ascii_serialization())
}

fn run_transfer(
    request: UpstreamRequest,
    transport: TransportOptions,
    head_tx: oneshot::Sender<Result<UpstreamHead, String>>,
    body_tx: mpsc::Sender<BodyChunk>,
) {
    let mut easy = curl::easy::Easy::new();
    if let Err(e) = configure(&mut easy, &request, &transport) {
        let _ = head_tx.send(Err(e.to_string()));
        return;
    }

    let lines: RefCell<Vec<String>> = RefCell::new(Vec::new());
    let head_tx = RefCell::new(Some(head_tx));
    // False once the client side has gone away.
    let send_head = || match head_tx.borrow_mut().take() {
        Some(tx) => tx.send(Ok(head_from_lines(&lines.borrow()))).is_ok(),
        None => true,
    };

    let result = perform(&mut easy, &lines, &send_head, &body_tx);

    match result {
        Ok(()) => {
            send_head();
            tracing::debug!(url = %request.url, "upstream transfer complete");
        }
        Err(e) => {
            let pending = head_tx.borrow_mut().take();
            match pending {
                Some(tx) => {
                    tracing::warn!(url = %request.url, "upstream failed before response: {}", e);
                    let _ = tx.send(Err(e.to_string()));
                }
                None if body_tx.is_closed() => {
                    tracing::debug!(url = %request.url, "client went away; upstream aborted");
                }
                None => {
                    tracing::warn!(url = %request.url, "upstream failed mid-body: {}", e);
                    let _ = body_tx.blocking_send(Err(io::Error::other(e.to_string())));
                }
            }
        }
    }
}

fn perform(
    easy: &mut curl::easy::Easy,
    lines: &RefCell<Vec<String>>,
    send_head: &dyn Fn() -> bool,
    body_tx: &mpsc::Sender<BodyChunk>,
) -> Result<(), curl::Error> {
    let mut transfer = easy.transfer();
    transfer.header_function(|data| {
        if let Ok(s) = str::from_utf8(data) {
            let line = s.trim_end();
            // Each redirect hop starts a new block; keep only the last one.
            if line.starts_with("HTTP/") {
                lines.borrow_mut().clear();
            }
            if !line.is_empty() {
                lines.borrow_mut().push(line.to_string());
            }
        }
        true
    })?;
    transfer.write_function(|data| {
        if !send_head() {
            return Ok(0);
        }
        let chunk = Frame::data(Bytes::copy_from_slice(data));
        match body_tx.blocking_send(Ok(chunk)) {
            Ok(()) => Ok(data.len()),
            Err(_) => Ok(0),
        }
    })?;
    transfer.progress_function(|_, _, _, _| !body_tx.is_closed())?;
    transfer.perform()
}

fn configure(
    easy: &mut curl::easy::Easy,
    request: &UpstreamRequest,
    transport: &TransportOptions,
) -> Result<(), curl::Error> {
    easy.url(request.url.as_str())?;
    transport.apply(easy)?;
    match request.method {
        FetchMethod::Head => easy.nobody(true)?,
        FetchMethod::Get => easy.get(true)?,
    }
    easy.referer(&referer_for(&request.url))?;
    let mut list = curl::easy::List::new();
    for line in &request.headers {
        list.append(line)?;
    }
    easy.http_headers(list)?;
    easy.progress(true)?;
    Ok(())
}
