//! Ranged HTTP fetches.
//!
//! `RangeFetch` is the single seam between the reader logic and the network.
//! `CurlFetcher` is the libcurl implementation; tests substitute in-memory
//! fetchers to count requests.

mod curl_fetcher;
mod endpoint;
mod parse;

pub use curl_fetcher::{CurlFetcher, TransportOptions};
pub use endpoint::{parse_http_url, Endpoint, Target, PROXY_PATH};
pub use parse::{
    parse_content_range_start, parse_content_range_total, parse_headers, parse_status_line,
    ResponseHeaders,
};

use crate::error::Result;
use crate::window::ByteWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMethod {
    Get,
    Head,
}

/// One request against the origin (directly or through the gateway).
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub method: FetchMethod,
    /// Sent as `Range: bytes=<start>-<end>` when set.
    pub range: Option<ByteWindow>,
    /// Stop reading the body after this many bytes.
    pub body_limit: Option<u64>,
    /// Abort as soon as the response turns out to be a full-body 200.
    pub abort_on_full_body: bool,
}

impl FetchRequest {
    pub fn head(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: FetchMethod::Head,
            range: None,
            body_limit: Some(0),
            abort_on_full_body: false,
        }
    }

    /// Ranged GET whose body is capped at the window length.
    pub fn ranged(url: impl Into<String>, window: ByteWindow) -> Self {
        Self {
            url: url.into(),
            method: FetchMethod::Get,
            range: Some(window),
            body_limit: Some(window.length),
            abort_on_full_body: false,
        }
    }

    pub fn abort_on_full_body(mut self, abort: bool) -> Self {
        self.abort_on_full_body = abort;
        self
    }
}

/// Final response after redirects.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u32,
    pub headers: ResponseHeaders,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Short diagnostic text from the body (gateway error pages are plain text).
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).trim().to_string()
    }
}

/// Performs a single HTTP request.
pub trait RangeFetch {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;
}

impl<T: RangeFetch + ?Sized> RangeFetch for &T {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        (**self).fetch(request)
    }
}

impl<T: RangeFetch + ?Sized> RangeFetch for Box<T> {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        (**self).fetch(request)
    }
}

#[cfg(test)]
pub(crate) mod testing;
