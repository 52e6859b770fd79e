//! Error taxonomy for one analysis session.
//!
//! Every variant is fatal to the session that produced it; nothing in the core
//! retries unless a `RetryPolicy` with more than one attempt is configured.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ByteSourceError>;

#[derive(Debug, Error)]
pub enum ByteSourceError {
    /// Target string is not an absolute http(s) URL. Raised before any request.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// No probe response carried a usable total length.
    #[error("could not determine resource size")]
    SizeUnknown,

    /// `read_chunk` was called before `get_size`.
    #[error("resource size not resolved; call get_size first")]
    SizeNotResolved,

    /// Origin answered a non-zero-offset ranged read with the full body.
    #[error("origin ignores byte ranges; refusing to download the full resource")]
    NonRangeServer,

    /// Non-success HTTP status on a chunk fetch.
    #[error("read failed with HTTP {0}")]
    Read(u32),

    /// Response body was shorter than the requested window.
    #[error("short read: expected {expected} bytes, got {received}")]
    ShortRead { expected: u64, received: u64 },

    /// Gateway could not reach or stream from the origin (HTTP 502).
    #[error("proxy upstream error: {0}")]
    ProxyUpstream(String),

    /// Network-level failure talking to the gateway or origin.
    #[error("transport: {0}")]
    Transport(#[source] curl::Error),

    /// Session was cancelled through its `CancelToken`.
    #[error("cancelled")]
    Cancelled,

    /// Analyzer backend failed to initialize.
    #[error("analyzer backend failed to load: {0}")]
    ModuleLoad(String),

    /// Analyzer output could not be serialized in the requested format.
    #[error("render report: {0}")]
    Render(#[from] serde_json::Error),
}
