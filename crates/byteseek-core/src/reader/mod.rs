//! Chunk reader: serves `read_chunk(size, offset)` against a resolved resource.
//!
//! Every fetch is one ranged GET. A full-body 200 answer to a read at a
//! non-zero offset aborts the transfer and poisons the reader, so an origin
//! that ignores `Range` can never be downloaded whole one chunk at a time.

mod cache;
mod strategy;

pub use cache::CacheEntry;
pub use strategy::{ReadStrategy, StrategyKind, DEFAULT_PREFETCH_WINDOW};

use std::sync::Arc;

use crate::error::{ByteSourceError, Result};
use crate::fetch::{FetchRequest, FetchResponse, RangeFetch, Target};
use crate::probe::{RangeSupport, ResourceDescriptor};
use crate::progress::{ProgressTracker, StatusObserver};
use crate::retry::{run_with_retry, RetryPolicy};
use crate::window::ByteWindow;

/// Default progress denominator: 20 MiB.
pub const DEFAULT_ESTIMATED_WORKLOAD: u64 = 20 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct ReaderOptions {
    pub strategy: ReadStrategy,
    pub retry: RetryPolicy,
    pub estimated_workload: u64,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            strategy: ReadStrategy::default(),
            retry: RetryPolicy::no_retry(),
            estimated_workload: DEFAULT_ESTIMATED_WORKLOAD,
        }
    }
}

pub struct ChunkReader<F> {
    fetcher: F,
    request_url: String,
    proxied: bool,
    descriptor: ResourceDescriptor,
    options: ReaderOptions,
    cache: Option<CacheEntry>,
    progress: ProgressTracker,
    observer: Arc<dyn StatusObserver>,
    fetch_count: u64,
    poisoned: bool,
}

impl<F: RangeFetch> ChunkReader<F> {
    pub fn new(
        fetcher: F,
        target: &Target,
        descriptor: ResourceDescriptor,
        options: ReaderOptions,
        observer: Arc<dyn StatusObserver>,
    ) -> Self {
        Self {
            fetcher,
            request_url: target.request_url(),
            proxied: target.is_proxied(),
            descriptor,
            progress: ProgressTracker::new(options.estimated_workload),
            options,
            cache: None,
            observer,
            fetch_count: 0,
            poisoned: false,
        }
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    /// Number of network fetches issued so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetch_count
    }

    pub fn bytes_fetched(&self) -> u64 {
        self.progress.bytes_so_far()
    }

    /// Returns exactly `size` bytes at `offset`, or the tail remainder when the
    /// window runs past the end. Empty when `size == 0` or `offset >= total`.
    pub fn read_chunk(&mut self, size: u64, offset: u64) -> Result<Vec<u8>> {
        if self.poisoned {
            return Err(ByteSourceError::NonRangeServer);
        }
        let total = self.descriptor.size();
        let want = ByteWindow::new(offset, size).clip(total);
        if want.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(bytes) = self.cache.as_ref().and_then(|c| c.slice(&want)) {
            tracing::trace!(offset, size = want.length, "cache hit");
            return Ok(bytes.to_vec());
        }

        if offset > 0 && self.descriptor.range_support() == RangeSupport::No {
            self.poisoned = true;
            return Err(ByteSourceError::NonRangeServer);
        }

        let fetch_window = match self.options.strategy {
            ReadStrategy::Direct => want,
            ReadStrategy::Prefetch { window } => {
                ByteWindow::new(offset, want.length.max(window)).clip(total)
            }
        };

        let data = match self.fetch_window(fetch_window) {
            Ok(data) => data,
            Err(ByteSourceError::NonRangeServer) => {
                self.poisoned = true;
                self.cache = None;
                return Err(ByteSourceError::NonRangeServer);
            }
            Err(e) => return Err(e),
        };

        match self.options.strategy {
            ReadStrategy::Direct => Ok(data),
            ReadStrategy::Prefetch { .. } => {
                let out = data[..want.length as usize].to_vec();
                self.cache = Some(CacheEntry {
                    start: fetch_window.start,
                    data,
                });
                Ok(out)
            }
        }
    }

    /// Marks the session complete; progress jumps to 100.
    pub fn finish(&mut self) {
        self.progress.finish();
        self.observer.on_progress(self.progress.percent());
    }

    fn fetch_window(&mut self, window: ByteWindow) -> Result<Vec<u8>> {
        let request = FetchRequest::ranged(self.request_url.as_str(), window)
            .abort_on_full_body(window.start > 0);
        tracing::debug!(range = %window.range_header_value(), "fetching window");

        let fetcher = &self.fetcher;
        let proxied = self.proxied;
        let mut attempts = 0u64;
        let result = run_with_retry(&self.options.retry, || {
            attempts += 1;
            let resp = fetcher.fetch(&request)?;
            accept_response(resp, window, proxied)
        });
        self.fetch_count += attempts;

        let data = result?;
        self.progress.record(data.len() as u64);
        self.observer.on_progress(self.progress.percent());
        Ok(data)
    }
}

/// Maps a fetch response for `window` onto the error taxonomy.
fn accept_response(resp: FetchResponse, window: ByteWindow, proxied: bool) -> Result<Vec<u8>> {
    match resp.status {
        206 => match resp.headers.content_range_start {
            Some(start) if start != window.start => {
                tracing::warn!(
                    expected = window.start,
                    received = start,
                    "partial content for a different range"
                );
                return Err(ByteSourceError::Read(206));
            }
            _ => {}
        },
        200 if window.start > 0 => return Err(ByteSourceError::NonRangeServer),
        200 => {}
        502 if proxied => return Err(ByteSourceError::ProxyUpstream(resp.body_text())),
        status => return Err(ByteSourceError::Read(status)),
    }

    let mut data = resp.body;
    let received = data.len() as u64;
    if received < window.length {
        return Err(ByteSourceError::ShortRead {
            expected: window.length,
            received,
        });
    }
    data.truncate(window.length as usize);
    Ok(data)
}
