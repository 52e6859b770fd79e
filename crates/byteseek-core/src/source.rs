//! The byte-source surface handed to an analyzer.
//!
//! `get_size` first (once), then any number of `read_chunk` calls in any
//! order. The adapter does not look at the bytes it serves.

use std::sync::Arc;

use crate::error::{ByteSourceError, Result};
use crate::fetch::{RangeFetch, Target};
use crate::probe::{self, ResourceDescriptor};
use crate::progress::{NoopObserver, StatusObserver};
use crate::reader::{ChunkReader, ReaderOptions};

/// Two-operation contract consumed by analyzer backends.
pub trait ByteSource {
    fn get_size(&mut self) -> Result<u64>;

    fn read_chunk(&mut self, size: u64, offset: u64) -> Result<Vec<u8>>;
}

/// Session options for a `RemoteByteSource`.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Try a HEAD request before the ranged probe.
    pub probe_head: bool,
    pub reader: ReaderOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            probe_head: true,
            reader: ReaderOptions::default(),
        }
    }
}

/// One analysis session over one remote resource.
///
/// Owns the resolved descriptor and the reader's cache; both are dropped
/// with the session and never shared with another one.
pub struct RemoteByteSource<F> {
    target: Target,
    options: SessionOptions,
    observer: Arc<dyn StatusObserver>,
    fetcher: Option<F>,
    reader: Option<ChunkReader<F>>,
}

impl<F: RangeFetch> RemoteByteSource<F> {
    pub fn new(fetcher: F, target: Target, options: SessionOptions) -> Self {
        Self::with_observer(fetcher, target, options, Arc::new(NoopObserver))
    }

    pub fn with_observer(
        fetcher: F,
        target: Target,
        options: SessionOptions,
        observer: Arc<dyn StatusObserver>,
    ) -> Self {
        Self {
            target,
            options,
            observer,
            fetcher: Some(fetcher),
            reader: None,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Resolved descriptor, once `get_size` has succeeded.
    pub fn descriptor(&self) -> Option<&ResourceDescriptor> {
        self.reader.as_ref().map(ChunkReader::descriptor)
    }

    pub fn reader(&self) -> Option<&ChunkReader<F>> {
        self.reader.as_ref()
    }

    /// Signals overall completion to the progress observer.
    pub fn finish(&mut self) {
        if let Some(reader) = self.reader.as_mut() {
            reader.finish();
        }
        self.observer.on_status("analysis complete");
    }
}

impl<F: RangeFetch> ByteSource for RemoteByteSource<F> {
    fn get_size(&mut self) -> Result<u64> {
        if let Some(reader) = &self.reader {
            return Ok(reader.descriptor().size());
        }
        let fetcher = self.fetcher.take().ok_or(ByteSourceError::SizeUnknown)?;

        self.observer.on_status("resolving resource size");
        let descriptor = match probe::resolve_size(&fetcher, &self.target, self.options.probe_head) {
            Ok(d) => d,
            Err(e) => {
                self.fetcher = Some(fetcher);
                return Err(e);
            }
        };
        let size = descriptor.size();
        tracing::info!(
            url = %self.target.url(),
            size,
            range_support = ?descriptor.range_support(),
            "resource size resolved"
        );
        self.observer
            .on_status(&format!("resource size: {size} bytes"));
        self.reader = Some(ChunkReader::new(
            fetcher,
            &self.target,
            descriptor,
            self.options.reader,
            Arc::clone(&self.observer),
        ));
        Ok(size)
    }

    fn read_chunk(&mut self, size: u64, offset: u64) -> Result<Vec<u8>> {
        let reader = self
            .reader
            .as_mut()
            .ok_or(ByteSourceError::SizeNotResolved)?;
        reader.read_chunk(size, offset)
    }
}

/// In-memory source; lets analyzers be exercised without a network.
#[derive(Debug, Clone, Default)]
pub struct MemoryByteSource {
    data: Vec<u8>,
}

impl MemoryByteSource {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl ByteSource for MemoryByteSource {
    fn get_size(&mut self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn read_chunk(&mut self, size: u64, offset: u64) -> Result<Vec<u8>> {
        let len = self.data.len() as u64;
        let start = offset.min(len) as usize;
        let end = offset.saturating_add(size).min(len) as usize;
        Ok(self.data[start..end].to_vec())
    }
}
