//! Size resolution: total byte length of a remote resource.
//!
//! Cheapest first. An optional HEAD probe, then a one-byte ranged GET
//! (`bytes=0-0`), which also works on origins that reject HEAD with 405.

mod descriptor;

pub use descriptor::{RangeSupport, ResourceDescriptor};

use crate::error::{ByteSourceError, Result};
use crate::fetch::{FetchRequest, FetchResponse, RangeFetch, Target};
use crate::window::ByteWindow;

/// Resolves the size of `target`. Fails with `SizeUnknown` when no response
/// carries a usable total length.
pub fn resolve_size<F>(fetcher: &F, target: &Target, probe_head: bool) -> Result<ResourceDescriptor>
where
    F: RangeFetch + ?Sized,
{
    let request_url = target.request_url();

    if probe_head {
        match fetcher.fetch(&FetchRequest::head(request_url.as_str())) {
            Ok(resp) => {
                if let Some((size, range_support)) = size_from_head(&resp) {
                    tracing::debug!(url = %target.url(), size, ?range_support, "size from HEAD");
                    return Ok(ResourceDescriptor::new(target.url().clone(), size, range_support));
                }
                tracing::debug!(status = resp.status, "HEAD probe gave no length; trying range probe");
            }
            Err(ByteSourceError::Cancelled) => return Err(ByteSourceError::Cancelled),
            Err(e) => tracing::debug!("HEAD probe failed, ignoring: {}", e),
        }
    }

    let probe = FetchRequest::ranged(request_url, ByteWindow::new(0, 1));
    let resp = fetcher.fetch(&probe)?;
    if let Some((size, range_support)) = size_from_range_probe(&resp) {
        tracing::debug!(url = %target.url(), size, ?range_support, "size from range probe");
        return Ok(ResourceDescriptor::new(target.url().clone(), size, range_support));
    }
    if target.is_proxied() && resp.status == 502 {
        return Err(ByteSourceError::ProxyUpstream(resp.body_text()));
    }
    tracing::warn!(status = resp.status, "range probe gave no usable length");
    Err(ByteSourceError::SizeUnknown)
}

/// HEAD: a 2xx with `Content-Length`.
pub fn size_from_head(resp: &FetchResponse) -> Option<(u64, RangeSupport)> {
    if !resp.is_success() {
        return None;
    }
    let size = resp.headers.content_length?;
    let support = if resp.headers.accept_ranges {
        RangeSupport::Yes
    } else {
        RangeSupport::Unknown
    };
    Some((size, support))
}

/// Ranged probe: `Content-Range` total wins regardless of status; otherwise a
/// full-body 200 with `Content-Length` means ranges are not honored.
pub fn size_from_range_probe(resp: &FetchResponse) -> Option<(u64, RangeSupport)> {
    if let Some(total) = resp.headers.content_range_total {
        let support = if resp.status == 206 {
            RangeSupport::Yes
        } else {
            RangeSupport::Unknown
        };
        return Some((total, support));
    }
    if resp.status == 200 {
        return resp.headers.content_length.map(|n| (n, RangeSupport::No));
    }
    None
}
