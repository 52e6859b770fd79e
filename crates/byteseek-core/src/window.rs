//! Byte windows: half-open ranges requested from an origin.

/// A byte range `[start, start + length)` (half-open).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteWindow {
    /// Start offset (inclusive).
    pub start: u64,
    /// Number of bytes in the window.
    pub length: u64,
}

impl ByteWindow {
    pub fn new(start: u64, length: u64) -> Self {
        Self { start, length }
    }

    /// End offset (exclusive).
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.length)
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Trims the window so it never extends past `total`.
    /// A window starting at or after `total` becomes empty.
    pub fn clip(&self, total: u64) -> ByteWindow {
        if self.start >= total {
            return ByteWindow::new(self.start, 0);
        }
        ByteWindow::new(self.start, self.end().min(total) - self.start)
    }

    /// True if `other` lies entirely inside this window.
    pub fn contains(&self, other: &ByteWindow) -> bool {
        self.start <= other.start && other.end() <= self.end()
    }

    /// HTTP Range header value (inclusive end): `bytes=start-(end-1)`.
    pub fn range_header_value(&self) -> String {
        format!("bytes={}", self.curl_range())
    }

    /// Range in the form libcurl expects: `start-end` without the unit.
    pub fn curl_range(&self) -> String {
        if self.length == 0 {
            "0-0".to_string()
        } else {
            format!("{}-{}", self.start, self.end() - 1)
        }
    }
}
