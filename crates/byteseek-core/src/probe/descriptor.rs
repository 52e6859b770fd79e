use url::Url;

/// Whether the origin honors byte ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSupport {
    Yes,
    No,
    Unknown,
}

/// Resolved facts about the remote resource of one session.
/// Built once by `resolve_size` and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    url: Url,
    size: u64,
    range_support: RangeSupport,
}

impl ResourceDescriptor {
    pub fn new(url: Url, size: u64, range_support: RangeSupport) -> Self {
        Self {
            url,
            size,
            range_support,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn range_support(&self) -> RangeSupport {
        self.range_support
    }
}
