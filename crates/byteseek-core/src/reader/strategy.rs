use serde::{Deserialize, Serialize};

/// Default prefetch window: 2 MiB.
pub const DEFAULT_PREFETCH_WINDOW: u64 = 2 * 1024 * 1024;

/// How the reader turns `read_chunk` calls into fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStrategy {
    /// Fetch exactly the requested window on every call.
    Direct,
    /// On a miss fetch at least `window` bytes from the requested offset and
    /// keep them in a single cache slot.
    Prefetch { window: u64 },
}

impl Default for ReadStrategy {
    fn default() -> Self {
        ReadStrategy::Prefetch {
            window: DEFAULT_PREFETCH_WINDOW,
        }
    }
}

/// Config-file spelling of the strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Direct,
    #[default]
    Prefetch,
}

impl StrategyKind {
    pub fn with_window(self, window: u64) -> ReadStrategy {
        match self {
            StrategyKind::Direct => ReadStrategy::Direct,
            StrategyKind::Prefetch => ReadStrategy::Prefetch {
                window: window.max(1),
            },
        }
    }
}
