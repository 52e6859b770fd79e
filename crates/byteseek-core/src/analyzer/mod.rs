//! Analyzer backends: consumers of a `ByteSource` that build a structural
//! outline of a media container from seeking reads.
//!
//! Backends are looked up by name and loaded at most once per process; every
//! session after the first reuses the loaded instance.

mod isobmff;
mod render;

pub use isobmff::{BoxNode, IsoBmffOutline, Outline};
pub use render::render;

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{ByteSourceError, Result};
use crate::source::ByteSource;

pub const DEFAULT_BACKEND: &str = "isobmff";

/// Names accepted by [`backend`].
pub const BACKENDS: [&str; 1] = [DEFAULT_BACKEND];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Xml,
    Html,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Xml => "xml",
            OutputFormat::Html => "html",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "xml" => Ok(OutputFormat::Xml),
            "html" => Ok(OutputFormat::Html),
            other => Err(format!(
                "unknown output format '{other}' (expected text, json, xml or html)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeOptions {
    pub format: OutputFormat,
    /// Do not read cover-art payloads.
    pub skip_cover_art: bool,
    /// Descend into metadata containers instead of listing top-level boxes only.
    pub full_metadata: bool,
}

/// Result of one analysis: the structure and its rendering.
#[derive(Debug, Clone)]
pub struct Report {
    pub format: OutputFormat,
    pub outline: Outline,
    pub rendered: String,
}

pub trait Analyzer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Drives `source` (calling `get_size` first) and renders the result.
    fn analyze(&self, source: &mut dyn ByteSource, options: &AnalyzeOptions) -> Result<Report>;
}

static ISOBMFF: OnceLock<IsoBmffOutline> = OnceLock::new();

/// Loaded backend for `name`.
pub fn backend(name: &str) -> Result<&'static dyn Analyzer> {
    match name {
        "isobmff" => Ok(ISOBMFF.get_or_init(|| {
            tracing::debug!("loading analyzer backend isobmff");
            IsoBmffOutline::new()
        })),
        other => Err(ByteSourceError::ModuleLoad(format!(
            "unknown analyzer backend '{}' (available: {})",
            other,
            BACKENDS.join(", ")
        ))),
    }
}
