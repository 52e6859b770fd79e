//! ISO base media file format (MP4, MOV, M4A, 3GP) box outline.
//!
//! Each box starts with a 32-bit big-endian size and a four-character type.
//! Size 1 means a 64-bit size follows the type; size 0 means the box runs to
//! the end of its parent. Only box headers and a few small payloads are read.

use serde::Serialize;

use super::{render, AnalyzeOptions, Analyzer, Report};
use crate::error::Result;
use crate::source::ByteSource;

const HEADER_SIZE: u64 = 8;
const LARGE_HEADER_SIZE: u64 = 16;
const MAX_DEPTH: usize = 8;
/// Upper bound on payload bytes read to describe a box.
const DETAIL_READ_LIMIT: u64 = 64;

/// Boxes whose payload is a sequence of child boxes.
const CONTAINERS: [&str; 14] = [
    "moov", "trak", "mdia", "minf", "stbl", "edts", "dinf", "udta", "meta", "ilst", "moof",
    "traf", "mvex", "covr",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoxNode {
    pub kind: String,
    pub offset: u64,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BoxNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outline {
    pub size: u64,
    /// At least one well-formed box was found at offset 0.
    pub recognized: bool,
    /// A box header was cut off or claimed more bytes than its parent has.
    pub truncated: bool,
    pub boxes: Vec<BoxNode>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IsoBmffOutline;

impl IsoBmffOutline {
    pub fn new() -> Self {
        IsoBmffOutline
    }

    pub fn outline(&self, source: &mut dyn ByteSource, options: &AnalyzeOptions) -> Result<Outline> {
        let size = source.get_size()?;
        let mut walker = Walker {
            source,
            options,
            truncated: false,
        };
        let boxes = walker.walk(0, size, 0)?;
        Ok(Outline {
            size,
            recognized: !boxes.is_empty(),
            truncated: walker.truncated,
            boxes,
        })
    }
}

impl Analyzer for IsoBmffOutline {
    fn name(&self) -> &'static str {
        "isobmff"
    }

    fn analyze(&self, source: &mut dyn ByteSource, options: &AnalyzeOptions) -> Result<Report> {
        let outline = self.outline(source, options)?;
        tracing::debug!(
            boxes = outline.boxes.len(),
            truncated = outline.truncated,
            "outline complete"
        );
        let rendered = render(&outline, options.format)?;
        Ok(Report {
            format: options.format,
            outline,
            rendered,
        })
    }
}

struct BoxHeader {
    kind: String,
    size: u64,
    header_size: u64,
}

struct Walker<'a> {
    source: &'a mut dyn ByteSource,
    options: &'a AnalyzeOptions,
    truncated: bool,
}

impl Walker<'_> {
    fn walk(&mut self, start: u64, end: u64, depth: usize) -> Result<Vec<BoxNode>> {
        let mut boxes = Vec::new();
        let mut offset = start;
        while offset < end {
            let Some(header) = self.header(offset, end)? else {
                self.truncated = true;
                break;
            };
            let box_end = offset + header.size;
            let payload = offset + header.header_size;
            let mut node = BoxNode {
                kind: header.kind,
                offset,
                size: header.size,
                detail: None,
                children: Vec::new(),
            };

            if node.kind == "covr" && self.options.skip_cover_art {
                node.detail = Some("cover art skipped".to_string());
            } else {
                node.detail = self.detail(&node.kind, payload, box_end)?;
                if self.options.full_metadata
                    && depth < MAX_DEPTH
                    && CONTAINERS.contains(&node.kind.as_str())
                {
                    // `meta` is a full box: version and flags precede the children.
                    let first = if node.kind == "meta" { payload + 4 } else { payload };
                    node.children = self.walk(first.min(box_end), box_end, depth + 1)?;
                }
            }

            boxes.push(node);
            offset = box_end;
        }
        Ok(boxes)
    }

    fn header(&mut self, offset: u64, end: u64) -> Result<Option<BoxHeader>> {
        let raw = self.source.read_chunk(HEADER_SIZE, offset)?;
        if raw.len() < HEADER_SIZE as usize {
            return Ok(None);
        }
        let kind_bytes = &raw[4..8];
        if !kind_bytes.iter().all(|b| b.is_ascii_alphanumeric() || b" -_@\xa9".contains(b)) {
            return Ok(None);
        }
        let kind = fourcc(kind_bytes);

        let size32 = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let (mut size, header_size) = match size32 {
            0 => (end - offset, HEADER_SIZE),
            1 => {
                let large = self.source.read_chunk(8, offset + HEADER_SIZE)?;
                if large.len() < 8 {
                    return Ok(None);
                }
                (be_u64(&large), LARGE_HEADER_SIZE)
            }
            n => (u64::from(n), HEADER_SIZE),
        };
        if size < header_size {
            return Ok(None);
        }
        if size > end - offset {
            self.truncated = true;
            size = end - offset;
        }
        Ok(Some(BoxHeader {
            kind,
            size,
            header_size,
        }))
    }

    fn detail(&mut self, kind: &str, payload: u64, end: u64) -> Result<Option<String>> {
        let available = end.saturating_sub(payload);
        if kind == "covr" {
            return Ok(Some(format!("cover art, {available} bytes")));
        }
        if !matches!(kind, "ftyp" | "mvhd" | "hdlr") {
            return Ok(None);
        }
        let b = self
            .source
            .read_chunk(available.min(DETAIL_READ_LIMIT), payload)?;
        Ok(match kind {
            "ftyp" if b.len() >= 8 => {
                let compatible: Vec<String> = b[8..].chunks_exact(4).map(fourcc).collect();
                Some(format!(
                    "{} v{} [{}]",
                    fourcc(&b[0..4]),
                    be_u32(&b[4..8]),
                    compatible.join(", ")
                ))
            }
            "mvhd" => movie_header(&b),
            "hdlr" if b.len() >= 12 => Some(format!("handler {}", fourcc(&b[8..12]))),
            _ => None,
        })
    }
}

fn movie_header(b: &[u8]) -> Option<String> {
    let (timescale, duration) = match *b.first()? {
        0 if b.len() >= 20 => (be_u32(&b[12..16]), u64::from(be_u32(&b[16..20]))),
        1 if b.len() >= 32 => (be_u32(&b[20..24]), be_u64(&b[24..32])),
        _ => return None,
    };
    if timescale == 0 {
        return Some(format!("timescale 0, duration {duration}"));
    }
    Some(format!(
        "timescale {}, duration {} ({:.3}s)",
        timescale,
        duration,
        duration as f64 / f64::from(timescale)
    ))
}

fn fourcc(b: &[u8]) -> String {
    b.iter().map(|&c| char::from(c)).collect()
}

fn be_u32(b: &[u8]) -> u32 {
    b.iter().take(4).fold(0, |acc, &x| (acc << 8) | u32::from(x))
}

fn be_u64(b: &[u8]) -> u64 {
    b.iter().take(8).fold(0, |acc, &x| (acc << 8) | u64::from(x))
}
