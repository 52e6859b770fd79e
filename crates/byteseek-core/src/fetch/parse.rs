//! Parse HTTP response header lines into `ResponseHeaders`.

/// Headers of the final response that matter for size and range handling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    /// `Content-Length`, if present and numeric.
    pub content_length: Option<u64>,
    /// `a` from `Content-Range: bytes a-b/TOTAL`.
    pub content_range_start: Option<u64>,
    /// `TOTAL` from `Content-Range: bytes a-b/TOTAL` or `bytes */TOTAL`.
    pub content_range_total: Option<u64>,
    /// True if the server sent `Accept-Ranges: bytes`.
    pub accept_ranges: bool,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

/// Status code from a status line such as `HTTP/1.1 206 Partial Content`.
pub fn parse_status_line(line: &str) -> Option<u32> {
    let mut parts = line.split_whitespace();
    let proto = parts.next()?;
    if !proto.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}

fn content_range_spec(value: &str) -> Option<&str> {
    let value = value.trim();
    value
        .get(..6)
        .filter(|unit| unit.eq_ignore_ascii_case("bytes "))
        .map(|_| &value[6..])
}

/// Total length from a `Content-Range` value; `None` for `bytes a-b/*`.
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = content_range_spec(value)?.rsplit_once('/')?;
    total.trim().parse().ok()
}

/// First byte position from a `Content-Range` value; `None` for `bytes */T`.
pub fn parse_content_range_start(value: &str) -> Option<u64> {
    let (range, _) = content_range_spec(value)?.split_once('/')?;
    let (start, _) = range.split_once('-')?;
    start.trim().parse().ok()
}

/// Parse collected header lines (one response block) into `ResponseHeaders`.
pub fn parse_headers(lines: &[String]) -> ResponseHeaders {
    let mut out = ResponseHeaders::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                if let Ok(n) = value.parse::<u64>() {
                    out.content_length = Some(n);
                }
            }
            if name.eq_ignore_ascii_case("content-range") {
                out.content_range_start = parse_content_range_start(value);
                out.content_range_total = parse_content_range_total(value);
            }
            if name.eq_ignore_ascii_case("accept-ranges") {
                out.accept_ranges = value.eq_ignore_ascii_case("bytes");
            }
            if name.eq_ignore_ascii_case("etag") {
                out.etag = Some(value.trim_matches('"').to_string());
            }
            if name.eq_ignore_ascii_case("last-modified") {
                out.last_modified = Some(value.to_string());
            }
        }
    }

    out
}
