//! Header allow-lists for both directions, and CORS.

use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Upstream response headers copied to the client. Everything else is dropped.
pub const RESPONSE_ALLOW_LIST: [&str; 5] = [
    "content-length",
    "content-range",
    "accept-ranges",
    "last-modified",
    "etag",
];

/// Inbound request headers forwarded upstream. `Cookie` and `Origin` never are.
pub const REQUEST_ALLOW_LIST: [&str; 2] = ["range", "user-agent"];

pub const NEUTRAL_CONTENT_TYPE: &str = "application/octet-stream";

pub const CORS_ALLOW_METHODS: &str = "GET, HEAD, OPTIONS";
pub const CORS_ALLOW_HEADERS: &str = "Range, Content-Type, User-Agent";

/// Header lines (`Name: value`) for the upstream request.
pub fn upstream_request_headers(incoming: &HeaderMap) -> Vec<String> {
    REQUEST_ALLOW_LIST
        .iter()
        .filter_map(|name| {
            let value = incoming.get(*name)?.to_str().ok()?.trim();
            if value.is_empty() {
                return None;
            }
            Some(format!("{}: {}", canonical(name), value))
        })
        .collect()
}

fn canonical(name: &str) -> &'static str {
    match name {
        "range" => "Range",
        "user-agent" => "User-Agent",
        _ => "X-Unknown",
    }
}

/// Allow-listed headers from an upstream response block (`HTTP/...` line first).
pub fn filter_response_headers(lines: &[String]) -> HeaderMap {
    let mut out = HeaderMap::new();
    for line in lines.iter().skip(1) {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        if !RESPONSE_ALLOW_LIST.contains(&name.as_str()) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value.trim()),
        ) {
            out.insert(name, value);
        }
    }
    out
}

/// Forces the neutral content type and removes `Content-Disposition`, so the
/// stream is never treated as a file download by browser tooling.
pub fn neutralize(headers: &mut HeaderMap) {
    headers.remove(header::CONTENT_DISPOSITION);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(NEUTRAL_CONTENT_TYPE),
    );
}

pub fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
    if let Ok(exposed) = HeaderValue::from_str(&RESPONSE_ALLOW_LIST.join(", ")) {
        headers.insert(header::ACCESS_CONTROL_EXPOSE_HEADERS, exposed);
    }
}
