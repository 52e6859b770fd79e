//! Minimal HTTP/1.1 origin for integration tests.
//!
//! Serves a single static body on every path, except `/redirect` (302 to
//! `/media.bin`) and `/missing` (404). Responds to HEAD with Content-Length and
//! to GET with Range with 206 Partial Content. Every request's method, path and
//! header lines are recorded so tests can assert what reached the origin.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// How long a stalling response holds its connection.
const STALL: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// If false, HEAD returns 405 (simulates servers that block HEAD).
    pub head_allowed: bool,
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// If false, omit `Accept-Ranges: bytes` header even if ranges work.
    pub advertise_ranges: bool,
    /// Raw header lines (each ending in `\r\n`) added to every response.
    pub extra_headers: &'static str,
    /// Send only this many GET body bytes, then hold the connection open.
    pub stall_after: Option<usize>,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            head_allowed: true,
            support_ranges: true,
            advertise_ranges: true,
            extra_headers: "",
            stall_after: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// `Name: value` lines as received.
    pub headers: Vec<String>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|line| {
            let (n, v) = line.split_once(':')?;
            n.trim().eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }
}

pub struct RangeServer {
    base: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl RangeServer {
    /// Base URL without trailing slash, e.g. "http://127.0.0.1:12345".
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// GET requests only (probes and chunk reads).
    pub fn gets(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "GET")
            .collect()
    }
}

/// Starts a server in a background thread serving `body`. The server runs
/// until the process exits.
pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(body, RangeServerOptions::default())
}

/// Like `start` but allows customizing server behavior (HEAD blocked, ranges missing, etc.).
pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let recorded = Arc::clone(&recorded);
            thread::spawn(move || handle(stream, &body, opts, &recorded));
        }
    });
    RangeServer {
        base: format!("http://127.0.0.1:{}", port),
        requests,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    body: &[u8],
    opts: RangeServerOptions,
    recorded: &Mutex<Vec<RecordedRequest>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let parsed = parse_request(request);
    recorded.lock().unwrap().push(parsed.recorded.clone());
    let method = parsed.recorded.method.as_str();
    let total = body.len() as u64;
    let accept_ranges = if opts.advertise_ranges && opts.support_ranges {
        "Accept-Ranges: bytes\r\n"
    } else {
        ""
    };

    if parsed.recorded.path == "/redirect" {
        let _ = stream.write_all(
            b"HTTP/1.1 302 Found\r\nLocation: /media.bin\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }
    if parsed.recorded.path == "/missing" {
        let _ = stream.write_all(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot found",
        );
        return;
    }

    if method.eq_ignore_ascii_case("HEAD") {
        if !opts.head_allowed {
            let _ = stream.write_all(
                b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
            return;
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n{}{}Connection: close\r\n\r\n",
            total, accept_ranges, opts.extra_headers
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }
    if method.eq_ignore_ascii_case("GET") {
        let (status, content_range, slice) = match parsed.range {
            Some((start, end_incl)) if opts.support_ranges => {
                let end_incl = end_incl.min(total.saturating_sub(1));
                if start >= total || start > end_incl {
                    (
                        "416 Range Not Satisfiable",
                        Some(format!("bytes */{}", total)),
                        &body[0..0],
                    )
                } else {
                    let slice = &body[start as usize..=end_incl as usize];
                    (
                        "206 Partial Content",
                        Some(format!("bytes {}-{}/{}", start, end_incl, total)),
                        slice,
                    )
                }
            }
            _ => ("200 OK", None, body),
        };
        let content_range = content_range
            .map(|v| format!("Content-Range: {}\r\n", v))
            .unwrap_or_default();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\n{}{}{}Connection: close\r\n\r\n",
            status,
            slice.len(),
            content_range,
            accept_ranges,
            opts.extra_headers
        );
        let _ = stream.write_all(response.as_bytes());
        if let Some(sent) = opts.stall_after {
            let _ = stream.write_all(&slice[..sent.min(slice.len())]);
            let _ = stream.flush();
            thread::sleep(STALL);
            return;
        }
        let _ = stream.write_all(slice);
        return;
    }
    let _ = stream.write_all(
        b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    );
}

struct ParsedRequest {
    recorded: RecordedRequest,
    /// (start, end_inclusive) for `Range: bytes=X-Y`.
    range: Option<(u64, u64)>,
}

fn parse_request(request: &str) -> ParsedRequest {
    let mut lines = request.lines();
    let mut request_line = lines.next().unwrap_or("").split_whitespace();
    let method = request_line.next().unwrap_or("").to_string();
    let path = request_line.next().unwrap_or("/").to_string();
    let mut headers = Vec::new();
    let mut range = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        headers.push(line.to_string());
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                range = parse_range(value.trim());
            }
        }
    }
    ParsedRequest {
        recorded: RecordedRequest {
            method,
            path,
            headers,
        },
        range,
    }
}

fn parse_range(value: &str) -> Option<(u64, u64)> {
    let part = value.strip_prefix("bytes=")?.trim();
    let (a, b) = part.split_once('-')?;
    let start = a.trim().parse::<u64>().ok()?;
    let end = b.trim();
    let end_incl = if end.is_empty() {
        u64::MAX
    } else {
        end.parse::<u64>().ok()?
    };
    Some((start, end_incl))
}
