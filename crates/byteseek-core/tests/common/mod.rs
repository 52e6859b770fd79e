#![allow(dead_code)]

pub mod range_server;

use std::time::Duration;

use byteseek_core::fetch::TransportOptions;
use byteseek_core::gateway::{Gateway, GatewayOptions};

pub fn test_body(len: usize) -> Vec<u8> {
    (0u8..=250).cycle().take(len).collect()
}

pub fn test_transport() -> TransportOptions {
    TransportOptions {
        connect_timeout: Duration::from_secs(2),
        response_timeout: Duration::from_secs(5),
        ..TransportOptions::default()
    }
}

/// Starts a gateway on an ephemeral port; it runs until the test runtime
/// shuts down. Returns its base URL.
pub async fn start_gateway() -> String {
    let options = GatewayOptions {
        transport: test_transport(),
    };
    let gateway = Gateway::bind("127.0.0.1:0".parse().unwrap(), options)
        .await
        .expect("bind gateway");
    let addr = gateway.local_addr().unwrap();
    tokio::spawn(gateway.serve(std::future::pending()));
    format!("http://{}", addr)
}

/// Gateway URL that proxies `target`.
pub fn proxied(gateway: &str, target: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
    format!("{}/resources/proxy?url={}", gateway, encoded)
}

/// A URL nothing listens on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/gone.bin", port)
}

#[derive(Debug)]
pub struct RawResponse {
    pub status: u32,
    pub headers: Vec<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|line| {
            let (n, v) = line.split_once(':')?;
            n.trim().eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }
}

/// Plain blocking request with libcurl; call from `spawn_blocking`.
pub fn raw_request(method: &str, url: &str, headers: &[&str]) -> RawResponse {
    let mut easy = curl::easy::Easy::new();
    easy.url(url).unwrap();
    match method {
        "GET" => easy.get(true).unwrap(),
        "HEAD" => easy.nobody(true).unwrap(),
        other => easy.custom_request(other).unwrap(),
    }
    let mut list = curl::easy::List::new();
    for h in headers {
        list.append(h).unwrap();
    }
    easy.http_headers(list).unwrap();
    easy.timeout(Duration::from_secs(20)).unwrap();

    let mut lines = Vec::new();
    let mut body = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = std::str::from_utf8(data) {
                    let line = s.trim_end();
                    if line.starts_with("HTTP/") {
                        lines.clear();
                    }
                    if !line.is_empty() {
                        lines.push(line.to_string());
                    }
                }
                true
            })
            .unwrap();
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .unwrap();
        transfer.perform().unwrap();
    }
    RawResponse {
        status: easy.response_code().unwrap(),
        headers: lines,
        body,
    }
}

/// `raw_request` on the blocking pool.
pub async fn request(method: &'static str, url: String, headers: &'static [&'static str]) -> RawResponse {
    tokio::task::spawn_blocking(move || raw_request(method, &url, headers))
        .await
        .unwrap()
}
