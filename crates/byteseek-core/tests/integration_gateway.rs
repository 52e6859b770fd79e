//! Integration test: the proxy gateway in front of a local origin.
//!
//! Drives the gateway with plain libcurl requests and checks what reaches the
//! origin and what comes back to the caller.

mod common;

use common::range_server::{self, RangeServerOptions};
use common::{closed_port_url, proxied, request, start_gateway, test_body};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn preflight_is_answered_without_upstream_call() {
    let origin = range_server::start(test_body(1024));
    let gateway = start_gateway().await;

    let resp = request("OPTIONS", proxied(&gateway, &origin.url("/media.bin")), &[]).await;
    assert_eq!(resp.status, 204);
    assert!(resp.body.is_empty());
    assert_eq!(resp.header("access-control-allow-origin"), Some("*"));
    assert_eq!(
        resp.header("access-control-allow-methods"),
        Some("GET, HEAD, OPTIONS")
    );
    assert_eq!(
        resp.header("access-control-allow-headers"),
        Some("Range, Content-Type, User-Agent")
    );
    assert_eq!(origin.request_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_or_invalid_url_is_rejected() {
    let gateway = start_gateway().await;

    let resp = request("GET", format!("{}/resources/proxy", gateway), &[]).await;
    assert_eq!(resp.status, 400);
    assert_eq!(resp.header("access-control-allow-origin"), Some("*"));

    let resp = request("GET", format!("{}/resources/proxy?url=", gateway), &[]).await;
    assert_eq!(resp.status, 400);

    let resp = request("GET", proxied(&gateway, "ftp://files.example.com/a.bin"), &[]).await;
    assert_eq!(resp.status, 400);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn other_paths_and_methods() {
    let origin = range_server::start(test_body(64));
    let gateway = start_gateway().await;

    let resp = request("GET", format!("{}/elsewhere", gateway), &[]).await;
    assert_eq!(resp.status, 404);

    let resp = request("POST", proxied(&gateway, &origin.url("/media.bin")), &[]).await;
    assert_eq!(resp.status, 405);
    assert_eq!(origin.request_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn ranged_get_is_forwarded_and_sanitized() {
    let body = test_body(64 * 1024);
    let origin = range_server::start_with_options(
        body.clone(),
        RangeServerOptions {
            extra_headers: "Content-Type: video/mp4\r\n\
                            Content-Disposition: attachment; filename=\"clip.mp4\"\r\n\
                            Set-Cookie: tracking=1\r\n\
                            ETag: \"v1\"\r\n",
            ..RangeServerOptions::default()
        },
    );
    let gateway = start_gateway().await;

    let resp = request(
        "GET",
        proxied(&gateway, &origin.url("/media.bin")),
        &[
            "Range: bytes=100-199",
            "Cookie: session=secret",
            "Origin: https://app.example",
        ],
    )
    .await;

    assert_eq!(resp.status, 206);
    assert_eq!(resp.body, &body[100..200]);
    assert_eq!(resp.header("content-range"), Some("bytes 100-199/65536"));
    assert_eq!(resp.header("content-type"), Some("application/octet-stream"));
    assert_eq!(resp.header("etag"), Some("\"v1\""));
    assert_eq!(resp.header("accept-ranges"), Some("bytes"));
    assert!(resp.header("content-disposition").is_none());
    assert!(resp.header("set-cookie").is_none());
    assert_eq!(resp.header("access-control-allow-origin"), Some("*"));
    assert!(resp
        .header("access-control-expose-headers")
        .is_some_and(|v| v.contains("content-range")));

    let seen = origin.requests();
    assert_eq!(seen.len(), 1);
    let upstream = &seen[0];
    assert_eq!(upstream.method, "GET");
    assert_eq!(upstream.path, "/media.bin");
    assert_eq!(upstream.header("range"), Some("bytes=100-199"));
    assert!(upstream.header("cookie").is_none());
    assert!(upstream.header("origin").is_none());
    assert_eq!(upstream.header("host"), Some(&origin.base()["http://".len()..]));
    assert_eq!(
        upstream.header("referer"),
        Some(format!("{}/", origin.base()).as_str())
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn head_passes_length_through() {
    let origin = range_server::start(test_body(5000));
    let gateway = start_gateway().await;

    let resp = request("HEAD", proxied(&gateway, &origin.url("/media.bin")), &[]).await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("content-length"), Some("5000"));
    assert!(resp.body.is_empty());
    assert_eq!(origin.requests()[0].method, "HEAD");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn redirects_are_followed() {
    let body = test_body(2048);
    let origin = range_server::start(body.clone());
    let gateway = start_gateway().await;

    let resp = request(
        "GET",
        proxied(&gateway, &origin.url("/redirect")),
        &["Range: bytes=0-9"],
    )
    .await;
    assert_eq!(resp.status, 206);
    assert_eq!(resp.body, &body[..10]);
    let paths: Vec<String> = origin.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["/redirect".to_string(), "/media.bin".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn upstream_error_status_passes_through() {
    let origin = range_server::start(test_body(16));
    let gateway = start_gateway().await;

    let resp = request("GET", proxied(&gateway, &origin.url("/missing")), &[]).await;
    assert_eq!(resp.status, 404);
    assert_eq!(resp.header("content-type"), Some("application/octet-stream"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_upstream_is_502() {
    let gateway = start_gateway().await;

    let resp = request("GET", proxied(&gateway, &closed_port_url()), &["Range: bytes=0-0"]).await;
    assert_eq!(resp.status, 502);
    assert_eq!(resp.header("access-control-allow-origin"), Some("*"));
    assert!(String::from_utf8_lossy(&resp.body).starts_with("upstream error:"));
}
