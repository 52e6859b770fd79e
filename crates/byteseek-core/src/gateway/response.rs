//! Response builders. Every response carries the CORS headers.

use std::convert::Infallible;

use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Response, StatusCode};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::headers::{apply_cors, CORS_ALLOW_METHODS};
use super::upstream::BodyChunk;

pub type GatewayBody = UnsyncBoxBody<Bytes, std::io::Error>;

fn never(e: Infallible) -> std::io::Error {
    match e {}
}

fn empty() -> GatewayBody {
    Empty::new().map_err(never).boxed_unsync()
}

fn with_cors(status: StatusCode, body: GatewayBody) -> Response<GatewayBody> {
    let mut resp = Response::new(body);
    *resp.status_mut() = status;
    apply_cors(resp.headers_mut());
    resp
}

/// Short plain-text answer for rejections and upstream failures.
pub fn text(status: StatusCode, message: &str) -> Response<GatewayBody> {
    let body = Full::new(Bytes::from(format!("{message}\n")))
        .map_err(never)
        .boxed_unsync();
    let mut resp = with_cors(status, body);
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    resp
}

/// Preflight answer: CORS headers only, empty body.
pub fn preflight() -> Response<GatewayBody> {
    let mut resp = with_cors(StatusCode::NO_CONTENT, empty());
    resp.headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(CORS_ALLOW_METHODS));
    resp.headers_mut().insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("86400"),
    );
    resp
}

pub fn method_not_allowed() -> Response<GatewayBody> {
    let mut resp = text(StatusCode::METHOD_NOT_ALLOWED, "method not allowed");
    resp.headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(CORS_ALLOW_METHODS));
    resp
}

/// Proxied upstream response; `headers` must already be filtered.
pub fn streamed(
    status: StatusCode,
    headers: HeaderMap,
    body: Option<mpsc::Receiver<BodyChunk>>,
) -> Response<GatewayBody> {
    let body = match body {
        Some(rx) => StreamBody::new(ReceiverStream::new(rx)).boxed_unsync(),
        None => empty(),
    };
    let mut resp = with_cors(status, body);
    resp.headers_mut().extend(headers);
    resp
}
