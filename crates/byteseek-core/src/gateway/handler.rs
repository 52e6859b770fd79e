//! Per-request handling.
//!
//! Validating (path, method, `url` parameter) -> Forwarding (upstream request
//! with allow-listed headers) -> Streaming (filtered head, body piped
//! through). Any step may end in an error status; nothing outlives the request.

use std::convert::Infallible;
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};

use super::headers::{filter_response_headers, neutralize, upstream_request_headers};
use super::response::{self, GatewayBody};
use super::upstream::{self, UpstreamRequest};
use super::GatewayOptions;
use crate::fetch::{parse_http_url, FetchMethod, PROXY_PATH};

pub async fn handle(
    req: Request<Incoming>,
    options: Arc<GatewayOptions>,
) -> Result<Response<GatewayBody>, Infallible> {
    let method = req.method().clone();
    let resp = route(req, &options).await;
    tracing::info!(%method, status = resp.status().as_u16(), "proxy request");
    Ok(resp)
}

async fn route(req: Request<Incoming>, options: &GatewayOptions) -> Response<GatewayBody> {
    if req.uri().path() != PROXY_PATH {
        return response::text(StatusCode::NOT_FOUND, "not found");
    }

    let upstream_method = match *req.method() {
        Method::OPTIONS => return response::preflight(),
        Method::GET => FetchMethod::Get,
        Method::HEAD => FetchMethod::Head,
        _ => return response::method_not_allowed(),
    };

    let Some(raw) = query_param(req.uri().query(), "url").filter(|u| !u.trim().is_empty()) else {
        return response::text(StatusCode::BAD_REQUEST, "missing url parameter");
    };
    let Ok(url) = parse_http_url(&raw) else {
        return response::text(StatusCode::BAD_REQUEST, "invalid url parameter");
    };

    let request = UpstreamRequest {
        url,
        method: upstream_method,
        headers: upstream_request_headers(req.headers()),
    };
    tracing::debug!(upstream = %request.url, headers = ?request.headers, "forwarding");

    match upstream::forward(request, &options.transport).await {
        Ok((head, body)) => {
            let status = StatusCode::from_u16(head.status).unwrap_or(StatusCode::BAD_GATEWAY);
            let mut headers = filter_response_headers(&head.lines);
            neutralize(&mut headers);
            let body = (upstream_method == FetchMethod::Get).then_some(body);
            response::streamed(status, headers, body)
        }
        Err(e) => {
            tracing::warn!("upstream error: {}", e);
            response::text(StatusCode::BAD_GATEWAY, &format!("upstream error: {e}"))
        }
    }
}

/// First value of `name` in a query string, percent-decoded.
pub fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}
