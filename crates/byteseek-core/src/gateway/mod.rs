//! Proxy gateway: a stateless forwarder at `/resources/proxy?url=<origin>`.
//!
//! The reader addresses every origin through this one endpoint. Requests are
//! sanitized on the way out (only `Range` and `User-Agent` survive; `Host` and
//! `Referer` are rewritten to the origin) and responses on the way back
//! (allow-listed headers only, neutral content type, CORS always attached).

mod handler;
mod headers;
mod response;
mod upstream;

pub use handler::query_param;
pub use headers::{
    apply_cors, filter_response_headers, neutralize, upstream_request_headers,
    CORS_ALLOW_HEADERS, CORS_ALLOW_METHODS, NEUTRAL_CONTENT_TYPE, REQUEST_ALLOW_LIST,
    RESPONSE_ALLOW_LIST,
};
pub use response::GatewayBody;
pub use upstream::{forward, UpstreamError, UpstreamHead, UpstreamRequest};

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::fetch::TransportOptions;

/// Settings shared by every connection.
#[derive(Debug, Clone, Default)]
pub struct GatewayOptions {
    /// Timeouts, redirect limit and user agent for upstream transfers.
    pub transport: TransportOptions,
}

pub struct Gateway {
    listener: TcpListener,
    options: Arc<GatewayOptions>,
}

impl Gateway {
    pub async fn bind(addr: SocketAddr, options: GatewayOptions) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("bind gateway listener on {addr}"))?;
        Ok(Self {
            listener,
            options: Arc::new(options),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until `shutdown` resolves. Connections already in
    /// flight are left to finish on their own tasks.
    pub async fn serve(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tracing::info!("gateway listening on http://{}", self.local_addr()?);
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!(%peer, "connection accepted");
                        serve_connection(stream, Arc::clone(&self.options));
                    }
                    Err(e) => tracing::warn!("failed to accept connection: {}", e),
                },
                () = &mut shutdown => {
                    tracing::info!("gateway shutting down");
                    return Ok(());
                }
            }
        }
    }
}

fn serve_connection(stream: tokio::net::TcpStream, options: Arc<GatewayOptions>) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let mut builder = http1::Builder::new();
        builder.keep_alive(true);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handler::handle(req, Arc::clone(&options))),
        );
        if let Err(e) = conn.await {
            tracing::debug!("connection error: {}", e);
        }
    });
}
