//! Request addressing: straight to the origin, or through the proxy gateway.

use url::Url;

use crate::error::{ByteSourceError, Result};

/// Path of the gateway's single forwarding endpoint.
pub const PROXY_PATH: &str = "/resources/proxy";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Talk to the origin directly.
    Direct,
    /// Forward every request through the gateway at this base URL.
    Gateway(Url),
}

impl Endpoint {
    /// Parses a gateway base URL such as `http://127.0.0.1:8787`. A path on the
    /// base (`http://host/app`) is kept as a mount prefix.
    pub fn gateway(base: &str) -> Result<Self> {
        parse_http_url(base).map(Endpoint::Gateway)
    }
}

/// The remote resource of one session together with how to reach it.
#[derive(Debug, Clone)]
pub struct Target {
    url: Url,
    endpoint: Endpoint,
}

impl Target {
    /// Validates `url` before any network activity.
    pub fn new(url: &str, endpoint: Endpoint) -> Result<Self> {
        Ok(Self {
            url: parse_http_url(url)?,
            endpoint,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn is_proxied(&self) -> bool {
        matches!(self.endpoint, Endpoint::Gateway(_))
    }

    /// URL to hand to the fetcher.
    pub fn request_url(&self) -> String {
        match &self.endpoint {
            Endpoint::Direct => self.url.to_string(),
            Endpoint::Gateway(base) => {
                let mut proxied = base.clone();
                let prefix = base.path().trim_end_matches('/');
                proxied.set_path(&format!("{prefix}{PROXY_PATH}"));
                proxied
                    .query_pairs_mut()
                    .clear()
                    .append_pair("url", self.url.as_str());
                proxied.to_string()
            }
        }
    }
}

/// Absolute `http` or `https` URL, or `InvalidUrl`.
pub fn parse_http_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|_| ByteSourceError::InvalidUrl(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.host().is_some() => Ok(url),
        _ => Err(ByteSourceError::InvalidUrl(raw.to_string())),
    }
}
