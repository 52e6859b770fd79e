//! `byteseek serve` – run the proxy gateway.

use anyhow::Result;
use byteseek_core::config::ByteseekConfig;
use byteseek_core::fetch::PROXY_PATH;
use byteseek_core::gateway::{Gateway, GatewayOptions};
use std::net::SocketAddr;

pub async fn run_serve(cfg: &ByteseekConfig, listen: Option<SocketAddr>) -> Result<()> {
    let addr = listen.unwrap_or(cfg.gateway.listen);
    let options = GatewayOptions {
        transport: cfg.transport.options(),
    };
    let gateway = Gateway::bind(addr, options).await?;
    println!(
        "Gateway listening on http://{}{}?url=<origin URL>",
        gateway.local_addr()?,
        PROXY_PATH
    );
    gateway
        .serve(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}
