//! 流量代理服务
//!
//! 提供 gRPC 服务端流，周期性推送模拟的会话流量计数。

use anyhow::Result;
use flow_agent::{FlowServiceImpl, FlowTable};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tonic::transport::Server;
use tracing::info;
use upf_proto::flow::flow_service_server::FlowServiceServer;
use upf_shared::config::AppConfig;
use upf_shared::observability;
use upf_shared::shutdown::shutdown_signal;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load("flow-agent").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    let _guard = observability::init("flow-agent", &config.observability).await?;

    info!("Starting flow-agent service...");

    let grpc_addr: SocketAddr = config.server_addr().parse()?;
    let interval = Duration::from_millis(config.flow.interval_ms.max(1));

    let table = FlowTable::with_example().with_max_flows(config.flow.max_flows);
    let service = FlowServiceImpl::new(Arc::new(table), interval);

    info!(
        interval_ms = config.flow.interval_ms,
        max_flows = config.flow.max_flows,
        "gRPC server listening on {}",
        grpc_addr
    );

    Server::builder()
        .add_service(FlowServiceServer::new(service))
        .serve_with_shutdown(grpc_addr, shutdown_signal())
        .await?;

    info!("Service shutdown complete");
    Ok(())
}
