//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use tokio::net::TcpListener;
use tracing::{error, info};

/// 全局 Prometheus handle，用于渲染指标
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(service_name: &str, metrics_port: u16) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    let _ = PROMETHEUS_HANDLE.set(handle.clone());

    register_common_metrics(service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], metrics_port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

/// 注册通用指标描述，出现在 /metrics 的 HELP 注释中
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!("grpc_requests_total", "Total number of gRPC requests");
    metrics::describe_histogram!(
        "grpc_request_duration_seconds",
        "gRPC request duration in seconds"
    );

    metrics::describe_counter!(
        "validation_requests_total",
        "Total number of PDR validations by outcome"
    );
    metrics::describe_histogram!(
        "validation_duration_seconds",
        "PDR validation duration in seconds"
    );

    metrics::describe_counter!("store_reads_total", "Total number of store reads by result");
    metrics::describe_counter!("flow_updates_total", "Total number of flow counter updates sent");
    metrics::describe_counter!("seed_reloads_total", "Total number of seed reload attempts");

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

/// 获取全局 Prometheus handle（用于自定义渲染）
pub fn get_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .record(duration_secs);
}

/// 记录 gRPC 请求
#[inline]
pub fn record_grpc_request(service: &str, method: &str, status: &str, duration_secs: f64) {
    metrics::counter!(
        "grpc_requests_total",
        "service" => service.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "grpc_request_duration_seconds",
        "service" => service.to_string(),
        "method" => method.to_string()
    )
    .record(duration_secs);
}

/// 记录一次 PDR 校验
#[inline]
pub fn record_validation(outcome: &str, duration_secs: f64) {
    metrics::counter!("validation_requests_total", "outcome" => outcome.to_string()).increment(1);
    metrics::histogram!("validation_duration_seconds").record(duration_secs);
}

/// 记录一次存储读取（store: directory/session，result: hit/miss/unavailable）
#[inline]
pub fn record_store_read(store: &'static str, result: &'static str) {
    metrics::counter!("store_reads_total", "store" => store, "result" => result).increment(1);
}

/// 记录一次流量计数推送，进程级计数，不按会话打标签
#[inline]
pub fn record_flow_update() {
    metrics::counter!("flow_updates_total").increment(1);
}

/// 记录一次种子热加载
#[inline]
pub fn record_seed_reload(status: &'static str) {
    metrics::counter!("seed_reloads_total", "status" => status).increment(1);
}
