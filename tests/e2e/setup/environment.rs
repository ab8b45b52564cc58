//! 测试环境管理

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;

use config_agent::ConfigServiceImpl;
use flow_agent::{FlowServiceImpl, FlowTable};
use imsi_agent::SubscriberServiceImpl;
use rule_agent::resolver::DEFAULT_READ_TIMEOUT;
use rule_agent::{RuleAgentServiceImpl, RuleResolver, SnapshotStore, ValidationEngine};
use upf_proto::config::config_service_server::ConfigServiceServer;
use upf_proto::flow::flow_service_server::FlowServiceServer;
use upf_proto::rule::rule_agent_service_server::RuleAgentServiceServer;
use upf_proto::subscriber::subscriber_service_server::SubscriberServiceServer;

/// 测试用的推送间隔
pub const FLOW_INTERVAL: Duration = Duration::from_millis(20);

/// 进程内服务集合，Drop 时停止所有服务
pub struct TestEnvironment {
    pub rule_url: String,
    pub imsi_url: String,
    pub flow_url: String,
    pub config_url: String,
    servers: Vec<JoinHandle<()>>,
}

/// 绑定临时端口
async fn bind() -> Result<(TcpListener, String)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let url = format!("http://{}", listener.local_addr()?);
    Ok((listener, url))
}

/// 仓库中的示例 UPF 配置
pub fn sample_upf_config() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/upf.jsonc")
}

impl TestEnvironment {
    /// 使用内置种子启动全部代理
    pub async fn setup() -> Result<Self> {
        Self::with_store(SnapshotStore::builtin()?).await
    }

    /// 规则代理与 IMSI 代理共用同一份快照
    pub async fn with_store(store: SnapshotStore) -> Result<Self> {
        let mut servers = Vec::new();

        let (listener, rule_url) = bind().await?;
        let engine = ValidationEngine::new(RuleResolver::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            DEFAULT_READ_TIMEOUT,
        ));
        let rule_service = RuleAgentServiceServer::new(RuleAgentServiceImpl::new(engine));
        servers.push(tokio::spawn(async move {
            let _ = Server::builder()
                .add_service(rule_service)
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await;
        }));

        let (listener, imsi_url) = bind().await?;
        let imsi_service = SubscriberServiceServer::new(SubscriberServiceImpl::new(Arc::new(store)));
        servers.push(tokio::spawn(async move {
            let _ = Server::builder()
                .add_service(imsi_service)
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await;
        }));

        let (listener, flow_url) = bind().await?;
        let flow_service = FlowServiceServer::new(FlowServiceImpl::new(
            Arc::new(FlowTable::with_example()),
            FLOW_INTERVAL,
        ));
        servers.push(tokio::spawn(async move {
            let _ = Server::builder()
                .add_service(flow_service)
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await;
        }));

        let (listener, config_url) = bind().await?;
        let config_service = ConfigServiceServer::new(ConfigServiceImpl::new(sample_upf_config()));
        servers.push(tokio::spawn(async move {
            let _ = Server::builder()
                .add_service(config_service)
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await;
        }));

        Ok(Self {
            rule_url,
            imsi_url,
            flow_url,
            config_url,
            servers,
        })
    }
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        for server in &self.servers {
            server.abort();
        }
    }
}
