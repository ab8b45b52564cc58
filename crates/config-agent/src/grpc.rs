//! gRPC 服务实现

#![allow(clippy::result_large_err)]

use crate::upf_config::UpfConfig;
use std::path::PathBuf;
use std::time::Instant;
use tonic::{Request, Response, Status};
use tracing::{error, info, instrument};
use upf_proto::config::config_service_server::ConfigService;
use upf_proto::config::{ConfigReply, ConfigRequest};
use upf_shared::observability::metrics;

pub struct ConfigServiceImpl {
    path: PathBuf,
}

impl ConfigServiceImpl {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[tonic::async_trait]
impl ConfigService for ConfigServiceImpl {
    #[instrument(skip(self, _request))]
    async fn get_config(
        &self,
        _request: Request<ConfigRequest>,
    ) -> Result<Response<ConfigReply>, Status> {
        let start = Instant::now();

        // 文件读取是阻塞 IO
        let path = self.path.clone();
        let loaded = tokio::task::spawn_blocking(move || UpfConfig::load(path))
            .await
            .map_err(|e| Status::internal(format!("配置加载任务失败: {e}")))?;

        let result = match loaded {
            Ok(config) => {
                info!(mode = %config.mode, "GetConfig 完成");
                Ok(Response::new(ConfigReply {
                    config: Some(config.into()),
                }))
            }
            Err(e) => {
                error!(error = %e, "GetConfig 失败");
                Err(Status::from(e))
            }
        };

        let status = match &result {
            Ok(_) => "ok".to_string(),
            Err(s) => format!("{:?}", s.code()),
        };
        metrics::record_grpc_request(
            "ConfigService",
            "GetConfig",
            &status,
            start.elapsed().as_secs_f64(),
        );
        result
    }
}
