//! gRPC 服务实现

#![allow(clippy::result_large_err)]

use rule_agent::{StoreError, SubscriberDirectory};
use std::sync::Arc;
use std::time::Instant;
use tonic::{Request, Response, Status};
use tracing::{debug, instrument};
use upf_proto::subscriber::subscriber_service_server::SubscriberService;
use upf_proto::subscriber::{ImsiReply, ImsiRequest, ImsiStruct};
use upf_shared::observability::metrics;

/// 订户目录服务
pub struct SubscriberServiceImpl {
    directory: Arc<dyn SubscriberDirectory>,
}

impl SubscriberServiceImpl {
    pub fn new(directory: Arc<dyn SubscriberDirectory>) -> Self {
        Self { directory }
    }

    async fn lookup(&self, imsi: &str) -> Result<ImsiReply, Status> {
        if imsi.is_empty() {
            return Err(Status::invalid_argument("imsi 不能为空"));
        }

        let sessions = self.directory.lookup(imsi).await.map_err(|e| match e {
            StoreError::Unavailable(msg) => Status::unavailable(msg),
            timeout @ StoreError::Timeout { .. } => Status::deadline_exceeded(timeout.to_string()),
        })?;

        let Some(sessions) = sessions else {
            return Err(Status::not_found(format!("订户不存在: {imsi}")));
        };

        debug!(imsi, "GetImsi 命中");
        Ok(ImsiReply {
            imsi: vec![ImsiStruct {
                internet: sessions.internet.unwrap_or_default(),
                ims: sessions.ims.unwrap_or_default(),
            }],
        })
    }
}

#[tonic::async_trait]
impl SubscriberService for SubscriberServiceImpl {
    #[instrument(skip(self, request))]
    async fn get_imsi(&self, request: Request<ImsiRequest>) -> Result<Response<ImsiReply>, Status> {
        let start = Instant::now();
        let imsi = request.into_inner().imsi;

        let result = self.lookup(&imsi).await.map(Response::new);

        let status = match &result {
            Ok(_) => "ok".to_string(),
            Err(s) => format!("{:?}", s.code()),
        };
        metrics::record_grpc_request(
            "SubscriberService",
            "GetImsi",
            &status,
            start.elapsed().as_secs_f64(),
        );
        result
    }
}
