//! gRPC 服务实现
//!
//! StreamFlow 为每个请求启动一个推送任务：按间隔累加计数器并发送，
//! 客户端断开后发送失败或通道关闭，任务随之退出。

use crate::counters::FlowTable;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status};
use tracing::{debug, info, instrument, warn};
use upf_proto::flow::flow_service_server::FlowService;
use upf_proto::flow::{FlowReply, FlowRequest};
use upf_shared::observability::metrics;

/// 推送通道缓冲，客户端消费慢时最多积压的条数
const STREAM_BUFFER: usize = 4;

pub struct FlowServiceImpl {
    table: Arc<FlowTable>,
    interval: Duration,
}

impl FlowServiceImpl {
    pub fn new(table: Arc<FlowTable>, interval: Duration) -> Self {
        Self { table, interval }
    }
}

#[tonic::async_trait]
impl FlowService for FlowServiceImpl {
    type StreamFlowStream = ReceiverStream<Result<FlowReply, Status>>;

    #[instrument(skip(self, request))]
    async fn stream_flow(
        &self,
        request: Request<FlowRequest>,
    ) -> Result<Response<Self::StreamFlowStream>, Status> {
        let fseid = request.into_inner().fseid;
        if fseid.is_empty() {
            return Err(Status::invalid_argument("fseid 不能为空"));
        }
        if !self.table.admits(&fseid) {
            warn!(fseid = %fseid, flows = self.table.len(), "计数表已满，拒绝新会话");
            return Err(Status::resource_exhausted("流量会话数已达上限"));
        }

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let table = self.table.clone();
        let period = self.interval;

        info!(fseid = %fseid, interval_ms = period.as_millis() as u64, "开始推送流量计数");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            let mut count: u64 = 0;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = tx.closed() => break,
                }

                let Some(counters) = table.advance(&fseid) else {
                    // 接受请求后表被其他流占满
                    let _ = tx
                        .send(Err(Status::resource_exhausted("流量会话数已达上限")))
                        .await;
                    break;
                };
                count += 1;
                metrics::record_flow_update();

                let reply = counters.to_reply(table.all_imsi(), count);
                if tx.send(Ok(reply)).await.is_err() {
                    break;
                }
                debug!(
                    fseid = %fseid,
                    rx = counters.rx_packet,
                    tx = counters.tx_packet,
                    total = counters.total_packets(),
                    "已推送"
                );
            }

            info!(fseid = %fseid, sent = count, "客户端断开，停止推送");
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::EXAMPLE_FSEID;
    use tokio_stream::StreamExt;

    fn service(table: Arc<FlowTable>) -> FlowServiceImpl {
        FlowServiceImpl::new(table, Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_stream_counts_and_accumulates() {
        let table = Arc::new(FlowTable::with_example());
        let mut stream = service(table.clone())
            .stream_flow(Request::new(FlowRequest {
                fseid: EXAMPLE_FSEID.to_string(),
            }))
            .await
            .unwrap()
            .into_inner();

        let first = stream.next().await.unwrap().unwrap();
        let second = stream.next().await.unwrap().unwrap();

        assert_eq!(first.count, 1);
        assert_eq!(second.count, 2);
        assert!(first.rx_packet >= 100);
        assert!(second.rx_packet >= first.rx_packet);
        assert_eq!(second.total_packets, second.rx_packet + second.tx_packet);
        assert_eq!(second.total_speed, second.rx_speed + second.tx_speed);
        assert_eq!(second.all_imsi, vec!["IMSI1", "IMSI2", "IMSI3"]);
    }

    #[tokio::test]
    async fn test_stream_stops_when_client_drops() {
        let table = Arc::new(FlowTable::new(vec![]));
        let mut stream = service(table.clone())
            .stream_flow(Request::new(FlowRequest {
                fseid: "fseid1".to_string(),
            }))
            .await
            .unwrap()
            .into_inner();

        stream.next().await.unwrap().unwrap();
        drop(stream);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let after_drop = table.get("fseid1").unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(table.get("fseid1").unwrap(), after_drop);
    }

    #[tokio::test]
    async fn test_new_flow_rejected_when_table_full() {
        let table = Arc::new(FlowTable::with_example().with_max_flows(1));
        let status = service(table.clone())
            .stream_flow(Request::new(FlowRequest {
                fseid: "fseid-new".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::ResourceExhausted);
        assert_eq!(table.len(), 1);

        // 已有会话不受影响
        let mut stream = service(table)
            .stream_flow(Request::new(FlowRequest {
                fseid: EXAMPLE_FSEID.to_string(),
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(stream.next().await.unwrap().unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_empty_fseid_is_invalid() {
        let status = service(Arc::new(FlowTable::new(vec![])))
            .stream_flow(Request::new(FlowRequest {
                fseid: String::new(),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }
}
