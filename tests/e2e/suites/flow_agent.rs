//! 流量代理测试套件

use crate::setup::TestEnvironment;
use tonic::Code;
use upf_proto::flow::FlowRequest;
use upf_proto::flow::flow_service_client::FlowServiceClient;

#[tokio::test]
async fn test_stream_flow_accumulates() {
    let env = TestEnvironment::setup().await.unwrap();
    let mut client = FlowServiceClient::connect(env.flow_url.clone())
        .await
        .unwrap();

    let mut stream = client
        .stream_flow(FlowRequest {
            fseid: "exampleFSEID".to_string(),
        })
        .await
        .unwrap()
        .into_inner();

    let mut previous_rx = 100;
    for expected_count in 1..=3u64 {
        let reply = stream.message().await.unwrap().unwrap();
        assert_eq!(reply.count, expected_count);
        assert!(reply.rx_packet >= previous_rx);
        assert_eq!(reply.total_packets, reply.rx_packet + reply.tx_packet);
        assert_eq!(reply.total_speed, reply.rx_speed + reply.tx_speed);
        assert_eq!(reply.all_imsi, vec!["IMSI1", "IMSI2", "IMSI3"]);
        previous_rx = reply.rx_packet;
    }
}

#[tokio::test]
async fn test_each_stream_counts_from_one() {
    let env = TestEnvironment::setup().await.unwrap();
    let mut client = FlowServiceClient::connect(env.flow_url.clone())
        .await
        .unwrap();

    for _ in 0..2 {
        let mut stream = client
            .stream_flow(FlowRequest {
                fseid: "fresh-flow".to_string(),
            })
            .await
            .unwrap()
            .into_inner();
        let reply = stream.message().await.unwrap().unwrap();
        assert_eq!(reply.count, 1);
    }
}

#[tokio::test]
async fn test_stream_flow_requires_fseid() {
    let env = TestEnvironment::setup().await.unwrap();
    let mut client = FlowServiceClient::connect(env.flow_url.clone())
        .await
        .unwrap();

    let status = client
        .stream_flow(FlowRequest {
            fseid: String::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
}
