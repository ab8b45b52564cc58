//! IMSI 代理测试套件

use crate::setup::TestEnvironment;
use tonic::Code;
use upf_proto::subscriber::ImsiRequest;
use upf_proto::subscriber::subscriber_service_client::SubscriberServiceClient;

#[tokio::test]
async fn test_get_imsi() {
    let env = TestEnvironment::setup().await.unwrap();
    let mut client = SubscriberServiceClient::connect(env.imsi_url.clone())
        .await
        .unwrap();

    let reply = client
        .get_imsi(ImsiRequest {
            imsi: "IMSI2".to_string(),
        })
        .await
        .unwrap()
        .into_inner();

    assert_eq!(reply.imsi.len(), 1);
    assert_eq!(reply.imsi[0].internet, "fseid3");
    assert_eq!(reply.imsi[0].ims, "fseid4");
}

#[tokio::test]
async fn test_get_imsi_unknown_subscriber() {
    let env = TestEnvironment::setup().await.unwrap();
    let mut client = SubscriberServiceClient::connect(env.imsi_url.clone())
        .await
        .unwrap();

    let status = client
        .get_imsi(ImsiRequest {
            imsi: "IMSI404".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);
}
