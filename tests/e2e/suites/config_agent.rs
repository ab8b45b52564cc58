//! 配置代理测试套件

use crate::setup::TestEnvironment;
use upf_proto::config::ConfigRequest;
use upf_proto::config::config_service_client::ConfigServiceClient;

#[tokio::test]
async fn test_get_config_reads_sample_file() {
    let env = TestEnvironment::setup().await.unwrap();
    let mut client = ConfigServiceClient::connect(env.config_url.clone())
        .await
        .unwrap();

    let config = client
        .get_config(ConfigRequest {})
        .await
        .unwrap()
        .into_inner()
        .config
        .unwrap();

    assert_eq!(config.mode, "dpdk");
    assert_eq!(config.workers, 1);
    assert_eq!(config.access.unwrap().ifname, "access");
    assert_eq!(config.core.unwrap().ifname, "core");
    assert_eq!(config.table_sizes.unwrap().pdr_lookup, 50000);
    assert!(config.enable_hb_timer);
    assert_eq!(config.qci_qos_config.len(), 2);
    assert_eq!(config.cpiface.unwrap().dnn, "internet");
}
