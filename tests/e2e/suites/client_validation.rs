//! 客户端侧校验测试套件
//!
//! IMSI 代理和规则代理作为远程存储，解析与判定在本地完成。

use crate::setup::TestEnvironment;
use rule_agent::client::{RemoteSessionStore, RemoteSubscriberDirectory};
use rule_agent::resolver::DEFAULT_READ_TIMEOUT;
use rule_agent::{Outcome, RuleResolver, TrafficClass, ValidationEngine, ValidationRequest};
use std::sync::Arc;

fn remote_engine(imsi_url: &str, rule_url: &str) -> ValidationEngine {
    ValidationEngine::new(RuleResolver::new(
        Arc::new(RemoteSubscriberDirectory::new(imsi_url).unwrap()),
        Arc::new(RemoteSessionStore::new(rule_url).unwrap()),
        DEFAULT_READ_TIMEOUT,
    ))
}

#[tokio::test]
async fn test_remote_validation_outcomes() {
    let env = TestEnvironment::setup().await.unwrap();
    let engine = remote_engine(&env.imsi_url, &env.rule_url);

    let cases = vec![
        ("IMSI1", "pdr3", "ims", Outcome::Correct, Some(TrafficClass::Ims)),
        ("IMSI1", "pdr2", "ims", Outcome::ClassMismatch, Some(TrafficClass::Internet)),
        ("IMSI1", "pdr9", "internet", Outcome::NotFound, None),
        ("IMSI404", "pdr1", "internet", Outcome::NotFound, None),
        ("IMSI1", "pdr1", "voice", Outcome::MissingField, None),
    ];

    for (imsi, pdr_id, dnn, outcome, found_in) in cases {
        let result = engine
            .validate(&ValidationRequest::new(imsi, pdr_id, dnn))
            .await;
        assert_eq!(result.outcome, outcome, "{imsi}/{pdr_id}/{dnn}");
        assert_eq!(result.found_in, found_in, "{imsi}/{pdr_id}/{dnn}");
    }
}

#[tokio::test]
async fn test_remote_resolution_matches_in_process() {
    let env = TestEnvironment::setup().await.unwrap();
    let engine = remote_engine(&env.imsi_url, &env.rule_url);

    let classified = engine.resolver().resolve_subscriber("IMSI1").await.unwrap();
    assert_eq!(classified.internet_pdrs, vec!["pdr1", "pdr2"]);
    assert_eq!(classified.ims_pdrs, vec!["pdr3", "pdr4"]);
    assert!(!classified.is_degraded());

    // 会话不存在与没有规则一样得到空集合
    let classified = engine.resolver().resolve_subscriber("IMSI3").await.unwrap();
    assert!(classified.is_empty());
}

#[tokio::test]
async fn test_rule_agent_down_is_unavailable() {
    let env = TestEnvironment::setup().await.unwrap();
    // 端口 1 上没有规则代理
    let engine = remote_engine(&env.imsi_url, "http://127.0.0.1:1");

    let result = engine
        .validate(&ValidationRequest::new("IMSI1", "pdr1", "internet"))
        .await;
    assert_eq!(result.outcome, Outcome::Unavailable);
    assert!(result.outcome.is_retryable());
}
