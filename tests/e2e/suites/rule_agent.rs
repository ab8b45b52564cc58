//! 规则代理测试套件

use crate::setup::TestEnvironment;
use tonic::Code;
use upf_proto::rule::rule_agent_service_client::RuleAgentServiceClient;
use upf_proto::rule::{ResolveSubscriberRequest, RuleRequest, ValidateRequest, ValidationOutcome};

#[tokio::test]
async fn test_get_rule_returns_active_rules() {
    let env = TestEnvironment::setup().await.unwrap();
    let mut client = RuleAgentServiceClient::connect(env.rule_url.clone())
        .await
        .unwrap();

    let session = client
        .get_rule(RuleRequest {
            fseid: "fseid2".to_string(),
        })
        .await
        .unwrap()
        .into_inner()
        .session
        .unwrap();

    let pdr = session.pdr.unwrap();
    assert_eq!(pdr.pdr_id, vec!["pdr3", "pdr4"]);
    assert_eq!(pdr.fseid, "fseid2");
    assert_eq!(session.far.unwrap().far_id, "far2");
}

#[tokio::test]
async fn test_get_rule_unknown_session_is_not_found() {
    let env = TestEnvironment::setup().await.unwrap();
    let mut client = RuleAgentServiceClient::connect(env.rule_url.clone())
        .await
        .unwrap();

    let status = client
        .get_rule(RuleRequest {
            fseid: "no-such-fseid".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);
}

#[tokio::test]
async fn test_resolve_subscriber_classifies_pdrs() {
    let env = TestEnvironment::setup().await.unwrap();
    let mut client = RuleAgentServiceClient::connect(env.rule_url.clone())
        .await
        .unwrap();

    let classified = client
        .resolve_subscriber(ResolveSubscriberRequest {
            imsi: "IMSI1".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(classified.internet_pdrs, vec!["pdr1", "pdr2"]);
    assert_eq!(classified.ims_pdrs, vec!["pdr3", "pdr4"]);

    // 未知订户得到空集合
    let classified = client
        .resolve_subscriber(ResolveSubscriberRequest {
            imsi: "IMSI404".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert!(classified.internet_pdrs.is_empty());
    assert!(classified.ims_pdrs.is_empty());
}

#[tokio::test]
async fn test_validate_over_grpc() {
    let env = TestEnvironment::setup().await.unwrap();
    let mut client = RuleAgentServiceClient::connect(env.rule_url.clone())
        .await
        .unwrap();

    let reply = client
        .validate(ValidateRequest {
            imsi: "IMSI1".to_string(),
            pdr_id: "pdr1".to_string(),
            dnn: "ims".to_string(),
        })
        .await
        .unwrap()
        .into_inner();

    assert_eq!(reply.outcome, ValidationOutcome::ClassMismatch as i32);
    assert_eq!(reply.found_in, "internet");
    assert!(reply.classified.is_some());
}
