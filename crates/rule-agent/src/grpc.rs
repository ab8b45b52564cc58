//! gRPC 服务实现
//!
//! 实现 RuleAgentService：会话规则查询、订户规则分类、PDR 校验。

#![allow(clippy::result_large_err)]

use crate::models::{ClassifiedRuleSet, RuleBundle};
use crate::validation::{Outcome, ValidationEngine, ValidationRequest};
use std::time::Instant;
use tonic::{Request, Response, Status};
use tracing::{info, instrument};
use upf_proto::rule::rule_agent_service_server::RuleAgentService;
use upf_proto::rule::{
    ClassifiedRules, Farstruct, Pdrstruct, Qerstruct, ResolveSubscriberRequest, RuleReply,
    RuleRequest, Rulestruct, Urrstruct, ValidateReply, ValidateRequest,
    ValidationOutcome as ProtoOutcome,
};
use upf_shared::observability::metrics;

const SERVICE_NAME: &str = "RuleAgentService";

/// gRPC 服务实现
pub struct RuleAgentServiceImpl {
    engine: ValidationEngine,
}

impl RuleAgentServiceImpl {
    pub fn new(engine: ValidationEngine) -> Self {
        Self { engine }
    }

    /// 内部规则集合转换为线上结构，每个子结构都带上会话标识
    fn to_proto_rules(fseid: &str, bundle: RuleBundle) -> Rulestruct {
        Rulestruct {
            pdr: Some(Pdrstruct {
                pdr_id: bundle.pdr_ids,
                fseid: fseid.to_string(),
            }),
            far: Some(Farstruct {
                far_id: bundle.far_id.unwrap_or_default(),
                fseid: fseid.to_string(),
            }),
            qer: Some(Qerstruct {
                qer_id: bundle.qer_id.unwrap_or_default(),
                fseid: fseid.to_string(),
            }),
            urr: Some(Urrstruct {
                urr_id: bundle.urr_id.unwrap_or_default(),
                fseid: fseid.to_string(),
            }),
        }
    }

    fn to_proto_classified(classified: ClassifiedRuleSet) -> ClassifiedRules {
        ClassifiedRules {
            internet_pdrs: classified.internet_pdrs,
            ims_pdrs: classified.ims_pdrs,
            degraded_classes: classified
                .degraded
                .iter()
                .map(|c| c.as_str().to_string())
                .collect(),
        }
    }

    fn to_proto_outcome(outcome: Outcome) -> ProtoOutcome {
        match outcome {
            Outcome::Correct => ProtoOutcome::Correct,
            Outcome::ClassMismatch => ProtoOutcome::ClassMismatch,
            Outcome::NotFound => ProtoOutcome::NotFound,
            Outcome::MissingField => ProtoOutcome::MissingField,
            Outcome::Unavailable => ProtoOutcome::Unavailable,
        }
    }

    fn record<T>(method: &str, start: Instant, result: &Result<T, Status>) {
        let status = match result {
            Ok(_) => "ok".to_string(),
            Err(s) => format!("{:?}", s.code()),
        };
        metrics::record_grpc_request(SERVICE_NAME, method, &status, start.elapsed().as_secs_f64());
    }
}

#[tonic::async_trait]
impl RuleAgentService for RuleAgentServiceImpl {
    #[instrument(skip(self, request))]
    async fn get_rule(&self, request: Request<RuleRequest>) -> Result<Response<RuleReply>, Status> {
        let start = Instant::now();
        let fseid = request.into_inner().fseid;

        let result = match self.engine.resolver().resolve_session(&fseid).await {
            Ok(Some(bundle)) => Ok(Response::new(RuleReply {
                session: Some(Self::to_proto_rules(&fseid, bundle)),
            })),
            Ok(None) => Err(Status::not_found(format!("会话不存在: {fseid}"))),
            Err(e) => Err(e.into()),
        };

        Self::record("GetRule", start, &result);
        result
    }

    #[instrument(skip(self, request))]
    async fn resolve_subscriber(
        &self,
        request: Request<ResolveSubscriberRequest>,
    ) -> Result<Response<ClassifiedRules>, Status> {
        let start = Instant::now();
        let imsi = request.into_inner().imsi;

        let result = self
            .engine
            .resolver()
            .resolve_subscriber(&imsi)
            .await
            .map(|classified| Response::new(Self::to_proto_classified(classified)))
            .map_err(Status::from);

        Self::record("ResolveSubscriber", start, &result);
        result
    }

    #[instrument(skip(self, request))]
    async fn validate(
        &self,
        request: Request<ValidateRequest>,
    ) -> Result<Response<ValidateReply>, Status> {
        let start = Instant::now();
        let req = request.into_inner();

        let validation = self
            .engine
            .validate(&ValidationRequest::new(req.imsi, req.pdr_id, req.dnn))
            .await;

        let result = if validation.outcome == Outcome::Unavailable {
            Err(Status::unavailable(validation.message))
        } else {
            info!(outcome = %validation.outcome, "Validate 完成");
            Ok(Response::new(ValidateReply {
                outcome: Self::to_proto_outcome(validation.outcome) as i32,
                found_in: validation
                    .found_in
                    .map(|c| c.as_str().to_string())
                    .unwrap_or_default(),
                message: validation.message,
                classified: validation.classified.map(Self::to_proto_classified),
            }))
        };

        Self::record("Validate", start, &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::models::SubscriberSessions;
    use crate::resolver::{DEFAULT_READ_TIMEOUT, RuleResolver};
    use crate::store::{MockSessionStore, MockSubscriberDirectory, SnapshotStore};
    use std::sync::Arc;

    fn builtin_service() -> RuleAgentServiceImpl {
        let store = SnapshotStore::builtin().unwrap();
        RuleAgentServiceImpl::new(ValidationEngine::new(RuleResolver::new(
            Arc::new(store.clone()),
            Arc::new(store),
            DEFAULT_READ_TIMEOUT,
        )))
    }

    #[tokio::test]
    async fn test_get_rule() {
        let service = builtin_service();
        let reply = service
            .get_rule(Request::new(RuleRequest {
                fseid: "fseid1".to_string(),
            }))
            .await
            .unwrap()
            .into_inner();

        let session = reply.session.unwrap();
        let pdr = session.pdr.unwrap();
        assert_eq!(pdr.pdr_id, vec!["pdr1", "pdr2"]);
        assert_eq!(pdr.fseid, "fseid1");
        assert_eq!(session.far.unwrap().far_id, "far1");
        assert_eq!(session.qer.unwrap().qer_id, "qer1");
        assert_eq!(session.urr.unwrap().urr_id, "urr1");
    }

    #[tokio::test]
    async fn test_get_rule_errors() {
        let service = builtin_service();

        let status = service
            .get_rule(Request::new(RuleRequest {
                fseid: "unknown".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::NotFound);

        let status = service
            .get_rule(Request::new(RuleRequest {
                fseid: String::new(),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_resolve_subscriber() {
        let service = builtin_service();
        let reply = service
            .resolve_subscriber(Request::new(ResolveSubscriberRequest {
                imsi: "IMSI1".to_string(),
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(reply.internet_pdrs, vec!["pdr1", "pdr2"]);
        assert_eq!(reply.ims_pdrs, vec!["pdr3", "pdr4"]);
        assert!(reply.degraded_classes.is_empty());
    }

    #[tokio::test]
    async fn test_validate_outcomes() {
        let service = builtin_service();
        let cases = vec![
            ("IMSI1", "pdr3", "ims", ProtoOutcome::Correct, "ims"),
            ("IMSI1", "pdr3", "internet", ProtoOutcome::ClassMismatch, "ims"),
            ("IMSI1", "pdr9", "internet", ProtoOutcome::NotFound, ""),
            ("IMSI1", "", "internet", ProtoOutcome::MissingField, ""),
        ];

        for (imsi, pdr_id, dnn, expected, found_in) in cases {
            let reply = service
                .validate(Request::new(ValidateRequest {
                    imsi: imsi.to_string(),
                    pdr_id: pdr_id.to_string(),
                    dnn: dnn.to_string(),
                }))
                .await
                .unwrap()
                .into_inner();
            assert_eq!(reply.outcome, expected as i32, "{imsi}/{pdr_id}/{dnn}");
            assert_eq!(reply.found_in, found_in);
            assert_eq!(
                reply.classified.is_none(),
                expected == ProtoOutcome::MissingField
            );
        }
    }

    #[tokio::test]
    async fn test_validate_unavailable_is_status() {
        let mut directory = MockSubscriberDirectory::new();
        directory.expect_lookup().returning(|_| {
            Ok(Some(SubscriberSessions {
                internet: Some("f1".to_string()),
                ims: None,
            }))
        });
        let mut store = MockSessionStore::new();
        store
            .expect_get_rules()
            .returning(|_| Err(StoreError::Unavailable("down".to_string())));

        let service = RuleAgentServiceImpl::new(ValidationEngine::new(RuleResolver::new(
            Arc::new(directory),
            Arc::new(store),
            DEFAULT_READ_TIMEOUT,
        )));

        let status = service
            .validate(Request::new(ValidateRequest {
                imsi: "S1".to_string(),
                pdr_id: "p1".to_string(),
                dnn: "internet".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::Unavailable);
    }
}
