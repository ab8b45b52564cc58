//! PDR 校验
//!
//! 每个请求独立经过三个阶段：
//!
//! ```text
//! Received ──字段缺失──▶ MissingField（不访问存储）
//!    │
//!    ▼
//! Resolved ──存储不可用──▶ Unavailable
//!    │
//!    ▼
//! Decided: 声明类别命中 -> Correct
//!          另一类别命中 -> ClassMismatch
//!          都未命中     -> NotFound
//! ```
//!
//! 判定只依赖（分类结果, pdr_id, 类别），不修改任何存储。

use crate::error::ResolveError;
use crate::models::{ClassifiedRuleSet, TrafficClass};
use crate::resolver::RuleResolver;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use upf_shared::observability::metrics;

/// 校验结果类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Correct,
    ClassMismatch,
    NotFound,
    MissingField,
    Unavailable,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correct => "CORRECT",
            Self::ClassMismatch => "CLASS_MISMATCH",
            Self::NotFound => "NOT_FOUND",
            Self::MissingField => "MISSING_FIELD",
            Self::Unavailable => "UNAVAILABLE",
        }
    }

    /// 只有不可用值得调用方退避重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 请求处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStage {
    Received,
    Resolved,
    Decided,
}

/// 校验请求，字段使用线上名称
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationRequest {
    pub imsi: String,
    pub pdr_id: String,
    /// 声明的流量类别
    pub dnn: String,
}

impl ValidationRequest {
    pub fn new(imsi: impl Into<String>, pdr_id: impl Into<String>, dnn: impl Into<String>) -> Self {
        Self {
            imsi: imsi.into(),
            pdr_id: pdr_id.into(),
            dnn: dnn.into(),
        }
    }
}

/// 校验结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub outcome: Outcome,
    /// PDR 实际所在的类别
    pub found_in: Option<TrafficClass>,
    /// MissingField 时缺失或无效的字段
    pub missing_field: Option<&'static str>,
    /// MissingField 之外的结果都带分类集合
    pub classified: Option<ClassifiedRuleSet>,
    pub message: String,
}

impl ValidationResult {
    fn missing(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::MissingField,
            found_in: None,
            missing_field: Some(field),
            classified: None,
            message: message.into(),
        }
    }

    fn unavailable(reason: String) -> Self {
        Self {
            outcome: Outcome::Unavailable,
            found_in: None,
            missing_field: None,
            classified: Some(ClassifiedRuleSet::default()),
            message: format!("后端存储不可用: {reason}"),
        }
    }
}

/// Received 阶段：检查必填字段并解析类别
pub fn receive(request: &ValidationRequest) -> Result<TrafficClass, ValidationResult> {
    if request.imsi.trim().is_empty() {
        return Err(ValidationResult::missing("imsi", "imsi 不能为空"));
    }
    if request.pdr_id.trim().is_empty() {
        return Err(ValidationResult::missing("pdr_id", "pdr_id 不能为空"));
    }
    if request.dnn.trim().is_empty() {
        return Err(ValidationResult::missing("dnn", "dnn 不能为空"));
    }
    request
        .dnn
        .parse::<TrafficClass>()
        .map_err(|e| ValidationResult::missing("dnn", e.to_string()))
}

/// Decided 阶段：纯函数判定
pub fn decide(classified: ClassifiedRuleSet, pdr_id: &str, class: TrafficClass) -> ValidationResult {
    let (outcome, found_in, message) = if classified.contains(class, pdr_id) {
        (Outcome::Correct, Some(class), format!("PDR 属于 {class} 类别"))
    } else if classified.contains(class.other(), pdr_id) {
        let other = class.other();
        (
            Outcome::ClassMismatch,
            Some(other),
            format!("PDR 属于 {other} 类别，与声明的 {class} 不符"),
        )
    } else if classified.is_degraded() {
        (
            Outcome::NotFound,
            None,
            "该订户下未找到 PDR（部分类别数据不可用）".to_string(),
        )
    } else {
        (Outcome::NotFound, None, "该订户下未找到 PDR".to_string())
    };

    ValidationResult {
        outcome,
        found_in,
        missing_field: None,
        classified: Some(classified),
        message,
    }
}

/// 校验引擎
#[derive(Clone)]
pub struct ValidationEngine {
    resolver: RuleResolver,
}

impl ValidationEngine {
    pub fn new(resolver: RuleResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &RuleResolver {
        &self.resolver
    }

    /// 执行一次校验
    #[instrument(skip(self, request), fields(imsi = %request.imsi, pdr_id = %request.pdr_id, dnn = %request.dnn))]
    pub async fn validate(&self, request: &ValidationRequest) -> ValidationResult {
        let start = Instant::now();
        let result = self.run(request).await;
        metrics::record_validation(result.outcome.as_str(), start.elapsed().as_secs_f64());

        match result.outcome {
            Outcome::Unavailable => warn!(message = %result.message, "校验失败：存储不可用"),
            outcome => info!(outcome = %outcome, "校验完成"),
        }
        result
    }

    async fn run(&self, request: &ValidationRequest) -> ValidationResult {
        let class = match receive(request) {
            Ok(class) => class,
            Err(rejected) => return rejected,
        };
        debug!(stage = ?ValidationStage::Received, class = %class);

        let classified = match self.resolver.resolve_subscriber(&request.imsi).await {
            Ok(classified) => classified,
            Err(ResolveError::EmptyKey) => {
                return ValidationResult::missing("imsi", "imsi 不能为空");
            }
            Err(ResolveError::Unavailable(reason)) => {
                return ValidationResult::unavailable(reason);
            }
        };
        debug!(
            stage = ?ValidationStage::Resolved,
            internet = classified.internet_pdrs.len(),
            ims = classified.ims_pdrs.len(),
        );

        let result = decide(classified, &request.pdr_id, class);
        debug!(stage = ?ValidationStage::Decided, outcome = %result.outcome);
        result
    }
}
