//! 响应 DTO
//!
//! 所有接口使用统一信封 `{success, code, message, data}`。

use chrono::Utc;
use rule_agent::{ClassifiedRuleSet, ValidationRequest, ValidationResult};
use serde::Serialize;

/// API 统一响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: Some(data),
        }
    }

    /// 自定义错误码和消息
    pub fn with_code(
        success: bool,
        code: impl Into<String>,
        message: impl Into<String>,
        data: T,
    ) -> Self {
        Self {
            success,
            code: code.into(),
            message: message.into(),
            data: Some(data),
        }
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// 校验结果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationData {
    pub imsi: String,
    pub pdr_id: String,
    pub dnn: String,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found_in: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internet_pdrs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ims_pdrs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded_classes: Vec<String>,
    pub timestamp: String,
}

impl ValidationData {
    pub fn new(request: &ValidationRequest, result: &ValidationResult) -> Self {
        let classified = result.classified.as_ref();
        Self {
            imsi: request.imsi.clone(),
            pdr_id: request.pdr_id.clone(),
            dnn: request.dnn.clone(),
            outcome: result.outcome.as_str().to_string(),
            found_in: result.found_in.map(|c| c.as_str().to_string()),
            missing_field: result.missing_field.map(str::to_string),
            internet_pdrs: classified.map(|c| c.internet_pdrs.clone()),
            ims_pdrs: classified.map(|c| c.ims_pdrs.clone()),
            degraded_classes: classified
                .map(|c| c.degraded.iter().map(|d| d.as_str().to_string()).collect())
                .unwrap_or_default(),
            timestamp: now_rfc3339(),
        }
    }
}

/// 订户规则分类
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberRulesData {
    pub imsi: String,
    pub internet_pdrs: Vec<String>,
    pub ims_pdrs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded_classes: Vec<String>,
    pub timestamp: String,
}

impl SubscriberRulesData {
    pub fn new(imsi: String, classified: ClassifiedRuleSet) -> Self {
        Self {
            imsi,
            degraded_classes: classified
                .degraded
                .iter()
                .map(|d| d.as_str().to_string())
                .collect(),
            internet_pdrs: classified.internet_pdrs,
            ims_pdrs: classified.ims_pdrs,
            timestamp: now_rfc3339(),
        }
    }
}

/// PDR 停用结果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivationData {
    pub imsi: String,
    pub pdr_id: String,
    pub status: String,
    pub timestamp: String,
}

impl DeactivationData {
    pub fn new(imsi: String, pdr_id: String) -> Self {
        Self {
            imsi,
            pdr_id,
            status: "inactive".to_string(),
            timestamp: now_rfc3339(),
        }
    }
}
