//! 请求 DTO

use serde::Deserialize;
use validator::Validate;

/// POST/PUT /validate 请求体
///
/// 缺失字段按空字符串处理，由校验引擎给出 MISSING_FIELD。
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ValidateBody {
    pub imsi: String,
    pub rules: RuleBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RuleBody {
    #[serde(alias = "pdrId")]
    pub pdr_id: String,
    pub dnn: String,
}

/// GET /validate 查询参数
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct SubscriberQuery {
    #[validate(length(min = 1, message = "imsi 参数不能为空"))]
    pub imsi: String,
}

/// DELETE /validate 查询参数
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct DeactivateQuery {
    #[validate(length(min = 1, message = "imsi 参数不能为空"))]
    pub imsi: String,
    #[validate(length(min = 1, message = "pdr_id 参数不能为空"))]
    #[serde(alias = "pdrId")]
    pub pdr_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_body_accepts_both_spellings() {
        let body: ValidateBody =
            serde_json::from_str(r#"{"imsi": "I1", "rules": {"pdrId": "pdr1", "dnn": "ims"}}"#)
                .unwrap();
        assert_eq!(body.rules.pdr_id, "pdr1");

        let body: ValidateBody =
            serde_json::from_str(r#"{"imsi": "I1", "rules": {"pdr_id": "pdr2", "dnn": "ims"}}"#)
                .unwrap();
        assert_eq!(body.rules.pdr_id, "pdr2");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let body: ValidateBody = serde_json::from_str(r#"{"imsi": "I1"}"#).unwrap();
        assert!(body.rules.pdr_id.is_empty());
        assert!(body.rules.dnn.is_empty());
    }

    #[test]
    fn test_query_validation() {
        assert!(SubscriberQuery::default().validate().is_err());
        assert!(
            DeactivateQuery {
                imsi: "I1".to_string(),
                pdr_id: String::new(),
            }
            .validate()
            .is_err()
        );
        assert!(
            DeactivateQuery {
                imsi: "I1".to_string(),
                pdr_id: "pdr1".to_string(),
            }
            .validate()
            .is_ok()
        );
    }
}
