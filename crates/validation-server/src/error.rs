//! REST 接口错误类型

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rule_agent::{ResolveError, StoreError};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("请求体无效: {0}")]
    InvalidRequest(String),

    #[error("缺少参数: {0}")]
    MissingParameter(String),

    #[error("PDR 不存在: imsi={imsi} pdr_id={pdr_id}")]
    PdrNotFound { imsi: String, pdr_id: String },

    #[error("后端存储不可用: {0}")]
    Unavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::MissingParameter(_) => StatusCode::BAD_REQUEST,
            Self::PdrNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::MissingParameter(_) => "MISSING_PARAMETER",
            Self::PdrNotFound { .. } => "NOT_FOUND",
            Self::Unavailable(_) => "UNAVAILABLE",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 后端错误细节只写日志
        let message = match &self {
            Self::Unavailable(e) => {
                tracing::error!(error = %e, "后端存储不可用");
                "后端存储不可用，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::MissingParameter(errors.to_string())
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::EmptyKey => Self::MissingParameter("imsi".to_string()),
            ResolveError::Unavailable(reason) => Self::Unavailable(reason),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_code_mapping() {
        let cases = vec![
            (ApiError::InvalidRequest("bad json".into()), StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            (ApiError::MissingParameter("imsi".into()), StatusCode::BAD_REQUEST, "MISSING_PARAMETER"),
            (
                ApiError::PdrNotFound {
                    imsi: "I1".into(),
                    pdr_id: "p9".into(),
                },
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (ApiError::Unavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status_code(), status, "{err}");
            assert_eq!(err.error_code(), code);
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_resolve_error_conversion() {
        assert!(matches!(
            ApiError::from(ResolveError::EmptyKey),
            ApiError::MissingParameter(_)
        ));
        assert!(matches!(
            ApiError::from(ResolveError::Unavailable("x".into())),
            ApiError::Unavailable(_)
        ));
    }
}
