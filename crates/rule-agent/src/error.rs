//! 规则代理错误类型

use thiserror::Error;

/// 存储读取错误
///
/// 存储只区分“读到/不存在/读不到”，读不到的原因在解析层统一归为不可用。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("存储不可达: {0}")]
    Unavailable(String),

    #[error("存储读取超时: {store} 超过 {timeout_ms}ms")]
    Timeout { store: &'static str, timeout_ms: u64 },
}

/// 种子数据装载错误，任何一项失败都会拒绝整份种子
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("订户标识不能为空")]
    EmptySubscriberKey,

    #[error("会话标识不能为空: 订户 {imsi}")]
    EmptySessionKey { imsi: String },

    #[error("订户重复: {0}")]
    DuplicateSubscriber(String),

    #[error("会话重复: {0}")]
    DuplicateSession(String),

    #[error("订户 {imsi} 的 internet 与 ims 指向同一会话 {fseid}")]
    AliasedSession { imsi: String, fseid: String },

    #[error("规则标识不能为空: 会话 {fseid}")]
    EmptyRuleId { fseid: String },

    #[error("种子文件读取失败: {path} - {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("种子 JSON 解析失败: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 规则解析错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("查询标识不能为空")]
    EmptyKey,

    #[error("后端存储不可用: {0}")]
    Unavailable(String),
}

impl From<ResolveError> for tonic::Status {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::EmptyKey => tonic::Status::invalid_argument(err.to_string()),
            ResolveError::Unavailable(_) => tonic::Status::unavailable(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_error_to_status() {
        let status: tonic::Status = ResolveError::Unavailable("imsi-agent".to_string()).into();
        assert_eq!(status.code(), tonic::Code::Unavailable);

        let status: tonic::Status = ResolveError::EmptyKey.into();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Timeout {
            store: "session",
            timeout_ms: 2000,
        };
        assert_eq!(err.to_string(), "存储读取超时: session 超过 2000ms");
    }
}
