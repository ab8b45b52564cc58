//! 统一错误处理模块
//!
//! 定义各代理服务共享的基础设施错误类型。

use thiserror::Error;

/// 基础设施错误类型
#[derive(Debug, Error)]
pub enum UpfError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("数据库迁移失败: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("配置错误: {0}")]
    Config(#[from] config::ConfigError),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, UpfError>;

impl UpfError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Database(_) => "DATABASE_ERROR",
            Self::Migration(_) => "MIGRATION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// 只有数据库连接类错误值得重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = UpfError::Config(config::ConfigError::NotFound("server.port".to_string()));
        assert_eq!(err.code(), "CONFIG_ERROR");
        assert!(err.to_string().starts_with("配置错误"));

        let err = UpfError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.code(), "DATABASE_ERROR");
    }

    #[test]
    fn test_is_retryable() {
        assert!(UpfError::Database(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(
            !UpfError::Config(config::ConfigError::Message("bad".to_string())).is_retryable()
        );
    }
}
