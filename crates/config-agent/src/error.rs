//! 配置代理错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigAgentError {
    #[error("读取配置失败: {path} - {source}")]
    Load {
        path: String,
        #[source]
        source: config::ConfigError,
    },
}

impl From<ConfigAgentError> for tonic::Status {
    fn from(err: ConfigAgentError) -> Self {
        tonic::Status::internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConfigAgentError>;
