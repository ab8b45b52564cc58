//! 配置代理
//!
//! 读取 UPF 配置文件（JSONC）并以 gRPC 形式提供结构化配置。

pub mod error;
pub mod grpc;
pub mod upf_config;

pub use error::{ConfigAgentError, Result};
pub use grpc::ConfigServiceImpl;
pub use upf_config::UpfConfig;
