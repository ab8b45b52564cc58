//! UPF 代理服务命令行客户端

pub mod cli;
pub mod output;

pub use output::OutputFormat;
