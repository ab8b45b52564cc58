//! 共享库
//!
//! 包含所有 UPF 代理服务共用的配置、错误处理、数据库连接、可观测性以及种子文件热加载等基础设施代码。

pub mod config;
pub mod database;
pub mod error;
pub mod observability;
pub mod seed_watcher;
pub mod shutdown;
