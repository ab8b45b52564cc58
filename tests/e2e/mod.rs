//! UPF 代理服务端到端测试
//!
//! 在进程内把四个 gRPC 代理绑定到临时端口，通过真实的 tonic 客户端调用：
//! - 规则代理：会话规则、订户分类、PDR 校验
//! - IMSI 代理：订户目录
//! - 流量代理：服务端流推送
//! - 配置代理：JSONC 配置读取
//! - 客户端侧校验：远程存储 + 本地解析

pub mod setup;
pub mod suites;

pub use setup::TestEnvironment;
