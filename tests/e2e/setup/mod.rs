//! 测试环境设置模块
//!
//! 每个测试启动一套独立的进程内服务，互不共享端口和计数器。

mod environment;

pub use environment::TestEnvironment;
