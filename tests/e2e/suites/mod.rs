//! 测试套件模块
//!
//! 按服务组织的测试用例集合。

pub mod client_validation;
pub mod config_agent;
pub mod flow_agent;
pub mod imsi_agent;
pub mod rule_agent;
