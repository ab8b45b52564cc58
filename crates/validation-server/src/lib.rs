//! 校验服务（REST）
//!
//! 以 PostgreSQL 为后端的 PDR 校验接口，解析和判定逻辑复用规则代理的
//! `RuleResolver` / `ValidationEngine`。
//!
//! ## 模块结构
//!
//! - `dto`: 请求和响应的数据传输对象
//! - `error`: 错误类型与 HTTP 状态映射
//! - `handlers`: HTTP 请求处理器
//! - `routes`: 路由与中间件
//! - `state`: 应用状态
//! - `store`: PostgreSQL 存储与示例数据

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod store;

pub use error::{ApiError, Result};
pub use routes::build_router;
pub use state::AppState;
pub use store::{MIGRATOR, PgRuleStore, RuleMaintenance};
