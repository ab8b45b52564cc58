//! 规则代理
//!
//! UPF 会话规则的解析与校验核心：
//! - 订户目录 / 会话存储抽象（内存快照、远程代理）
//! - 规则解析器：按流量类别归类 PDR，处理存储降级
//! - 校验引擎：接收、解析、判定三阶段
//! - gRPC 服务接口

pub mod client;
pub mod error;
pub mod grpc;
pub mod models;
pub mod resolver;
pub mod seed;
pub mod store;
pub mod validation;

pub use error::{ProvisionError, ResolveError, Result, StoreError};
pub use grpc::RuleAgentServiceImpl;
pub use models::{ClassifiedRuleSet, RuleBundle, RuleStatus, SubscriberSessions, TrafficClass};
pub use resolver::RuleResolver;
pub use seed::{SeedDocument, Snapshot};
pub use store::{SessionStore, SnapshotStore, SubscriberDirectory};
pub use validation::{Outcome, ValidationEngine, ValidationRequest, ValidationResult};
