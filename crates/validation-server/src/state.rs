//! 应用状态定义

use crate::store::RuleMaintenance;
use rule_agent::ValidationEngine;
use std::sync::Arc;

/// Axum 应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// 校验引擎，内部持有解析器
    pub engine: ValidationEngine,
    /// 停用 PDR 与就绪探测
    pub maintenance: Arc<dyn RuleMaintenance>,
}

impl AppState {
    pub fn new(engine: ValidationEngine, maintenance: Arc<dyn RuleMaintenance>) -> Self {
        Self {
            engine,
            maintenance,
        }
    }
}
