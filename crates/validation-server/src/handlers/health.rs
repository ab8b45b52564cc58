//! 存活与就绪探针

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::warn;

use crate::state::AppState;

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "up" }))
}

/// GET /ready
///
/// 数据库不可达时返回 503 和 `degraded`。
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.maintenance.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(e) => {
            warn!(error = %e, "就绪检查失败");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "error": e.to_string() })),
            )
        }
    }
}
