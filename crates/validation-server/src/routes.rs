//! 路由配置模块

use axum::{Router, middleware, routing::get};
use tower_http::cors::CorsLayer;
use upf_shared::observability::middleware as obs_middleware;

use crate::{handlers, state::AppState};

/// 校验相关路由
pub fn validate_routes() -> Router<AppState> {
    Router::new().route(
        "/validate",
        get(handlers::validate::get_subscriber_rules)
            .post(handlers::validate::validate_pdr)
            .put(handlers::validate::validate_pdr)
            .delete(handlers::validate::deactivate_pdr),
    )
}

/// 完整应用：业务路由、探针以及中间件
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(validate_routes())
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}
