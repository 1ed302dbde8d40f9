pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::{
    error::AppError,
    state::AppState,
    utils::middleware::{auth_middleware, rate_limit_middleware, request_logging_middleware},
};

/// 组装应用路由和中间件栈
pub fn build_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::posts::router())
        .merge(routes::groups::router())
        .merge(routes::profiles::router())
        .nest("/auth", routes::auth::router())
        .fallback(page_not_found)
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// 未匹配路径统一走自定义 404 页面
async fn page_not_found() -> AppError {
    AppError::not_found("Page")
}
