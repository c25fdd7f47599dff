//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查接口
//! - [`orders`] - 托管订单生命周期接口

pub mod health;
pub mod orders;

use axum::Router;

use crate::core::ServerState;

/// 组合所有 API 路由
pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
}
