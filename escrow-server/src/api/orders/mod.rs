//! 托管订单路由
//!
//! # 路由列表
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/orders | POST | 创建订单（支付已确认） |
//! | /api/orders | GET | 按用户/角色查询订单 |
//! | /api/orders/{id} | GET | 订单详情 |
//! | /api/orders/{id}/tracking | POST | 卖家登记发货单号 |
//! | /api/orders/{id}/tracking/events | POST | 追加物流扫描事件 |
//! | /api/orders/{id}/delivered | POST | 确认签收 |
//! | /api/orders/{id}/dispute | POST | 买家发起争议 |
//! | /api/orders/{id}/dispute/review | POST | 争议进入审核 |
//! | /api/orders/{id}/return/approve | POST | 批准退货 |
//! | /api/orders/{id}/return/tracking | POST | 买家登记退货单号 |
//! | /api/orders/{id}/release | POST | 放款并完成订单 |
//! | /api/orders/{id}/refund | POST | 退款给买家 |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// 订单路由
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list_by_user))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/tracking", post(handler::add_tracking))
        .route("/{id}/tracking/events", post(handler::append_tracking_event))
        .route("/{id}/delivered", post(handler::mark_delivered))
        .route("/{id}/dispute", post(handler::report_issue))
        .route("/{id}/dispute/review", post(handler::start_dispute_review))
        .route("/{id}/return/approve", post(handler::approve_return))
        .route("/{id}/return/tracking", post(handler::add_return_tracking))
        .route("/{id}/release", post(handler::release_escrow))
        .route("/{id}/refund", post(handler::refund_order))
}
