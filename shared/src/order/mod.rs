//! Escrow order domain model
//!
//! # 结构
//!
//! - [`types`] - 状态枚举、物流/争议子记录
//! - [`escrow_order`] - 订单聚合根
//! - [`event`] - 领域事件

pub mod escrow_order;
pub mod event;
pub mod types;

pub use escrow_order::EscrowOrder;
pub use event::{OrderEvent, OrderEventKind};
pub use types::{
    DeadlineKind, DisputeEvidence, DisputeStatus, OrderStatus, TrackingEvent, TrackingInfo,
    UserRole,
};
