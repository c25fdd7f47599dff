//! Domain events - immutable facts emitted after each persisted transition
//!
//! Consumed by notification/audit sinks over a broadcast channel. Every
//! event carries the order id, the state before and after the transition,
//! and the server timestamp.

use super::types::{DisputeStatus, OrderStatus};
use serde::{Deserialize, Serialize};

/// Event kind enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventKind {
    // Lifecycle
    OrderCreated,
    OrderShipped,
    OrderDelivered,
    OrderCompleted,
    OrderCancelled,
    OrderRefunded,

    // Dispute sub-flow
    DisputeReported,
    DisputeReviewStarted,
    ReturnApproved,
    ReturnShipped,
    DisputeClosed,
}

impl std::fmt::Display for OrderEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderEventKind::OrderCreated => write!(f, "ORDER_CREATED"),
            OrderEventKind::OrderShipped => write!(f, "ORDER_SHIPPED"),
            OrderEventKind::OrderDelivered => write!(f, "ORDER_DELIVERED"),
            OrderEventKind::OrderCompleted => write!(f, "ORDER_COMPLETED"),
            OrderEventKind::OrderCancelled => write!(f, "ORDER_CANCELLED"),
            OrderEventKind::OrderRefunded => write!(f, "ORDER_REFUNDED"),
            OrderEventKind::DisputeReported => write!(f, "DISPUTE_REPORTED"),
            OrderEventKind::DisputeReviewStarted => write!(f, "DISPUTE_REVIEW_STARTED"),
            OrderEventKind::ReturnApproved => write!(f, "RETURN_APPROVED"),
            OrderEventKind::ReturnShipped => write!(f, "RETURN_SHIPPED"),
            OrderEventKind::DisputeClosed => write!(f, "DISPUTE_CLOSED"),
        }
    }
}

/// Domain event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    /// Event unique ID
    pub event_id: String,
    /// Order this event belongs to
    pub order_id: String,
    pub kind: OrderEventKind,
    /// Order status before the transition
    pub old_status: OrderStatus,
    /// Order status after the transition
    pub new_status: OrderStatus,
    /// Dispute status before the transition
    #[serde(default)]
    pub old_dispute_status: DisputeStatus,
    /// Dispute status after the transition
    #[serde(default)]
    pub new_dispute_status: DisputeStatus,
    /// Server timestamp (Unix millis)
    pub timestamp: i64,
}

impl OrderEvent {
    pub fn new(
        order_id: impl Into<String>,
        kind: OrderEventKind,
        old_status: OrderStatus,
        new_status: OrderStatus,
        old_dispute_status: DisputeStatus,
        new_dispute_status: DisputeStatus,
        timestamp: i64,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.into(),
            kind,
            old_status,
            new_status,
            old_dispute_status,
            new_dispute_status,
            timestamp,
        }
    }
}
