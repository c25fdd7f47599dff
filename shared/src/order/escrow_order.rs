//! EscrowOrder aggregate - the per-order record held by the platform
//!
//! An order is created atomically once payment is confirmed, mutated only
//! through service-mediated transitions, and never deleted: terminal
//! orders are retained for audit and dispute history.

use super::types::{DeadlineKind, DisputeEvidence, DisputeStatus, OrderStatus, TrackingInfo};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Escrow order aggregate root
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EscrowOrder {
    /// Opaque unique order id (assigned by the service)
    pub id: String,

    // === Commerce fields ===
    pub product_id: i64,
    pub product_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_image: Option<String>,
    pub buyer_id: String,
    pub buyer_name: String,
    pub seller_id: String,
    pub seller_name: String,
    /// Unit price
    pub price: Decimal,
    pub quantity: i32,
    /// price × quantity, frozen at creation
    pub total: Decimal,
    pub charity_name: String,
    /// Donation percentage (0-100)
    pub donation_percent: i32,
    /// Charity-bound amount, computed once at creation and never recomputed
    pub donation_amount: Decimal,

    // === Lifecycle fields ===
    pub status: OrderStatus,
    #[serde(default)]
    pub dispute_status: DisputeStatus,
    /// Creation timestamp (Unix millis); payment is confirmed at creation
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipped_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disputed_at: Option<i64>,

    // === Deadline fields (Unix millis) ===
    /// Seller shipment deadline, set at creation. Kept for display even
    /// after shipping; the live timer is `auto_refund_timer`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_deadline: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_refund_timer: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escrow_release_timer: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_deadline: Option<i64>,

    // === Sub-records ===
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking: Option<TrackingInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispute_evidence: Option<DisputeEvidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_tracking_number: Option<String>,

    /// Optimistic concurrency version, bumped by every persisted write
    #[serde(default)]
    pub version: u64,
}

impl EscrowOrder {
    /// The single live deadline, if any.
    ///
    /// Invariant: at most one of the three timers is non-null at any
    /// observation point; each is owned by exactly one state.
    pub fn live_deadline(&self) -> Option<(DeadlineKind, i64)> {
        if let Some(t) = self.auto_refund_timer {
            return Some((DeadlineKind::AutoRefund, t));
        }
        if let Some(t) = self.escrow_release_timer {
            return Some((DeadlineKind::EscrowRelease, t));
        }
        if let Some(t) = self.return_deadline {
            return Some((DeadlineKind::ReturnWindow, t));
        }
        None
    }

    /// Number of live timers; must be 0 or 1.
    pub fn live_deadline_count(&self) -> usize {
        [
            self.auto_refund_timer,
            self.escrow_release_timer,
            self.return_deadline,
        ]
        .iter()
        .filter(|t| t.is_some())
        .count()
    }

    pub fn clear_all_timers(&mut self) {
        self.auto_refund_timer = None;
        self.escrow_release_timer = None;
        self.return_deadline = None;
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether the given user participates in this order under the role.
    pub fn has_participant(&self, user_id: &str, role: super::types::UserRole) -> bool {
        match role {
            super::types::UserRole::Buyer => self.buyer_id == user_id,
            super::types::UserRole::Seller => self.seller_id == user_id,
        }
    }
}
