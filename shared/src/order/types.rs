//! Shared types for the escrow order lifecycle

use serde::{Deserialize, Serialize};

// ============================================================================
// Status Enums
// ============================================================================

/// Order status
///
/// Moves forward only along:
/// `PendingPayment → PaymentConfirmed → AwaitingShipment → Shipped →
/// Delivered → Completed`, with side exits to `Cancelled` (shipment
/// deadline expired) and `Refunded` (explicit refund command).
///
/// `Disputed` is nominal: no code path sets `status = Disputed`; dispute
/// progress lives in [`DisputeStatus`] which overlays the order status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    PendingPayment,
    PaymentConfirmed,
    AwaitingShipment,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
    Disputed,
    Refunded,
}

impl OrderStatus {
    /// Terminal statuses accept no further order-level transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::PendingPayment => "PENDING_PAYMENT",
            OrderStatus::PaymentConfirmed => "PAYMENT_CONFIRMED",
            OrderStatus::AwaitingShipment => "AWAITING_SHIPMENT",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Disputed => "DISPUTED",
            OrderStatus::Refunded => "REFUNDED",
        };
        write!(f, "{}", s)
    }
}

/// Dispute sub-flow status
///
/// `None → Reported → UnderReview → ReturnApproved → ReturnShipped →
/// Resolved | Closed`. `Resolved` and `Closed` are terminal for the
/// sub-flow; the order status is finalized independently.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeStatus {
    #[default]
    None,
    Reported,
    UnderReview,
    ReturnApproved,
    ReturnShipped,
    Resolved,
    Closed,
}

impl DisputeStatus {
    /// A dispute is open between report and resolution.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            DisputeStatus::Reported
                | DisputeStatus::UnderReview
                | DisputeStatus::ReturnApproved
                | DisputeStatus::ReturnShipped
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DisputeStatus::Resolved | DisputeStatus::Closed)
    }
}

impl std::fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DisputeStatus::None => "NONE",
            DisputeStatus::Reported => "REPORTED",
            DisputeStatus::UnderReview => "UNDER_REVIEW",
            DisputeStatus::ReturnApproved => "RETURN_APPROVED",
            DisputeStatus::ReturnShipped => "RETURN_SHIPPED",
            DisputeStatus::Resolved => "RESOLVED",
            DisputeStatus::Closed => "CLOSED",
        };
        write!(f, "{}", s)
    }
}

/// The three wall-clock timers an order can own, one at a time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeadlineKind {
    /// Shipment window: seller must add tracking or the buyer is refunded
    AutoRefund,
    /// Inspection window: buyer may report an issue before auto-release
    EscrowRelease,
    /// Return window: buyer must ship the return or forfeit
    ReturnWindow,
}

impl std::fmt::Display for DeadlineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeadlineKind::AutoRefund => write!(f, "AUTO_REFUND"),
            DeadlineKind::EscrowRelease => write!(f, "ESCROW_RELEASE"),
            DeadlineKind::ReturnWindow => write!(f, "RETURN_WINDOW"),
        }
    }
}

/// Role filter for participant queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Buyer,
    Seller,
}

// ============================================================================
// Tracking Sub-records
// ============================================================================

/// Single carrier scan event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackingEvent {
    /// Scan timestamp (Unix millis)
    pub timestamp: i64,
    /// Carrier status code ("IN_TRANSIT", "OUT_FOR_DELIVERY", ...)
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Shipment tracking info, created when the seller adds a tracking number
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackingInfo {
    pub carrier: String,
    pub tracking_number: String,
    /// Latest carrier status
    pub current_status: String,
    /// Last feed update (Unix millis)
    pub last_update: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<i64>,
    /// Ordered scan history (oldest first)
    #[serde(default)]
    pub events: Vec<TrackingEvent>,
}

impl TrackingInfo {
    pub fn new(carrier: impl Into<String>, tracking_number: impl Into<String>, now: i64) -> Self {
        Self {
            carrier: carrier.into(),
            tracking_number: tracking_number.into(),
            current_status: "LABEL_CREATED".to_string(),
            last_update: now,
            estimated_delivery: None,
            events: Vec::new(),
        }
    }

    /// Append a carrier scan and roll the current status forward.
    pub fn push_event(&mut self, event: TrackingEvent) {
        self.current_status = event.status.clone();
        self.last_update = event.timestamp;
        self.events.push(event);
    }
}

// ============================================================================
// Dispute Sub-records
// ============================================================================

/// Evidence attached to an issue report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisputeEvidence {
    /// Reason code ("damaged", "not_as_described", ...)
    pub reason: String,
    /// Free-text description
    pub description: String,
    /// Photo/video references (opaque URLs or storage keys)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photo_refs: Vec<String>,
}
