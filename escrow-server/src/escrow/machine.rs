//! Escrow state machine - pure transition logic
//!
//! Given the current order state and an event (user action or deadline
//! firing), either mutates the aggregate into its next state and reports
//! the domain event to emit, or rejects the event. No I/O, no clock: the
//! caller supplies `now`, which keeps every guard testable to the
//! millisecond.
//!
//! A `DeadlineFired` event for a timer that a prior event already cleared
//! is a [`Transition::Noop`], not an error. The sweeper relies on this to
//! stay idempotent under concurrent firing.

use shared::order::{
    DeadlineKind, DisputeEvidence, DisputeStatus, EscrowOrder, OrderEventKind, OrderStatus,
    TrackingEvent, TrackingInfo,
};
use shared::{EscrowError, EscrowResult};

// ============================================================================
// Windows
// ============================================================================

/// Seller must ship within 3 days of payment confirmation.
pub const SHIPMENT_WINDOW_MS: i64 = 3 * 24 * 60 * 60 * 1000;
/// Buyer has 72 hours after delivery to report an issue.
pub const INSPECTION_WINDOW_MS: i64 = 72 * 60 * 60 * 1000;
/// Buyer must ship an approved return within 5 days.
pub const RETURN_WINDOW_MS: i64 = 5 * 24 * 60 * 60 * 1000;

// ============================================================================
// Events
// ============================================================================

/// Input event for the state machine
#[derive(Debug, Clone)]
pub enum EscrowEvent {
    /// Seller registered a shipment
    AddTracking {
        carrier: String,
        tracking_number: String,
    },
    /// Carrier feed pushed a scan event
    AppendTrackingEvent(TrackingEvent),
    /// Carrier feed confirmed delivery
    MarkDelivered,
    /// Sweeper converted an expired timer into an event
    DeadlineFired(DeadlineKind),
    /// Buyer reported an issue during the inspection window
    ReportIssue(DisputeEvidence),
    /// Admin started reviewing a reported dispute
    StartDisputeReview,
    /// Admin/seller approved a return
    ApproveReturn,
    /// Buyer shipped the return
    AddReturnTracking { tracking_number: String },
    /// Manual release of escrowed funds (seller wins)
    ReleaseEscrow,
    /// Manual refund to the buyer (buyer wins)
    RefundOrder,
}

/// Outcome of a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// State changed; carries the domain event to emit, if any
    Applied(Option<OrderEventKind>),
    /// Stale deadline firing; no change, no error
    Noop,
}

// ============================================================================
// Creation
// ============================================================================

/// Arm the freshly created order for escrow.
///
/// Payment is already confirmed by the caller, so `PaymentConfirmed`
/// collapses straight into `AwaitingShipment` with the shipment window
/// armed.
pub fn arm_new_order(order: &mut EscrowOrder, now: i64) {
    order.status = OrderStatus::AwaitingShipment;
    order.paid_at = Some(now);
    order.shipment_deadline = Some(now + SHIPMENT_WINDOW_MS);
    order.auto_refund_timer = Some(now + SHIPMENT_WINDOW_MS);
}

// ============================================================================
// Transitions
// ============================================================================

/// Apply an event to the order, mutating it into its next state.
pub fn apply(order: &mut EscrowOrder, event: EscrowEvent, now: i64) -> EscrowResult<Transition> {
    match event {
        EscrowEvent::AddTracking {
            carrier,
            tracking_number,
        } => add_tracking(order, carrier, tracking_number, now),
        EscrowEvent::AppendTrackingEvent(scan) => append_tracking_event(order, scan),
        EscrowEvent::MarkDelivered => mark_delivered(order, now),
        EscrowEvent::DeadlineFired(kind) => deadline_fired(order, kind, now),
        EscrowEvent::ReportIssue(evidence) => report_issue(order, evidence, now),
        EscrowEvent::StartDisputeReview => start_dispute_review(order),
        EscrowEvent::ApproveReturn => approve_return(order, now),
        EscrowEvent::AddReturnTracking { tracking_number } => {
            add_return_tracking(order, tracking_number)
        }
        EscrowEvent::ReleaseEscrow => release_escrow(order, now),
        EscrowEvent::RefundOrder => refund_order(order, now),
    }
}

fn add_tracking(
    order: &mut EscrowOrder,
    carrier: String,
    tracking_number: String,
    now: i64,
) -> EscrowResult<Transition> {
    if order.status != OrderStatus::AwaitingShipment {
        return Err(EscrowError::InvalidTransition(format!(
            "cannot add tracking while order is {}",
            order.status
        )));
    }
    order.status = OrderStatus::Shipped;
    order.auto_refund_timer = None;
    order.shipped_at = Some(now);
    order.tracking = Some(TrackingInfo::new(carrier, tracking_number, now));
    Ok(Transition::Applied(Some(OrderEventKind::OrderShipped)))
}

fn append_tracking_event(order: &mut EscrowOrder, scan: TrackingEvent) -> EscrowResult<Transition> {
    if !matches!(order.status, OrderStatus::Shipped | OrderStatus::Delivered) {
        return Err(EscrowError::InvalidTransition(format!(
            "no shipment in transit while order is {}",
            order.status
        )));
    }
    match order.tracking.as_mut() {
        Some(tracking) => {
            tracking.push_event(scan);
            // Feed update only; no lifecycle event for downstream sinks
            Ok(Transition::Applied(None))
        }
        None => Err(EscrowError::InvalidTransition(
            "order has no tracking info".to_string(),
        )),
    }
}

fn mark_delivered(order: &mut EscrowOrder, now: i64) -> EscrowResult<Transition> {
    if order.status != OrderStatus::Shipped {
        return Err(EscrowError::InvalidTransition(format!(
            "cannot mark delivered while order is {}",
            order.status
        )));
    }
    order.status = OrderStatus::Delivered;
    order.delivered_at = Some(now);
    order.escrow_release_timer = Some(now + INSPECTION_WINDOW_MS);
    Ok(Transition::Applied(Some(OrderEventKind::OrderDelivered)))
}

/// Expired-timer handling. Guards re-check state so that duplicate or
/// stale firings (cleared timer, state already advanced) fall through to
/// `Noop`.
fn deadline_fired(
    order: &mut EscrowOrder,
    kind: DeadlineKind,
    now: i64,
) -> EscrowResult<Transition> {
    match kind {
        DeadlineKind::AutoRefund => {
            let Some(deadline) = order.auto_refund_timer else {
                return Ok(Transition::Noop);
            };
            if order.status != OrderStatus::AwaitingShipment || now <= deadline {
                return Ok(Transition::Noop);
            }
            order.status = OrderStatus::Cancelled;
            order.auto_refund_timer = None;
            Ok(Transition::Applied(Some(OrderEventKind::OrderCancelled)))
        }
        DeadlineKind::EscrowRelease => {
            let Some(deadline) = order.escrow_release_timer else {
                return Ok(Transition::Noop);
            };
            if order.status != OrderStatus::Delivered
                || order.dispute_status != DisputeStatus::None
                || now <= deadline
            {
                return Ok(Transition::Noop);
            }
            order.status = OrderStatus::Completed;
            order.completed_at = Some(now);
            order.escrow_release_timer = None;
            Ok(Transition::Applied(Some(OrderEventKind::OrderCompleted)))
        }
        DeadlineKind::ReturnWindow => {
            let Some(deadline) = order.return_deadline else {
                return Ok(Transition::Noop);
            };
            if order.dispute_status != DisputeStatus::ReturnApproved || now <= deadline {
                return Ok(Transition::Noop);
            }
            // Buyer forfeited the return window: dispute closes and the
            // order completes in the seller's favor.
            order.dispute_status = DisputeStatus::Closed;
            order.return_deadline = None;
            if !order.status.is_terminal() {
                order.status = OrderStatus::Completed;
            }
            if order.completed_at.is_none() {
                order.completed_at = Some(now);
            }
            Ok(Transition::Applied(Some(OrderEventKind::DisputeClosed)))
        }
    }
}

fn report_issue(
    order: &mut EscrowOrder,
    evidence: DisputeEvidence,
    now: i64,
) -> EscrowResult<Transition> {
    if order.status != OrderStatus::Delivered {
        return Err(EscrowError::InvalidTransition(format!(
            "cannot report an issue while order is {}",
            order.status
        )));
    }
    if order.dispute_status != DisputeStatus::None {
        return Err(EscrowError::InspectionWindowClosed);
    }
    // The window closes at exactly the release instant: now == timer is
    // already too late.
    match order.escrow_release_timer {
        Some(deadline) if now < deadline => {}
        _ => return Err(EscrowError::InspectionWindowClosed),
    }
    order.dispute_status = DisputeStatus::Reported;
    order.disputed_at = Some(now);
    order.dispute_evidence = Some(evidence);
    order.escrow_release_timer = None;
    Ok(Transition::Applied(Some(OrderEventKind::DisputeReported)))
}

fn start_dispute_review(order: &mut EscrowOrder) -> EscrowResult<Transition> {
    if order.dispute_status != DisputeStatus::Reported {
        return Err(EscrowError::InvalidTransition(format!(
            "cannot start review while dispute is {}",
            order.dispute_status
        )));
    }
    order.dispute_status = DisputeStatus::UnderReview;
    Ok(Transition::Applied(Some(
        OrderEventKind::DisputeReviewStarted,
    )))
}

fn approve_return(order: &mut EscrowOrder, now: i64) -> EscrowResult<Transition> {
    if !matches!(
        order.dispute_status,
        DisputeStatus::Reported | DisputeStatus::UnderReview
    ) {
        return Err(EscrowError::InvalidTransition(format!(
            "cannot approve return while dispute is {}",
            order.dispute_status
        )));
    }
    order.dispute_status = DisputeStatus::ReturnApproved;
    order.return_deadline = Some(now + RETURN_WINDOW_MS);
    Ok(Transition::Applied(Some(OrderEventKind::ReturnApproved)))
}

fn add_return_tracking(
    order: &mut EscrowOrder,
    tracking_number: String,
) -> EscrowResult<Transition> {
    if order.dispute_status != DisputeStatus::ReturnApproved {
        return Err(EscrowError::InvalidTransition(format!(
            "cannot add return tracking while dispute is {}",
            order.dispute_status
        )));
    }
    order.dispute_status = DisputeStatus::ReturnShipped;
    order.return_tracking_number = Some(tracking_number);
    order.return_deadline = None;
    Ok(Transition::Applied(Some(OrderEventKind::ReturnShipped)))
}

fn release_escrow(order: &mut EscrowOrder, now: i64) -> EscrowResult<Transition> {
    if order.status.is_terminal() {
        return Err(EscrowError::InvalidTransition(format!(
            "cannot release escrow on a {} order",
            order.status
        )));
    }
    order.status = OrderStatus::Completed;
    if order.completed_at.is_none() {
        order.completed_at = Some(now);
    }
    order.clear_all_timers();
    if order.dispute_status.is_open() {
        // Manual release is the seller-wins finalization
        order.dispute_status = DisputeStatus::Closed;
    }
    Ok(Transition::Applied(Some(OrderEventKind::OrderCompleted)))
}

fn refund_order(order: &mut EscrowOrder, now: i64) -> EscrowResult<Transition> {
    if order.status.is_terminal() {
        return Err(EscrowError::InvalidTransition(format!(
            "cannot refund a {} order",
            order.status
        )));
    }
    order.status = OrderStatus::Refunded;
    if order.completed_at.is_none() {
        order.completed_at = Some(now);
    }
    order.clear_all_timers();
    if order.dispute_status.is_open() {
        order.dispute_status = DisputeStatus::Resolved;
    }
    Ok(Transition::Applied(Some(OrderEventKind::OrderRefunded)))
}
