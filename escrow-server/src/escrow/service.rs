//! EscrowOrderService - public API over the order lifecycle
//!
//! Every mutating operation runs the same sequence:
//! load → validate/transition (state machine) → CAS persist → sync the
//! deadline index → emit a domain event on the broadcast channel.
//!
//! `ConcurrencyConflict` from the repository is retried internally with a
//! fresh read; client errors propagate to the caller untouched.

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::order::{
    DeadlineKind, DisputeEvidence, EscrowOrder, OrderEvent, OrderStatus, TrackingEvent, UserRole,
};
use shared::util::{now_millis, order_id};
use shared::{EscrowError, EscrowResult};
use tokio::sync::broadcast;

use super::donation;
use super::index::DeadlineIndex;
use super::machine::{self, EscrowEvent, Transition};
use super::repository::OrderRepository;

/// Bounded internal retries for stale-version writes
const MAX_CAS_RETRIES: u32 = 3;

/// Domain event fan-out capacity
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// Input for `create_order`, supplied by the checkout flow after the
/// external charge-succeeded signal.
#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub product_id: i64,
    pub product_title: String,
    pub product_image: Option<String>,
    pub buyer_id: String,
    pub buyer_name: String,
    pub seller_id: String,
    pub seller_name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub charity_name: String,
    pub donation_percent: i32,
}

/// Public service over escrow orders
pub struct EscrowOrderService {
    repo: Arc<dyn OrderRepository>,
    index: Arc<DeadlineIndex>,
    event_tx: broadcast::Sender<OrderEvent>,
}

impl std::fmt::Debug for EscrowOrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscrowOrderService")
            .field("index_len", &self.index.len())
            .finish()
    }
}

impl EscrowOrderService {
    pub fn new(repo: Arc<dyn OrderRepository>, index: Arc<DeadlineIndex>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            repo,
            index,
            event_tx,
        }
    }

    /// Subscribe to domain events (notification/audit sinks).
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.event_tx.subscribe()
    }

    pub fn deadline_index(&self) -> Arc<DeadlineIndex> {
        self.index.clone()
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Create an order with payment already confirmed.
    ///
    /// The donation amount is computed here, once, and frozen on the
    /// aggregate. Out-of-range donation percentages are rejected, not
    /// clamped, so seller input errors surface early.
    pub async fn create_order(&self, input: CreateOrderInput) -> EscrowResult<EscrowOrder> {
        validate_create(&input)?;

        let now = now_millis();
        let mut order = EscrowOrder {
            id: order_id(),
            product_id: input.product_id,
            product_title: input.product_title,
            product_image: input.product_image,
            buyer_id: input.buyer_id,
            buyer_name: input.buyer_name,
            seller_id: input.seller_id,
            seller_name: input.seller_name,
            price: input.price,
            quantity: input.quantity,
            total: donation::order_total(input.price, input.quantity),
            charity_name: input.charity_name,
            donation_percent: input.donation_percent,
            donation_amount: donation::donation_amount(
                input.price,
                input.quantity,
                input.donation_percent,
            ),
            status: OrderStatus::PaymentConfirmed,
            dispute_status: Default::default(),
            created_at: now,
            paid_at: None,
            shipped_at: None,
            delivered_at: None,
            completed_at: None,
            disputed_at: None,
            shipment_deadline: None,
            auto_refund_timer: None,
            escrow_release_timer: None,
            return_deadline: None,
            tracking: None,
            dispute_evidence: None,
            return_tracking_number: None,
            version: 0,
        };
        machine::arm_new_order(&mut order, now);

        self.repo.insert(order.clone()).await?;
        self.index.track(&order);
        self.emit(OrderEvent::new(
            order.id.clone(),
            shared::order::OrderEventKind::OrderCreated,
            OrderStatus::PaymentConfirmed,
            order.status,
            Default::default(),
            order.dispute_status,
            now,
        ));
        tracing::info!(order_id = %order.id, buyer = %order.buyer_id, seller = %order.seller_id, "Order created");
        Ok(order)
    }

    // ========================================================================
    // Commands
    // ========================================================================

    pub async fn add_tracking_info(
        &self,
        order_id: &str,
        tracking_number: &str,
        carrier: &str,
    ) -> EscrowResult<EscrowOrder> {
        if tracking_number.trim().is_empty() {
            return Err(EscrowError::InvalidInput(
                "tracking number is required".to_string(),
            ));
        }
        if carrier.trim().is_empty() {
            return Err(EscrowError::InvalidInput("carrier is required".to_string()));
        }
        self.execute(
            order_id,
            EscrowEvent::AddTracking {
                carrier: carrier.to_string(),
                tracking_number: tracking_number.to_string(),
            },
        )
        .await
    }

    /// Carrier feed scan append.
    pub async fn append_tracking_event(
        &self,
        order_id: &str,
        scan: TrackingEvent,
    ) -> EscrowResult<EscrowOrder> {
        if scan.status.trim().is_empty() {
            return Err(EscrowError::InvalidInput(
                "tracking status is required".to_string(),
            ));
        }
        self.execute(order_id, EscrowEvent::AppendTrackingEvent(scan))
            .await
    }

    pub async fn mark_delivered(&self, order_id: &str) -> EscrowResult<EscrowOrder> {
        self.execute(order_id, EscrowEvent::MarkDelivered).await
    }

    pub async fn report_issue(
        &self,
        order_id: &str,
        evidence: DisputeEvidence,
    ) -> EscrowResult<EscrowOrder> {
        if evidence.reason.trim().is_empty() {
            return Err(EscrowError::InvalidInput(
                "dispute reason is required".to_string(),
            ));
        }
        if evidence.description.trim().is_empty() {
            return Err(EscrowError::InvalidInput(
                "dispute description is required".to_string(),
            ));
        }
        self.execute(order_id, EscrowEvent::ReportIssue(evidence))
            .await
    }

    pub async fn start_dispute_review(&self, order_id: &str) -> EscrowResult<EscrowOrder> {
        self.execute(order_id, EscrowEvent::StartDisputeReview)
            .await
    }

    pub async fn approve_return(&self, order_id: &str) -> EscrowResult<EscrowOrder> {
        self.execute(order_id, EscrowEvent::ApproveReturn).await
    }

    pub async fn add_return_tracking(
        &self,
        order_id: &str,
        tracking_number: &str,
    ) -> EscrowResult<EscrowOrder> {
        if tracking_number.trim().is_empty() {
            return Err(EscrowError::InvalidInput(
                "return tracking number is required".to_string(),
            ));
        }
        self.execute(
            order_id,
            EscrowEvent::AddReturnTracking {
                tracking_number: tracking_number.to_string(),
            },
        )
        .await
    }

    pub async fn release_escrow(&self, order_id: &str) -> EscrowResult<EscrowOrder> {
        self.execute(order_id, EscrowEvent::ReleaseEscrow).await
    }

    pub async fn refund_order(&self, order_id: &str) -> EscrowResult<EscrowOrder> {
        self.execute(order_id, EscrowEvent::RefundOrder).await
    }

    // ========================================================================
    // Deadline firing (sweeper entry point)
    // ========================================================================

    /// Convert an expired timer into a state-machine event.
    ///
    /// Returns `true` if a transition was applied, `false` for a stale
    /// firing (timer already cleared by a racing command). A CAS conflict
    /// is dropped rather than retried: the next sweep tick re-evaluates
    /// against fresh state.
    pub async fn fire_deadline(
        &self,
        order_id: &str,
        kind: DeadlineKind,
        now: i64,
    ) -> EscrowResult<bool> {
        let mut order = self.repo.get(order_id).await?;
        let old_status = order.status;
        let old_dispute = order.dispute_status;

        match machine::apply(&mut order, EscrowEvent::DeadlineFired(kind), now)? {
            Transition::Noop => {
                // Stale index entry; resync so it is not re-evaluated
                self.index.track(&order);
                tracing::debug!(order_id, kind = %kind, "Stale deadline firing, no-op");
                Ok(false)
            }
            Transition::Applied(event_kind) => {
                let expected = order.version;
                match self.repo.update(order, expected).await {
                    Ok(stored) => {
                        self.index.track(&stored);
                        if let Some(kind) = event_kind {
                            self.emit(OrderEvent::new(
                                stored.id.clone(),
                                kind,
                                old_status,
                                stored.status,
                                old_dispute,
                                stored.dispute_status,
                                now,
                            ));
                        }
                        tracing::info!(
                            order_id,
                            from = %old_status,
                            to = %stored.status,
                            "Deadline fired"
                        );
                        Ok(true)
                    }
                    Err(e) if e.is_retryable() => {
                        tracing::debug!(order_id, "Deadline firing lost the race, dropped");
                        Ok(false)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn get_order(&self, order_id: &str) -> EscrowResult<EscrowOrder> {
        self.repo.get(order_id).await
    }

    /// All orders for a user in the given role; unsorted, possibly empty.
    pub async fn get_orders_by_user(
        &self,
        user_id: &str,
        role: UserRole,
    ) -> EscrowResult<Vec<EscrowOrder>> {
        self.repo.find_by_participant(user_id, role).await
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Load → transition → CAS persist, retrying stale writes.
    async fn execute(&self, order_id: &str, event: EscrowEvent) -> EscrowResult<EscrowOrder> {
        let mut last_err = EscrowError::ConcurrencyConflict(order_id.to_string());
        for attempt in 0..MAX_CAS_RETRIES {
            let mut order = self.repo.get(order_id).await?;
            let old_status = order.status;
            let old_dispute = order.dispute_status;
            let now = now_millis();

            let transition = machine::apply(&mut order, event.clone(), now)?;
            let expected = order.version;
            match self.repo.update(order, expected).await {
                Ok(stored) => {
                    self.index.track(&stored);
                    if let Transition::Applied(Some(kind)) = transition {
                        self.emit(OrderEvent::new(
                            stored.id.clone(),
                            kind,
                            old_status,
                            stored.status,
                            old_dispute,
                            stored.dispute_status,
                            now,
                        ));
                    }
                    return Ok(stored);
                }
                Err(e) if e.is_retryable() => {
                    tracing::debug!(order_id, attempt, "Stale write, re-reading");
                    last_err = e;
                }
                Err(e) => return Err(e),
            }
        }
        tracing::warn!(order_id, "CAS retries exhausted");
        Err(last_err)
    }

    fn emit(&self, event: OrderEvent) {
        tracing::debug!(order_id = %event.order_id, kind = %event.kind, "Emitting domain event");
        // No receivers is fine; sinks subscribe on demand
        let _ = self.event_tx.send(event);
    }
}

fn validate_create(input: &CreateOrderInput) -> EscrowResult<()> {
    if input.buyer_id.trim().is_empty() {
        return Err(EscrowError::InvalidInput("buyer_id is required".to_string()));
    }
    if input.seller_id.trim().is_empty() {
        return Err(EscrowError::InvalidInput(
            "seller_id is required".to_string(),
        ));
    }
    if input.product_title.trim().is_empty() {
        return Err(EscrowError::InvalidInput(
            "product_title is required".to_string(),
        ));
    }
    if input.price <= Decimal::ZERO {
        return Err(EscrowError::InvalidInput(
            "price must be positive".to_string(),
        ));
    }
    if input.quantity < 1 {
        return Err(EscrowError::InvalidInput(
            "quantity must be at least 1".to_string(),
        ));
    }
    if !(0..=100).contains(&input.donation_percent) {
        return Err(EscrowError::InvalidDonationPercent(input.donation_percent));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escrow::machine::{INSPECTION_WINDOW_MS, RETURN_WINDOW_MS, SHIPMENT_WINDOW_MS};
    use crate::escrow::repository::MemoryOrderRepository;
    use async_trait::async_trait;
    use shared::order::{DisputeStatus, OrderEventKind};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn service() -> EscrowOrderService {
        EscrowOrderService::new(
            Arc::new(MemoryOrderRepository::new()),
            Arc::new(DeadlineIndex::new()),
        )
    }

    fn input() -> CreateOrderInput {
        CreateOrderInput {
            product_id: 42,
            product_title: "Linen shirt".to_string(),
            product_image: None,
            buyer_id: "buyer-1".to_string(),
            buyer_name: "Ana".to_string(),
            seller_id: "seller-1".to_string(),
            seller_name: "Marco".to_string(),
            price: Decimal::new(10000, 2),
            quantity: 2,
            charity_name: "Ocean Cleanup".to_string(),
            donation_percent: 15,
        }
    }

    fn evidence() -> DisputeEvidence {
        DisputeEvidence {
            reason: "damaged".to_string(),
            description: "Torn sleeve".to_string(),
            photo_refs: vec!["photos/1.jpg".to_string()],
        }
    }

    #[tokio::test]
    async fn test_create_order_scenario_a() {
        let svc = service();
        let order = svc.create_order(input()).await.unwrap();

        assert_eq!(order.status, OrderStatus::AwaitingShipment);
        assert_eq!(order.total, Decimal::new(20000, 2));
        assert_eq!(order.donation_amount, Decimal::new(3000, 2));
        assert_eq!(
            order.shipment_deadline,
            Some(order.created_at + SHIPMENT_WINDOW_MS)
        );
        assert_eq!(order.live_deadline_count(), 1);
    }

    #[tokio::test]
    async fn test_create_order_rejects_bad_percent() {
        let svc = service();
        let mut bad = input();
        bad.donation_percent = 101;
        let err = svc.create_order(bad).await.unwrap_err();
        assert_eq!(err, EscrowError::InvalidDonationPercent(101));

        let mut bad = input();
        bad.donation_percent = -1;
        assert!(matches!(
            svc.create_order(bad).await.unwrap_err(),
            EscrowError::InvalidDonationPercent(-1)
        ));
    }

    #[tokio::test]
    async fn test_create_order_rejects_bad_quantity_and_price() {
        let svc = service();
        let mut bad = input();
        bad.quantity = 0;
        assert!(matches!(
            svc.create_order(bad).await.unwrap_err(),
            EscrowError::InvalidInput(_)
        ));

        let mut bad = input();
        bad.price = Decimal::ZERO;
        assert!(matches!(
            svc.create_order(bad).await.unwrap_err(),
            EscrowError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn test_create_emits_order_created() {
        let svc = service();
        let mut rx = svc.subscribe();
        let order = svc.create_order(input()).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, OrderEventKind::OrderCreated);
        assert_eq!(event.order_id, order.id);
        assert_eq!(event.new_status, OrderStatus::AwaitingShipment);
    }

    #[tokio::test]
    async fn test_ship_deliver_dispute_flow() {
        let svc = service();
        let order = svc.create_order(input()).await.unwrap();

        let order = svc
            .add_tracking_info(&order.id, "1Z999", "UPS")
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.version, 1);

        let order = svc.mark_delivered(&order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        assert!(order.escrow_release_timer.is_some());

        let order = svc.report_issue(&order.id, evidence()).await.unwrap();
        assert_eq!(order.dispute_status, DisputeStatus::Reported);
        assert_eq!(order.escrow_release_timer, None);
    }

    #[tokio::test]
    async fn test_add_tracking_requires_number() {
        let svc = service();
        let order = svc.create_order(input()).await.unwrap();
        let err = svc.add_tracking_info(&order.id, "  ", "UPS").await.unwrap_err();
        assert!(matches!(err, EscrowError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_donation_amount_frozen_across_lifecycle() {
        let svc = service();
        let order = svc.create_order(input()).await.unwrap();
        let created_amount = order.donation_amount;

        svc.add_tracking_info(&order.id, "1Z999", "UPS").await.unwrap();
        svc.mark_delivered(&order.id).await.unwrap();
        let done = svc.release_escrow(&order.id).await.unwrap();
        assert_eq!(done.status, OrderStatus::Completed);
        assert_eq!(done.donation_amount, created_amount);
    }

    #[tokio::test]
    async fn test_fire_deadline_scenario_b_auto_cancel() {
        let svc = service();
        let order = svc.create_order(input()).await.unwrap();
        let past_deadline = order.auto_refund_timer.unwrap() + 1;

        let due = svc.deadline_index().due(past_deadline);
        assert_eq!(due.len(), 1);
        let (order_id, kind) = &due[0];

        let applied = svc.fire_deadline(order_id, *kind, past_deadline).await.unwrap();
        assert!(applied);
        let order = svc.get_order(order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        // Index entry gone: nothing further to sweep
        assert!(svc.deadline_index().due(i64::MAX).is_empty());
    }

    #[tokio::test]
    async fn test_fire_deadline_scenario_c_auto_release() {
        let svc = service();
        let order = svc.create_order(input()).await.unwrap();
        svc.add_tracking_info(&order.id, "1Z999", "UPS").await.unwrap();
        let order = svc.mark_delivered(&order.id).await.unwrap();

        let fired_at = order.escrow_release_timer.unwrap() + 1;
        let applied = svc
            .fire_deadline(&order.id, DeadlineKind::EscrowRelease, fired_at)
            .await
            .unwrap();
        assert!(applied);

        let order = svc.get_order(&order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.completed_at, Some(fired_at));
    }

    #[tokio::test]
    async fn test_fire_deadline_scenario_e_return_forfeit() {
        let svc = service();
        let order = svc.create_order(input()).await.unwrap();
        svc.add_tracking_info(&order.id, "1Z999", "UPS").await.unwrap();
        svc.mark_delivered(&order.id).await.unwrap();
        svc.report_issue(&order.id, evidence()).await.unwrap();
        let order = svc.approve_return(&order.id).await.unwrap();
        assert_eq!(order.dispute_status, DisputeStatus::ReturnApproved);

        let fired_at = order.return_deadline.unwrap() + 24 * 60 * 60 * 1000;
        let applied = svc
            .fire_deadline(&order.id, DeadlineKind::ReturnWindow, fired_at)
            .await
            .unwrap();
        assert!(applied);

        let order = svc.get_order(&order.id).await.unwrap();
        assert_eq!(order.dispute_status, DisputeStatus::Closed);
        assert_eq!(order.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_stale_deadline_firing_prunes_index() {
        let svc = service();
        let order = svc.create_order(input()).await.unwrap();
        let armed_deadline = order.auto_refund_timer.unwrap();
        svc.add_tracking_info(&order.id, "1Z999", "UPS").await.unwrap();

        // The old shipment deadline fires against the shipped order
        let applied = svc
            .fire_deadline(&order.id, DeadlineKind::AutoRefund, armed_deadline + 1)
            .await
            .unwrap();
        assert!(!applied);
        let order = svc.get_order(&order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn test_get_orders_by_user_roles() {
        let svc = service();
        svc.create_order(input()).await.unwrap();
        let mut second = input();
        second.buyer_id = "buyer-2".to_string();
        svc.create_order(second).await.unwrap();

        let bought = svc
            .get_orders_by_user("buyer-1", UserRole::Buyer)
            .await
            .unwrap();
        assert_eq!(bought.len(), 1);

        let sold = svc
            .get_orders_by_user("seller-1", UserRole::Seller)
            .await
            .unwrap();
        assert_eq!(sold.len(), 2);

        let nothing = svc
            .get_orders_by_user("buyer-1", UserRole::Seller)
            .await
            .unwrap();
        assert!(nothing.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let svc = service();
        assert!(matches!(
            svc.mark_delivered("missing").await.unwrap_err(),
            EscrowError::OrderNotFound(_)
        ));
        assert!(matches!(
            svc.get_order("missing").await.unwrap_err(),
            EscrowError::OrderNotFound(_)
        ));
    }

    /// Repository wrapper that rejects the first N updates with a
    /// version conflict, to exercise the service retry loop.
    struct ConflictingRepo {
        inner: MemoryOrderRepository,
        conflicts_left: AtomicU32,
    }

    #[async_trait]
    impl OrderRepository for ConflictingRepo {
        async fn insert(&self, order: EscrowOrder) -> EscrowResult<()> {
            self.inner.insert(order).await
        }

        async fn get(&self, id: &str) -> EscrowResult<EscrowOrder> {
            self.inner.get(id).await
        }

        async fn find_by_participant(
            &self,
            user_id: &str,
            role: UserRole,
        ) -> EscrowResult<Vec<EscrowOrder>> {
            self.inner.find_by_participant(user_id, role).await
        }

        async fn update(
            &self,
            order: EscrowOrder,
            expected_version: u64,
        ) -> EscrowResult<EscrowOrder> {
            if self.conflicts_left.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                n.checked_sub(1)
            }).is_ok()
            {
                return Err(EscrowError::ConcurrencyConflict(order.id));
            }
            self.inner.update(order, expected_version).await
        }
    }

    #[tokio::test]
    async fn test_execute_retries_cas_conflicts() {
        let repo = Arc::new(ConflictingRepo {
            inner: MemoryOrderRepository::new(),
            conflicts_left: AtomicU32::new(2),
        });
        let svc = EscrowOrderService::new(repo, Arc::new(DeadlineIndex::new()));
        let order = svc.create_order(input()).await.unwrap();

        // Two conflicts then success, within the retry budget
        let order = svc.add_tracking_info(&order.id, "1Z999", "UPS").await.unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
    }

    /// Repository wrapper whose updates always fail with a storage error,
    /// counting how many were attempted.
    struct UnavailableRepo {
        inner: MemoryOrderRepository,
        update_calls: AtomicU32,
    }

    #[async_trait]
    impl OrderRepository for UnavailableRepo {
        async fn insert(&self, order: EscrowOrder) -> EscrowResult<()> {
            self.inner.insert(order).await
        }

        async fn get(&self, id: &str) -> EscrowResult<EscrowOrder> {
            self.inner.get(id).await
        }

        async fn find_by_participant(
            &self,
            user_id: &str,
            role: UserRole,
        ) -> EscrowResult<Vec<EscrowOrder>> {
            self.inner.find_by_participant(user_id, role).await
        }

        async fn update(
            &self,
            _order: EscrowOrder,
            _expected_version: u64,
        ) -> EscrowResult<EscrowOrder> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            Err(EscrowError::RepositoryUnavailable("disk gone".to_string()))
        }
    }

    #[tokio::test]
    async fn test_storage_errors_are_not_retried() {
        let repo = Arc::new(UnavailableRepo {
            inner: MemoryOrderRepository::new(),
            update_calls: AtomicU32::new(0),
        });
        let svc = EscrowOrderService::new(repo.clone(), Arc::new(DeadlineIndex::new()));
        let order = svc.create_order(input()).await.unwrap();

        let err = svc.add_tracking_info(&order.id, "1Z999", "UPS").await.unwrap_err();
        assert!(matches!(err, EscrowError::RepositoryUnavailable(_)));
        // Only version conflicts re-enter the loop
        assert_eq!(repo.update_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_execute_surfaces_exhausted_retries() {
        let repo = Arc::new(ConflictingRepo {
            inner: MemoryOrderRepository::new(),
            conflicts_left: AtomicU32::new(u32::MAX),
        });
        let svc = EscrowOrderService::new(repo, Arc::new(DeadlineIndex::new()));
        let order = svc.create_order(input()).await.unwrap();

        let err = svc.add_tracking_info(&order.id, "1Z999", "UPS").await.unwrap_err();
        assert!(matches!(err, EscrowError::ConcurrencyConflict(_)));
    }

    #[tokio::test]
    async fn test_inspection_window_remaining_is_client_visible() {
        // Buyers render the countdown from the raw timer; the service
        // only has to expose it on reads.
        let svc = service();
        let order = svc.create_order(input()).await.unwrap();
        svc.add_tracking_info(&order.id, "1Z999", "UPS").await.unwrap();
        let order = svc.mark_delivered(&order.id).await.unwrap();
        let fetched = svc.get_order(&order.id).await.unwrap();
        assert_eq!(fetched.escrow_release_timer, order.escrow_release_timer);
        assert_eq!(
            fetched.escrow_release_timer,
            Some(fetched.delivered_at.unwrap() + INSPECTION_WINDOW_MS)
        );
        let _ = RETURN_WINDOW_MS;
    }
}
