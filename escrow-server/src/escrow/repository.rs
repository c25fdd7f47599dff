//! Order repository - durable keyed storage contract
//!
//! The service only depends on this trait; the storage technology behind
//! it is swappable. Writes are compare-and-swap on the aggregate
//! `version` so a concurrent deadline firing and a concurrent manual
//! command can never both apply to a stale read.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use shared::order::{EscrowOrder, UserRole};
use shared::{EscrowError, EscrowResult};

/// Keyed storage for [`EscrowOrder`] records
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert a new order. Fails if the id is already taken.
    async fn insert(&self, order: EscrowOrder) -> EscrowResult<()>;

    /// Load by id. `OrderNotFound` if absent.
    async fn get(&self, id: &str) -> EscrowResult<EscrowOrder>;

    /// All orders where the user participates under the given role.
    /// An empty result is not an error.
    async fn find_by_participant(
        &self,
        user_id: &str,
        role: UserRole,
    ) -> EscrowResult<Vec<EscrowOrder>>;

    /// Compare-and-swap update: applies only if the stored version equals
    /// `expected_version`, then bumps the version. Returns the stored
    /// record. `ConcurrencyConflict` on a stale write.
    async fn update(&self, order: EscrowOrder, expected_version: u64) -> EscrowResult<EscrowOrder>;
}

/// In-memory repository backed by a concurrent map
///
/// DashMap shards give the atomic per-order read-modify-write the CAS
/// contract needs: `update` holds the entry lock across the version
/// check and the write.
#[derive(Debug, Default)]
pub struct MemoryOrderRepository {
    orders: DashMap<String, EscrowOrder>,
}

impl MemoryOrderRepository {
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn insert(&self, order: EscrowOrder) -> EscrowResult<()> {
        match self.orders.entry(order.id.clone()) {
            Entry::Occupied(_) => Err(EscrowError::InvalidInput(format!(
                "order id already exists: {}",
                order.id
            ))),
            Entry::Vacant(entry) => {
                entry.insert(order);
                Ok(())
            }
        }
    }

    async fn get(&self, id: &str) -> EscrowResult<EscrowOrder> {
        self.orders
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| EscrowError::OrderNotFound(id.to_string()))
    }

    async fn find_by_participant(
        &self,
        user_id: &str,
        role: UserRole,
    ) -> EscrowResult<Vec<EscrowOrder>> {
        Ok(self
            .orders
            .iter()
            .filter(|entry| entry.value().has_participant(user_id, role))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn update(
        &self,
        mut order: EscrowOrder,
        expected_version: u64,
    ) -> EscrowResult<EscrowOrder> {
        let mut entry = self
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| EscrowError::OrderNotFound(order.id.clone()))?;
        if entry.version != expected_version {
            return Err(EscrowError::ConcurrencyConflict(order.id.clone()));
        }
        order.version = expected_version + 1;
        *entry.value_mut() = order.clone();
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::order::{DisputeStatus, OrderStatus};

    fn sample(id: &str, buyer: &str, seller: &str) -> EscrowOrder {
        EscrowOrder {
            id: id.to_string(),
            product_id: 1,
            product_title: "Tea set".to_string(),
            product_image: None,
            buyer_id: buyer.to_string(),
            buyer_name: "Ana".to_string(),
            seller_id: seller.to_string(),
            seller_name: "Marco".to_string(),
            price: Decimal::new(5000, 2),
            quantity: 1,
            total: Decimal::new(5000, 2),
            charity_name: "Food Bank".to_string(),
            donation_percent: 10,
            donation_amount: Decimal::new(500, 2),
            status: OrderStatus::AwaitingShipment,
            dispute_status: DisputeStatus::None,
            created_at: 1_000,
            paid_at: Some(1_000),
            shipped_at: None,
            delivered_at: None,
            completed_at: None,
            disputed_at: None,
            shipment_deadline: Some(2_000),
            auto_refund_timer: Some(2_000),
            escrow_release_timer: None,
            return_deadline: None,
            tracking: None,
            dispute_evidence: None,
            return_tracking_number: None,
            version: 0,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = MemoryOrderRepository::new();
        repo.insert(sample("o-1", "b1", "s1")).await.unwrap();
        let order = repo.get("o-1").await.unwrap();
        assert_eq!(order.id, "o-1");
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let repo = MemoryOrderRepository::new();
        let err = repo.get("nope").await.unwrap_err();
        assert_eq!(err, EscrowError::OrderNotFound("nope".to_string()));
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let repo = MemoryOrderRepository::new();
        repo.insert(sample("o-1", "b1", "s1")).await.unwrap();
        let err = repo.insert(sample("o-1", "b2", "s2")).await.unwrap_err();
        assert!(matches!(err, EscrowError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_cas_update_bumps_version() {
        let repo = MemoryOrderRepository::new();
        repo.insert(sample("o-1", "b1", "s1")).await.unwrap();

        let mut order = repo.get("o-1").await.unwrap();
        order.status = OrderStatus::Shipped;
        let stored = repo.update(order, 0).await.unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(repo.get("o-1").await.unwrap().status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn test_stale_write_conflicts() {
        let repo = MemoryOrderRepository::new();
        repo.insert(sample("o-1", "b1", "s1")).await.unwrap();

        let read_a = repo.get("o-1").await.unwrap();
        let read_b = repo.get("o-1").await.unwrap();

        repo.update(read_a, 0).await.unwrap();
        let err = repo.update(read_b, 0).await.unwrap_err();
        assert_eq!(err, EscrowError::ConcurrencyConflict("o-1".to_string()));
    }

    #[tokio::test]
    async fn test_find_by_participant_filters_role() {
        let repo = MemoryOrderRepository::new();
        repo.insert(sample("o-1", "alice", "bob")).await.unwrap();
        repo.insert(sample("o-2", "bob", "carol")).await.unwrap();
        repo.insert(sample("o-3", "alice", "carol")).await.unwrap();

        let bought = repo
            .find_by_participant("alice", UserRole::Buyer)
            .await
            .unwrap();
        assert_eq!(bought.len(), 2);

        let sold = repo
            .find_by_participant("bob", UserRole::Seller)
            .await
            .unwrap();
        assert_eq!(sold.len(), 1);
        assert_eq!(sold[0].id, "o-1");

        let none = repo
            .find_by_participant("dave", UserRole::Buyer)
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
