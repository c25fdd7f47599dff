//! Escrow Order Lifecycle Module
//!
//! This module implements the escrow order engine:
//!
//! - **machine**: Pure state machine over the order aggregate
//! - **donation**: Charity donation calculator
//! - **repository**: Keyed storage contract + in-memory implementation
//! - **index**: Pending-deadline index the sweeper scans
//! - **service**: Public command/query API with CAS retry and events
//! - **sweeper**: Periodic task converting expired timers into events
//!
//! # Data Flow
//!
//! 1. Handler (or sweeper) calls an EscrowOrderService operation
//! 2. Service loads the aggregate and applies the state machine
//! 3. The result is persisted with a compare-and-swap on `version`
//! 4. The deadline index is synced from the stored aggregate
//! 5. A domain event is broadcast to subscribers

pub mod donation;
pub mod index;
pub mod machine;
pub mod repository;
pub mod service;
pub mod sweeper;

// Re-exports
pub use index::DeadlineIndex;
pub use machine::{EscrowEvent, Transition};
pub use repository::{MemoryOrderRepository, OrderRepository};
pub use service::{CreateOrderInput, EscrowOrderService};
pub use sweeper::{DeadlineSweeper, SweepStats};

// Re-export shared types for convenience
pub use shared::order::{
    DeadlineKind, DisputeEvidence, DisputeStatus, EscrowOrder, OrderEvent, OrderEventKind,
    OrderStatus, TrackingEvent, TrackingInfo, UserRole,
};
