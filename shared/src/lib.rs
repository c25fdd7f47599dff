//! Shared types for the Givelane escrow platform
//!
//! Domain types used by the escrow server and its clients: the
//! `EscrowOrder` aggregate, status enumerations, domain events,
//! error taxonomy and time utilities.

pub mod error;
pub mod order;
pub mod util;

// Re-exports
pub use error::{EscrowError, EscrowResult};
pub use order::{
    DeadlineKind, DisputeEvidence, DisputeStatus, EscrowOrder, OrderEvent, OrderEventKind,
    OrderStatus, TrackingEvent, TrackingInfo, UserRole,
};
pub use serde::{Deserialize, Serialize};
