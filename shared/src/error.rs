//! Error taxonomy for the escrow domain
//!
//! Every fallible operation in the order lifecycle returns one of these
//! variants. Client errors (`InvalidInput`, `InvalidTransition`,
//! `InspectionWindowClosed`) are surfaced to the caller and never retried;
//! `ConcurrencyConflict` is retried internally by the service;
//! `RepositoryUnavailable` is retried by the sweeper on its next tick.

use thiserror::Error;

/// Domain error for escrow order operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EscrowError {
    /// Malformed command payload (missing field, bad range)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Donation percent outside [0, 100]
    #[error("Invalid donation percent: {0} (must be 0-100)")]
    InvalidDonationPercent(i32),

    /// No order with the given id
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Event not legal from the current order/dispute state
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Issue reported at or after the escrow release deadline
    #[error("Inspection window closed")]
    InspectionWindowClosed,

    /// Write targeted a stale aggregate version
    #[error("Concurrency conflict on order {0}")]
    ConcurrencyConflict(String),

    /// Storage I/O failure
    #[error("Repository unavailable: {0}")]
    RepositoryUnavailable(String),
}

impl EscrowError {
    /// Client errors are surfaced directly and must never be retried.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EscrowError::InvalidInput(_)
                | EscrowError::InvalidDonationPercent(_)
                | EscrowError::OrderNotFound(_)
                | EscrowError::InvalidTransition(_)
                | EscrowError::InspectionWindowClosed
        )
    }

    /// Whether the service-level CAS retry loop should re-read and re-apply.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EscrowError::ConcurrencyConflict(_))
    }
}

/// Result type for escrow domain operations
pub type EscrowResult<T> = Result<T, EscrowError>;
