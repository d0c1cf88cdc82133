//! Escrow-specific errors.

use fairlance_types::{Amount, JobId};
use thiserror::Error;

/// Failure surfaced by the external settlement collaborator.
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("settlement rejected: {0}")]
    Rejected(String),

    #[error("settlement call timed out before confirmation")]
    Timeout,
}

#[derive(Debug, Error)]
pub enum EscrowError {
    #[error("escrow for {job} already locked for {locked}, requested {requested}")]
    AlreadyLocked {
        job: JobId,
        locked: Amount,
        requested: Amount,
    },

    #[error("no escrow locked for {0}")]
    NothingLocked(JobId),

    #[error("escrow for {0} was already released")]
    AlreadyReleased(JobId),

    #[error("escrow for {0} was already refunded")]
    AlreadyRefunded(JobId),

    #[error("escrow for {0} was already split")]
    AlreadySplit(JobId),

    #[error("split shares ({got}) do not equal the locked amount ({expected})")]
    AmountMismatch { expected: Amount, got: Amount },

    #[error("settlement error: {0}")]
    Settlement(#[from] SettlementError),
}
