//! The settlement capability — the seam to the external signer/contract.
//!
//! The core never talks to a chain directly. Everything it needs from the
//! outside world is two operations: hold funds against a job, and pay held
//! funds out. A payout takes the full payment list so that release, refund,
//! and split are each one atomic external call — a partial split is not
//! representable.

use crate::error::SettlementError;
use fairlance_types::{Amount, JobId, WalletAddress};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Confirmed-transaction reference returned by the collaborator.
///
/// Opaque to the core; stored for audit and for idempotent replay of a
/// confirmed call.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SettlementRef(String);

impl SettlementRef {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SettlementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One leg of a payout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payment {
    pub to: WalletAddress,
    pub amount: Amount,
}

/// Capability interface for the escrow collaborator.
///
/// A pending-but-unconfirmed external transaction is "not yet succeeded":
/// implementations return only once the movement is confirmed, or fail.
pub trait SettlementBackend {
    /// Hold `amount` from the employer against `job`.
    fn lock_funds(
        &mut self,
        job: JobId,
        from: &WalletAddress,
        amount: Amount,
    ) -> Result<SettlementRef, SettlementError>;

    /// Pay held funds out in a single confirmed movement.
    fn pay_out(&mut self, job: JobId, payments: &[Payment])
        -> Result<SettlementRef, SettlementError>;
}

/// A confirmed movement recorded by [`InstantSettlement`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Movement {
    Lock {
        job: JobId,
        from: WalletAddress,
        amount: Amount,
    },
    PayOut {
        job: JobId,
        payments: Vec<Payment>,
    },
}

/// Deterministic in-memory settlement backend.
///
/// Confirms instantly and keeps a full movement log so tests can assert
/// exactly how funds moved. The next call can be scripted to fail via
/// [`InstantSettlement::fail_next`].
#[derive(Default)]
pub struct InstantSettlement {
    seq: u64,
    movements: Vec<Movement>,
    fail_next: Option<String>,
}

impl InstantSettlement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next backend call fail with `reason`, then recover.
    pub fn fail_next(&mut self, reason: impl Into<String>) {
        self.fail_next = Some(reason.into());
    }

    /// The full confirmed-movement log, in call order.
    pub fn movements(&self) -> &[Movement] {
        &self.movements
    }

    /// Total raw units confirmed as paid to `recipient` across all payouts.
    pub fn total_paid_to(&self, recipient: &WalletAddress) -> u128 {
        self.movements
            .iter()
            .filter_map(|m| match m {
                Movement::PayOut { payments, .. } => Some(payments),
                Movement::Lock { .. } => None,
            })
            .flatten()
            .filter(|p| &p.to == recipient)
            .map(|p| p.amount.raw())
            .sum()
    }

    fn next_ref(&mut self, kind: &str, job: JobId) -> SettlementRef {
        self.seq += 1;
        SettlementRef::new(format!("stl-{kind}-{}-{}", job.raw(), self.seq))
    }

    fn take_failure(&mut self) -> Result<(), SettlementError> {
        match self.fail_next.take() {
            Some(reason) => Err(SettlementError::Rejected(reason)),
            None => Ok(()),
        }
    }
}

impl SettlementBackend for InstantSettlement {
    fn lock_funds(
        &mut self,
        job: JobId,
        from: &WalletAddress,
        amount: Amount,
    ) -> Result<SettlementRef, SettlementError> {
        self.take_failure()?;
        self.movements.push(Movement::Lock {
            job,
            from: from.clone(),
            amount,
        });
        Ok(self.next_ref("lock", job))
    }

    fn pay_out(
        &mut self,
        job: JobId,
        payments: &[Payment],
    ) -> Result<SettlementRef, SettlementError> {
        self.take_failure()?;
        self.movements.push(Movement::PayOut {
            job,
            payments: payments.to_vec(),
        });
        Ok(self.next_ref("payout", job))
    }
}
