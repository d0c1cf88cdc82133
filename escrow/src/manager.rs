//! The escrow ledger of record.
//!
//! One [`EscrowRecord`] per job, keyed by [`JobId`]. Records are committed
//! only after the settlement backend confirms the movement, so a failed
//! external call leaves the ledger exactly as it was.

use crate::error::EscrowError;
use crate::settlement::{Payment, SettlementBackend, SettlementRef};
use fairlance_types::{Amount, JobId, WalletAddress};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Custody state of one job's payment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowState {
    /// Funds held; no payout yet.
    Locked,
    /// Full amount went to the worker. Terminal.
    Released,
    /// Full amount went back to the employer. Terminal.
    Refunded,
    /// Amount was split between the parties. Terminal.
    Split,
}

/// The custody record for one job.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EscrowRecord {
    pub job: JobId,
    pub employer: WalletAddress,
    pub amount: Amount,
    pub state: EscrowState,
    /// Confirmed lock transaction.
    pub lock_ref: SettlementRef,
    /// Confirmed payout transaction, once funds have moved out.
    pub settle_ref: Option<SettlementRef>,
}

/// Custodian of job payments, generic over the settlement collaborator.
pub struct EscrowManager<B> {
    backend: B,
    records: HashMap<JobId, EscrowRecord>,
}

impl<B: SettlementBackend> EscrowManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            records: HashMap::new(),
        }
    }

    /// Hold `amount` from `employer` against `job`.
    ///
    /// Idempotent: a repeat call with the identical amount returns the
    /// original lock reference without touching the backend. A repeat call
    /// with a different amount is refused.
    pub fn lock(
        &mut self,
        job: JobId,
        employer: &WalletAddress,
        amount: Amount,
    ) -> Result<SettlementRef, EscrowError> {
        if let Some(record) = self.records.get(&job) {
            if record.amount == amount {
                debug!(%job, %amount, "escrow lock replayed, returning prior ref");
                return Ok(record.lock_ref.clone());
            }
            return Err(EscrowError::AlreadyLocked {
                job,
                locked: record.amount,
                requested: amount,
            });
        }

        let lock_ref = self.backend.lock_funds(job, employer, amount)?;
        self.records.insert(
            job,
            EscrowRecord {
                job,
                employer: employer.clone(),
                amount,
                state: EscrowState::Locked,
                lock_ref: lock_ref.clone(),
                settle_ref: None,
            },
        );
        info!(%job, %amount, "escrow locked");
        Ok(lock_ref)
    }

    /// Transfer the full locked amount to the worker.
    ///
    /// At most once: a second call reports the prior terminal state and
    /// moves no funds.
    pub fn release(
        &mut self,
        job: JobId,
        worker: &WalletAddress,
    ) -> Result<SettlementRef, EscrowError> {
        let amount = self.held_amount(job)?;
        let settle_ref = self.backend.pay_out(
            job,
            &[Payment {
                to: worker.clone(),
                amount,
            }],
        )?;
        self.settle(job, EscrowState::Released, settle_ref.clone());
        info!(%job, %amount, recipient = %worker, "escrow released to worker");
        Ok(settle_ref)
    }

    /// Return the full locked amount to the employer. Symmetric to
    /// [`EscrowManager::release`].
    pub fn refund(
        &mut self,
        job: JobId,
        employer: &WalletAddress,
    ) -> Result<SettlementRef, EscrowError> {
        let amount = self.held_amount(job)?;
        let settle_ref = self.backend.pay_out(
            job,
            &[Payment {
                to: employer.clone(),
                amount,
            }],
        )?;
        self.settle(job, EscrowState::Refunded, settle_ref.clone());
        info!(%job, %amount, recipient = %employer, "escrow refunded to employer");
        Ok(settle_ref)
    }

    /// Split the locked amount between the parties in one movement.
    ///
    /// The shares must reconstruct the locked amount exactly.
    pub fn split_release(
        &mut self,
        job: JobId,
        worker: &WalletAddress,
        employer: &WalletAddress,
        worker_share: Amount,
        employer_share: Amount,
    ) -> Result<SettlementRef, EscrowError> {
        let amount = self.held_amount(job)?;
        let got = worker_share.saturating_add(employer_share);
        if got != amount {
            return Err(EscrowError::AmountMismatch {
                expected: amount,
                got,
            });
        }

        let settle_ref = self.backend.pay_out(
            job,
            &[
                Payment {
                    to: worker.clone(),
                    amount: worker_share,
                },
                Payment {
                    to: employer.clone(),
                    amount: employer_share,
                },
            ],
        )?;
        self.settle(job, EscrowState::Split, settle_ref.clone());
        info!(%job, %worker_share, %employer_share, "escrow split between parties");
        Ok(settle_ref)
    }

    /// Access the settlement collaborator (e.g. to script a test double).
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The amount currently locked for `job`, if any.
    pub fn locked_amount(&self, job: JobId) -> Option<Amount> {
        self.records
            .get(&job)
            .filter(|r| r.state == EscrowState::Locked)
            .map(|r| r.amount)
    }

    /// The custody record for `job`, if one exists.
    pub fn record(&self, job: JobId) -> Option<&EscrowRecord> {
        self.records.get(&job)
    }

    /// Check the record is present and still holding funds; return the
    /// held amount.
    fn held_amount(&self, job: JobId) -> Result<Amount, EscrowError> {
        let record = self
            .records
            .get(&job)
            .ok_or(EscrowError::NothingLocked(job))?;
        match record.state {
            EscrowState::Locked => Ok(record.amount),
            EscrowState::Released => Err(EscrowError::AlreadyReleased(job)),
            EscrowState::Refunded => Err(EscrowError::AlreadyRefunded(job)),
            EscrowState::Split => Err(EscrowError::AlreadySplit(job)),
        }
    }

    fn settle(&mut self, job: JobId, state: EscrowState, settle_ref: SettlementRef) {
        let record = self
            .records
            .get_mut(&job)
            .expect("held_amount verified the record exists");
        record.state = state;
        record.settle_ref = Some(settle_ref);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::InstantSettlement;

    fn manager() -> EscrowManager<InstantSettlement> {
        EscrowManager::new(InstantSettlement::new())
    }

    fn addr(s: &str) -> WalletAddress {
        WalletAddress::new(s)
    }

    #[test]
    fn lock_is_idempotent_for_identical_amount() {
        let mut escrow = manager();
        let job = JobId::new(1);
        let first = escrow.lock(job, &addr("emp"), Amount::from_whole(2)).unwrap();
        let second = escrow.lock(job, &addr("emp"), Amount::from_whole(2)).unwrap();
        assert_eq!(first, second);
        // One confirmed movement, not two.
        assert_eq!(escrow.backend.movements().len(), 1);
    }

    #[test]
    fn lock_with_different_amount_is_refused() {
        let mut escrow = manager();
        let job = JobId::new(1);
        escrow.lock(job, &addr("emp"), Amount::from_whole(2)).unwrap();
        let err = escrow
            .lock(job, &addr("emp"), Amount::from_whole(3))
            .unwrap_err();
        assert!(matches!(err, EscrowError::AlreadyLocked { .. }));
    }

    #[test]
    fn release_moves_funds_exactly_once() {
        let mut escrow = manager();
        let job = JobId::new(1);
        let worker = addr("worker");
        escrow.lock(job, &addr("emp"), Amount::from_whole(2)).unwrap();

        escrow.release(job, &worker).unwrap();
        let err = escrow.release(job, &worker).unwrap_err();
        assert!(matches!(err, EscrowError::AlreadyReleased(_)));
        assert_eq!(
            escrow.backend.total_paid_to(&worker),
            Amount::from_whole(2).raw()
        );
    }

    #[test]
    fn refund_after_release_is_refused() {
        let mut escrow = manager();
        let job = JobId::new(1);
        let employer = addr("emp");
        escrow.lock(job, &employer, Amount::from_whole(1)).unwrap();
        escrow.release(job, &addr("worker")).unwrap();

        let err = escrow.refund(job, &employer).unwrap_err();
        assert!(matches!(err, EscrowError::AlreadyReleased(_)));
        assert_eq!(escrow.backend.total_paid_to(&employer), 0);
    }

    #[test]
    fn release_without_lock_is_nothing_locked() {
        let mut escrow = manager();
        let err = escrow.release(JobId::new(7), &addr("worker")).unwrap_err();
        assert!(matches!(err, EscrowError::NothingLocked(_)));
    }

    #[test]
    fn split_requires_exact_shares() {
        let mut escrow = manager();
        let job = JobId::new(1);
        escrow.lock(job, &addr("emp"), Amount::new(100)).unwrap();

        let err = escrow
            .split_release(
                job,
                &addr("worker"),
                &addr("emp"),
                Amount::new(60),
                Amount::new(30),
            )
            .unwrap_err();
        assert!(matches!(err, EscrowError::AmountMismatch { .. }));
        // Mismatch detected before any movement.
        assert_eq!(escrow.backend.movements().len(), 1);

        escrow
            .split_release(
                job,
                &addr("worker"),
                &addr("emp"),
                Amount::new(60),
                Amount::new(40),
            )
            .unwrap();
        assert_eq!(escrow.backend.total_paid_to(&addr("worker")), 60);
        assert_eq!(escrow.backend.total_paid_to(&addr("emp")), 40);
        assert_eq!(escrow.record(job).unwrap().state, EscrowState::Split);
    }

    #[test]
    fn backend_failure_leaves_ledger_untouched() {
        let mut escrow = manager();
        let job = JobId::new(1);
        escrow.backend.fail_next("node unreachable");
        let err = escrow
            .lock(job, &addr("emp"), Amount::from_whole(2))
            .unwrap_err();
        assert!(matches!(err, EscrowError::Settlement(_)));
        assert!(escrow.record(job).is_none());

        // Retried with the same key, the lock succeeds cleanly.
        escrow.lock(job, &addr("emp"), Amount::from_whole(2)).unwrap();
        assert_eq!(escrow.locked_amount(job), Some(Amount::from_whole(2)));
    }

    #[test]
    fn release_failure_keeps_funds_held() {
        let mut escrow = manager();
        let job = JobId::new(1);
        let worker = addr("worker");
        escrow.lock(job, &addr("emp"), Amount::from_whole(2)).unwrap();

        escrow.backend.fail_next("congestion");
        assert!(escrow.release(job, &worker).is_err());
        assert_eq!(escrow.locked_amount(job), Some(Amount::from_whole(2)));

        // Retry succeeds and settles.
        escrow.release(job, &worker).unwrap();
        assert_eq!(escrow.record(job).unwrap().state, EscrowState::Released);
    }
}
