//! Status enums for jobs, applications, disputes, and ratings.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a job.
///
/// Normal path: `Open → Filled → Completed → Paid`. Raising a dispute moves
/// a Filled or Completed job into `Disputed`; resolution lands it in `Paid`
/// or `Refunded`. Jobs are never deleted — status transitions are the only
/// permitted mutation after creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    /// Posted, accepting applications. No escrow held yet.
    Open,
    /// A worker was accepted; escrow is locked.
    Filled,
    /// The worker marked the work done; awaiting employer approval.
    Completed,
    /// Frozen pending dispute resolution.
    Disputed,
    /// Escrow released to the worker. Terminal.
    Paid,
    /// Escrow returned to the employer. Terminal.
    Refunded,
}

impl JobStatus {
    /// Whether escrow is currently held against the job.
    pub fn has_escrow_obligation(&self) -> bool {
        matches!(self, Self::Filled | Self::Completed | Self::Disputed)
    }

    /// Whether a dispute may be raised from this status.
    pub fn is_disputable(&self) -> bool {
        matches!(self, Self::Filled | Self::Completed)
    }

    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Refunded)
    }

    /// Whether a worker has been attached by this point of the lifecycle.
    pub fn has_worker(&self) -> bool {
        !matches!(self, Self::Open)
    }
}

/// Status of a worker's application to a job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    /// Closed without acceptance — explicitly, or implicitly when a sibling
    /// application was accepted.
    Rejected,
}

/// Status of a dispute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisputeStatus {
    /// Created; transient — advances to Voting as soon as the deadline is set.
    Open,
    /// Accepting arbitrator votes.
    Voting,
    /// Outcome decided and executed. Terminal.
    Resolved,
}

/// How a resolved dispute came out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisputeOutcome {
    /// Full escrow released to the worker.
    FavorWorker,
    /// Full escrow refunded to the employer.
    FavorEmployer,
    /// Escrow split evenly between the parties.
    Partial,
}

/// The substance of a dispute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisputeKind {
    Quality,
    Payment,
    Scope,
    Behavior,
}

/// Which direction a job rating points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatingDirection {
    EmployerRatesWorker,
    WorkerRatesEmployer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escrow_obligation_matches_lifecycle() {
        assert!(!JobStatus::Open.has_escrow_obligation());
        assert!(JobStatus::Filled.has_escrow_obligation());
        assert!(JobStatus::Disputed.has_escrow_obligation());
        assert!(!JobStatus::Paid.has_escrow_obligation());
        assert!(!JobStatus::Refunded.has_escrow_obligation());
    }

    #[test]
    fn only_filled_and_completed_are_disputable() {
        for s in [
            JobStatus::Open,
            JobStatus::Disputed,
            JobStatus::Paid,
            JobStatus::Refunded,
        ] {
            assert!(!s.is_disputable());
        }
        assert!(JobStatus::Filled.is_disputable());
        assert!(JobStatus::Completed.is_disputable());
    }
}
