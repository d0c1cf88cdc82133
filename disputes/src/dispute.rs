//! Dispute and vote records.

use fairlance_types::{
    Amount, DisputeId, DisputeKind, DisputeOutcome, DisputeStatus, JobId, JobStatus, Timestamp,
    VoteId, WalletAddress,
};
use serde::{Deserialize, Serialize};

/// A dispute over a job's outcome. Resolved exactly once, irreversibly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Dispute {
    pub id: DisputeId,
    pub job: JobId,
    pub raiser: WalletAddress,
    pub reason: String,
    pub kind: DisputeKind,
    pub status: DisputeStatus,
    /// Set exactly once, at resolution.
    pub resolution: Option<DisputeOutcome>,
    /// Stake posted by the raiser. Recorded for audit; custody of the stake
    /// itself is the signer collaborator's concern.
    pub stake: Amount,
    pub voting_deadline: Timestamp,
    /// Job status at raise time; the status-quo fallback keys off this.
    pub origin_status: JobStatus,
    /// Whether the raiser is the worker (the plaintiff side of the tally).
    pub plaintiff_is_worker: bool,
    /// Whether the one-time deadline extension has been used.
    pub extended: bool,
    pub raised_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
}

/// One arbitrator's vote. Voting power is fixed at cast time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DisputeVote {
    pub id: VoteId,
    pub dispute: DisputeId,
    pub voter: WalletAddress,
    /// True favors the raiser's side, false the defendant's.
    pub favor_plaintiff: bool,
    pub power: u128,
    pub reasoning: String,
    pub cast_at: Timestamp,
}
