//! Dispute arbitration errors.

use fairlance_escrow::EscrowError;
use fairlance_jobs::JobError;
use fairlance_types::{DisputeId, JobId, WalletAddress};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisputeError {
    #[error("dispute {0} not found")]
    DisputeNotFound(DisputeId),

    #[error("{job} already has the unresolved dispute {existing}")]
    DuplicateDispute { job: JobId, existing: DisputeId },

    #[error("{raiser} is not a party to {job}")]
    NotAParty { job: JobId, raiser: WalletAddress },

    #[error("voting on {0} is closed")]
    VotingClosed(DisputeId),

    #[error("{voter} has already voted on {dispute}")]
    DuplicateVote {
        dispute: DisputeId,
        voter: WalletAddress,
    },

    #[error("{voter} is a direct party to the job under {dispute}")]
    ConflictOfInterest {
        dispute: DisputeId,
        voter: WalletAddress,
    },

    #[error("dispute {0} was already resolved")]
    AlreadyResolved(DisputeId),

    #[error("job error: {0}")]
    Job(#[from] JobError),

    #[error("escrow error: {0}")]
    Escrow(#[from] EscrowError),
}
