use fairlance_disputes::DisputeError;
use fairlance_escrow::EscrowError;
use fairlance_jobs::JobError;
use fairlance_reputation::ReputationError;
use fairlance_types::{JobId, JobStatus, WalletAddress};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("job error: {0}")]
    Job(#[from] JobError),

    #[error("escrow error: {0}")]
    Escrow(#[from] EscrowError),

    #[error("dispute error: {0}")]
    Dispute(#[from] DisputeError),

    #[error("reputation error: {0}")]
    Reputation(#[from] ReputationError),

    #[error("{actor} is not a party to {job}")]
    NotAParty { job: JobId, actor: WalletAddress },

    #[error("{job} is {status:?}; ratings open after completion")]
    RatingBeforeCompletion { job: JobId, status: JobStatus },

    #[error("config error: {0}")]
    Config(String),
}
