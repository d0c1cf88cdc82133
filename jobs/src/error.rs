//! Job lifecycle errors.

use fairlance_escrow::EscrowError;
use fairlance_types::{ApplicationId, ApplicationStatus, JobId, JobStatus, WalletAddress};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("invalid job spec: {0}")]
    InvalidJobSpec(String),

    #[error("job {0} not found")]
    JobNotFound(JobId),

    #[error("job {job} is {status:?}, not open")]
    JobNotOpen { job: JobId, status: JobStatus },

    #[error("{actor} is not authorized to {action} {job}")]
    NotAuthorized {
        job: JobId,
        actor: WalletAddress,
        action: &'static str,
    },

    #[error("cannot {action} {job} while it is {from:?}")]
    InvalidTransition {
        job: JobId,
        from: JobStatus,
        action: &'static str,
    },

    #[error("job {0} is frozen by an open dispute")]
    JobDisputed(JobId),

    #[error("job {job} is {status:?} and cannot be disputed")]
    JobNotDisputable { job: JobId, status: JobStatus },

    #[error("job {0} already has an open dispute")]
    AlreadyDisputed(JobId),

    #[error("job {0} has no open dispute to settle")]
    NotDisputed(JobId),

    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),

    #[error("application {application} does not belong to {job}")]
    ApplicationMismatch {
        application: ApplicationId,
        job: JobId,
    },

    #[error("application {application} is already {status:?}")]
    ApplicationClosed {
        application: ApplicationId,
        status: ApplicationStatus,
    },

    #[error("{worker} already applied to {job}")]
    DuplicateApplication { job: JobId, worker: WalletAddress },

    #[error("the employer cannot apply to their own job {0}")]
    OwnJobApplication(JobId),

    #[error("escrow error: {0}")]
    Escrow(#[from] EscrowError),
}
