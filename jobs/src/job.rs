//! Job records.

use fairlance_escrow::SettlementRef;
use fairlance_types::{Amount, ContentRef, JobId, JobStatus, Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

/// What an employer submits to post a job.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobSpec {
    pub title: String,
    pub category: String,
    /// Opaque reference into the content store; never parsed here.
    pub description: Option<ContentRef>,
    pub amount: Amount,
    pub employer: WalletAddress,
    pub deadline: Timestamp,
}

/// A posted job. Never deleted; status transitions are the only permitted
/// mutation after creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub category: String,
    pub description: Option<ContentRef>,
    pub amount: Amount,
    pub employer: WalletAddress,
    /// Set exactly when an application is accepted.
    pub worker: Option<WalletAddress>,
    /// Confirmed escrow lock, once funds are held.
    pub escrow_ref: Option<SettlementRef>,
    pub status: JobStatus,
    /// True iff an unresolved dispute exists for this job.
    pub disputed: bool,
    pub deadline: Timestamp,
    /// Overall rating the employer left, once rated.
    pub rating: Option<u8>,
    pub created_at: Timestamp,
    /// When the worker marked the work done.
    pub completed_at: Option<Timestamp>,
}

impl Job {
    pub(crate) fn from_spec(id: JobId, spec: JobSpec, now: Timestamp) -> Self {
        Self {
            id,
            title: spec.title,
            category: spec.category,
            description: spec.description,
            amount: spec.amount,
            employer: spec.employer,
            worker: None,
            escrow_ref: None,
            status: JobStatus::Open,
            disputed: false,
            deadline: spec.deadline,
            rating: None,
            created_at: now,
            completed_at: None,
        }
    }

    /// Whether `who` is the employer or the accepted worker.
    pub fn is_party(&self, who: &WalletAddress) -> bool {
        &self.employer == who || self.worker.as_ref() == Some(who)
    }

    /// Whether the work was delivered by the deadline. Meaningful once
    /// `completed_at` is set; false before then.
    pub fn delivered_on_time(&self) -> bool {
        match self.completed_at {
            Some(done) => done <= self.deadline,
            None => false,
        }
    }
}
