//! Application records.

use fairlance_types::{ApplicationId, ApplicationStatus, JobId, Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

/// A worker's application to a job.
///
/// Exactly one application per job ever reaches Accepted; accepting it
/// implicitly rejects every pending sibling.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub job: JobId,
    pub worker: WalletAddress,
    pub status: ApplicationStatus,
    pub submitted_at: Timestamp,
}
