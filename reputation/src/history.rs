//! Append-only audit records.
//!
//! [`ReputationEvent`] entries are the ground truth the cached score is
//! derived from; [`SkillVerification`] entries record every endorsement,
//! including duplicates that contributed no points. Neither is ever mutated
//! after creation.

use fairlance_types::{DisputeOutcome, JobId, RatingId, Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

/// Why a reputation delta was applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReputationReason {
    JobCompleted { on_time: bool },
    RatingReceived { rating: RatingId },
    SkillVerified { skill: String },
    DisputeResolved { outcome: DisputeOutcome },
}

/// One point-change in a participant's trust score.
///
/// `delta` is the **applied** change (after the 0-floor clamp), so summing a
/// history always reproduces the current score exactly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReputationEvent {
    pub wallet: WalletAddress,
    /// Causal job, when the trigger traces back to one.
    pub job: Option<JobId>,
    pub reason: ReputationReason,
    pub delta: i64,
    pub score_before: u64,
    pub score_after: u64,
    pub timestamp: Timestamp,
}

/// One skill endorsement event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkillVerification {
    pub worker: WalletAddress,
    pub skill: String,
    pub verifier: WalletAddress,
    pub job: Option<JobId>,
    /// False for repeat endorsements of an already-verified skill.
    pub first_verification: bool,
    pub timestamp: Timestamp,
}
