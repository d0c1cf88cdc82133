//! Job ratings.

use fairlance_types::{JobId, RatingDirection, RatingId, Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

/// The four 1–5 sub-scores of a rating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingScores {
    pub overall: u8,
    pub quality: u8,
    pub communication: u8,
    pub timeliness: u8,
}

/// A rating left by one party about the other, once per (job, direction).
/// Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobRating {
    pub id: RatingId,
    pub job: JobId,
    pub rater: WalletAddress,
    pub rated: WalletAddress,
    pub direction: RatingDirection,
    pub scores: RatingScores,
    pub review: String,
    pub delivered_on_time: bool,
    pub timestamp: Timestamp,
}
