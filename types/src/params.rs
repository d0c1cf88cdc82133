//! Market parameters — every tunable the engines consult.
//!
//! Grouped by the component that reads them. Hosts may override any field
//! via configuration; the defaults are the marketplace's shipped behavior.

use serde::{Deserialize, Serialize};

/// All tunable parameters of the marketplace core.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarketParams {
    // ── Reputation deltas ───────────────────────────────────────────────
    /// Base points for completing a job.
    pub completion_points: u64,

    /// Bonus points when the job was delivered on time.
    pub on_time_bonus_points: u64,

    /// Points for the first verification of a (worker, skill) pair.
    pub skill_verified_points: u64,

    /// Points to the worker when a dispute resolves in their favor.
    pub dispute_favor_worker_points: u64,

    /// Penalty to the employer when a dispute resolves against them.
    pub dispute_employer_penalty_points: u64,

    /// Penalty to the worker when a dispute resolves in the employer's
    /// favor. Steeper than the completion reward: a confirmed quality
    /// failure outweighs a neutral completion.
    pub dispute_favor_employer_penalty_points: u64,

    /// Magnitude of the partial-outcome delta; the actual delta is
    /// interpolated in [-partial, +partial] from the worker's share.
    pub dispute_partial_points: u64,

    // ── Rating weighting ────────────────────────────────────────────────
    /// Reputation a rater needs per extra weight point. A fresh account
    /// rates at weight 1; a vetted one at up to `rating_weight_cap`.
    pub rating_rep_per_weight_point: u64,

    /// Upper bound on a rater's weight multiplier.
    pub rating_weight_cap: i64,

    /// Fraction of the old rolling average retained per new sample, in
    /// basis points (9000 = new_avg = old × 0.9 + value × 0.1).
    pub rating_smoothing_retain_bps: u32,

    /// Lowest accepted rating sub-score.
    pub min_rating: u8,

    /// Highest accepted rating sub-score.
    pub max_rating: u8,

    // ── Dispute arbitration ─────────────────────────────────────────────
    /// Minimum total weighted voting power before a tally is decisive.
    pub dispute_quorum_power: u128,

    /// Voting window length in seconds, from dispute creation.
    pub dispute_voting_period_secs: u64,

    /// One-time deadline extension applied when the window closes below
    /// quorum.
    pub dispute_deadline_extension_secs: u64,
}

impl MarketParams {
    /// Marketplace defaults — the shipped configuration.
    pub fn marketplace_defaults() -> Self {
        Self {
            completion_points: 10,
            on_time_bonus_points: 5,
            skill_verified_points: 15,
            dispute_favor_worker_points: 20,
            dispute_employer_penalty_points: 10,
            dispute_favor_employer_penalty_points: 25,
            dispute_partial_points: 5,

            rating_rep_per_weight_point: 50,
            rating_weight_cap: 5,
            rating_smoothing_retain_bps: 9000, // 90% old, 10% new
            min_rating: 1,
            max_rating: 5,

            dispute_quorum_power: 100,
            dispute_voting_period_secs: 7 * 24 * 3600, // 1 week
            dispute_deadline_extension_secs: 3 * 24 * 3600, // 3 days
        }
    }
}

/// Default is the shipped marketplace configuration.
impl Default for MarketParams {
    fn default() -> Self {
        Self::marketplace_defaults()
    }
}
