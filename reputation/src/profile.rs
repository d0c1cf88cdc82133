//! Worker profiles and the durable profile store.

use crate::history::{ReputationEvent, SkillVerification};
use crate::rating::JobRating;
use fairlance_types::{Amount, JobId, RatingDirection, Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Durable record of one participant's standing.
///
/// Created lazily on first job interaction, mutated only by the
/// [`crate::ReputationEngine`], never deleted. Employers get profiles too —
/// dispute outcomes touch both sides.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkerProfile {
    pub wallet: WalletAddress,
    /// Cached trust score; ground truth is the event history.
    pub reputation_score: u64,
    pub completed_jobs: u32,
    pub total_earned: Amount,
    /// Skills claimed or endorsed, in endorsement order.
    pub skills: Vec<String>,
    /// Skills with at least one verification.
    pub verified_skills: HashSet<String>,
    /// Milestone badges, e.g. "ten-jobs".
    pub badges: Vec<String>,
    /// Rolling on-time-delivery rate in [0, 1], exponentially smoothed.
    pub on_time_rate: f64,
    /// Rolling quality rating, exponentially smoothed.
    pub quality_rating: f64,
    /// Rolling communication rating, exponentially smoothed.
    pub communication_rating: f64,
    /// Rolling average response time in seconds.
    pub avg_response_secs: f64,
    pub created_at: Timestamp,
}

impl WorkerProfile {
    fn new(wallet: WalletAddress, now: Timestamp) -> Self {
        Self {
            wallet,
            reputation_score: 0,
            completed_jobs: 0,
            total_earned: Amount::ZERO,
            skills: Vec::new(),
            verified_skills: HashSet::new(),
            badges: Vec::new(),
            on_time_rate: 0.0,
            quality_rating: 0.0,
            communication_rating: 0.0,
            avg_response_secs: 0.0,
            created_at: now,
        }
    }
}

/// The profile table plus its append-only satellites: per-wallet event
/// histories, the skill-verification trail, and the rating table.
#[derive(Default, Serialize, Deserialize)]
pub struct WorkerProfileStore {
    profiles: HashMap<WalletAddress, WorkerProfile>,
    histories: HashMap<WalletAddress, Vec<ReputationEvent>>,
    verifications: Vec<SkillVerification>,
    ratings: HashMap<(JobId, RatingDirection), JobRating>,
}

impl WorkerProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(&self, wallet: &WalletAddress) -> Option<&WorkerProfile> {
        self.profiles.get(wallet)
    }

    /// Fetch a profile, creating it lazily on first interaction.
    pub fn profile_mut_or_create(
        &mut self,
        wallet: &WalletAddress,
        now: Timestamp,
    ) -> &mut WorkerProfile {
        self.profiles
            .entry(wallet.clone())
            .or_insert_with(|| WorkerProfile::new(wallet.clone(), now))
    }

    /// Current cached score; 0 for unknown wallets.
    pub fn score(&self, wallet: &WalletAddress) -> u64 {
        self.profiles
            .get(wallet)
            .map(|p| p.reputation_score)
            .unwrap_or(0)
    }

    /// The full point-change history for a wallet, oldest first.
    pub fn history(&self, wallet: &WalletAddress) -> &[ReputationEvent] {
        self.histories
            .get(wallet)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn append_event(&mut self, event: ReputationEvent) {
        self.histories
            .entry(event.wallet.clone())
            .or_default()
            .push(event);
    }

    pub fn append_verification(&mut self, verification: SkillVerification) {
        self.verifications.push(verification);
    }

    pub fn verifications(&self) -> &[SkillVerification] {
        &self.verifications
    }

    pub fn rating(&self, job: JobId, direction: RatingDirection) -> Option<&JobRating> {
        self.ratings.get(&(job, direction))
    }

    pub fn insert_rating(&mut self, rating: JobRating) {
        self.ratings
            .insert((rating.job, rating.direction), rating);
    }

    /// Consistency check: the summed history deltas reproduce the cached
    /// score. Holds for every wallet at all times; exposed for audits.
    pub fn history_consistent(&self, wallet: &WalletAddress) -> bool {
        let sum: i64 = self.history(wallet).iter().map(|e| e.delta).sum();
        sum == self.score(wallet) as i64
    }

    /// Serialize the full store for host persistence.
    pub fn save(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap_or_default()
    }

    /// Restore a store from serialized bytes; empty store on decode failure.
    pub fn load(data: &[u8]) -> Self {
        bincode::deserialize(data).unwrap_or_default()
    }
}
