//! The reputation engine — turns marketplace events into score deltas.

use crate::error::ReputationError;
use crate::history::{ReputationEvent, ReputationReason, SkillVerification};
use crate::profile::{WorkerProfile, WorkerProfileStore};
use crate::rating::{JobRating, RatingScores};
use fairlance_types::{
    Amount, DisputeOutcome, JobId, MarketParams, RatingDirection, RatingId, Timestamp,
    WalletAddress,
};
use tracing::debug;

/// Completed-job milestones that earn a badge.
const BADGE_MILESTONES: [(u32, &str); 3] = [(10, "ten-jobs"), (50, "fifty-jobs"), (100, "hundred-jobs")];

/// Computes reputation deltas and maintains the profile store.
///
/// Every write appends to the history first-class: the recorded delta is the
/// applied one (post 0-floor clamp), so `Σ history == score` holds always.
/// Callers must apply a given wallet's events in acceptance order; the engine
/// itself is synchronous and keeps no queue.
pub struct ReputationEngine {
    store: WorkerProfileStore,
    params: MarketParams,
    next_rating_id: u64,
}

impl ReputationEngine {
    pub fn new(params: MarketParams) -> Self {
        Self {
            store: WorkerProfileStore::new(),
            params,
            next_rating_id: 0,
        }
    }

    /// Rebuild an engine around a previously persisted store.
    pub fn with_store(store: WorkerProfileStore, params: MarketParams) -> Self {
        Self {
            store,
            params,
            next_rating_id: 0,
        }
    }

    pub fn store(&self) -> &WorkerProfileStore {
        &self.store
    }

    pub fn score(&self, wallet: &WalletAddress) -> u64 {
        self.store.score(wallet)
    }

    pub fn profile(&self, wallet: &WalletAddress) -> Option<&WorkerProfile> {
        self.store.profile(wallet)
    }

    pub fn history(&self, wallet: &WalletAddress) -> &[ReputationEvent] {
        self.store.history(wallet)
    }

    /// A job completed and was paid out normally.
    pub fn on_job_completed(
        &mut self,
        worker: &WalletAddress,
        job: JobId,
        amount: Amount,
        on_time: bool,
        now: Timestamp,
    ) {
        let mut delta = self.params.completion_points as i64;
        if on_time {
            delta += self.params.on_time_bonus_points as i64;
        }
        self.apply_delta(
            worker,
            Some(job),
            ReputationReason::JobCompleted { on_time },
            delta,
            now,
        );

        let retain_bps = self.params.rating_smoothing_retain_bps;
        let profile = self.store.profile_mut_or_create(worker, now);
        profile.completed_jobs += 1;
        profile.total_earned = profile.total_earned.saturating_add(amount);
        profile.on_time_rate = smooth(
            profile.on_time_rate,
            if on_time { 1.0 } else { 0.0 },
            retain_bps,
        );
        for (milestone, badge) in BADGE_MILESTONES {
            if profile.completed_jobs == milestone {
                profile.badges.push(badge.to_string());
            }
        }
    }

    /// Record a rating and apply its weighted delta to the rated party.
    ///
    /// The delta is `(overall − 3) × weight`, where the weight grows with
    /// the **rater's** own reputation — a fresh, unvetted account moves the
    /// score by at most one point per rating star.
    #[allow(clippy::too_many_arguments)]
    pub fn submit_rating(
        &mut self,
        job: JobId,
        rater: &WalletAddress,
        rated: &WalletAddress,
        direction: RatingDirection,
        scores: RatingScores,
        review: String,
        delivered_on_time: bool,
        now: Timestamp,
    ) -> Result<RatingId, ReputationError> {
        if rater == rated {
            return Err(ReputationError::SelfRating);
        }
        self.validate_scores(&scores)?;
        if self.store.rating(job, direction).is_some() {
            return Err(ReputationError::DuplicateRating { job, direction });
        }

        let weight = self.rater_weight(rater);
        let delta = (scores.overall as i64 - 3) * weight;

        self.next_rating_id += 1;
        let id = RatingId::new(self.next_rating_id);
        self.store.insert_rating(JobRating {
            id,
            job,
            rater: rater.clone(),
            rated: rated.clone(),
            direction,
            scores,
            review,
            delivered_on_time,
            timestamp: now,
        });

        self.apply_delta(
            rated,
            Some(job),
            ReputationReason::RatingReceived { rating: id },
            delta,
            now,
        );

        let retain_bps = self.params.rating_smoothing_retain_bps;
        let profile = self.store.profile_mut_or_create(rated, now);
        profile.quality_rating = smooth(profile.quality_rating, scores.quality as f64, retain_bps);
        profile.communication_rating = smooth(
            profile.communication_rating,
            scores.communication as f64,
            retain_bps,
        );
        if direction == RatingDirection::EmployerRatesWorker {
            profile.on_time_rate = smooth(
                profile.on_time_rate,
                if delivered_on_time { 1.0 } else { 0.0 },
                retain_bps,
            );
        }

        Ok(id)
    }

    /// Record a skill endorsement.
    ///
    /// The first verification of a (worker, skill) pair earns points; repeat
    /// endorsements land in the audit trail with zero contribution. Returns
    /// the applied delta.
    pub fn on_skill_verified(
        &mut self,
        worker: &WalletAddress,
        skill: &str,
        verifier: &WalletAddress,
        job: Option<JobId>,
        now: Timestamp,
    ) -> i64 {
        let profile = self.store.profile_mut_or_create(worker, now);
        let first = profile.verified_skills.insert(skill.to_string());
        if !profile.skills.iter().any(|s| s == skill) {
            profile.skills.push(skill.to_string());
        }

        self.store.append_verification(SkillVerification {
            worker: worker.clone(),
            skill: skill.to_string(),
            verifier: verifier.clone(),
            job,
            first_verification: first,
            timestamp: now,
        });

        if !first {
            return 0;
        }
        self.apply_delta(
            worker,
            job,
            ReputationReason::SkillVerified {
                skill: skill.to_string(),
            },
            self.params.skill_verified_points as i64,
            now,
        )
    }

    /// Apply the reputation consequences of a resolved dispute to both
    /// parties. For `Partial`, the worker's delta is interpolated in
    /// [−partial, +partial] from their share of the locked amount (an even
    /// split moves nobody) and the employer takes the negation.
    #[allow(clippy::too_many_arguments)]
    pub fn on_dispute_resolved(
        &mut self,
        job: JobId,
        worker: &WalletAddress,
        employer: &WalletAddress,
        outcome: DisputeOutcome,
        worker_share: Amount,
        total: Amount,
        now: Timestamp,
    ) {
        let reason = ReputationReason::DisputeResolved { outcome };
        match outcome {
            DisputeOutcome::FavorWorker => {
                self.apply_delta(
                    worker,
                    Some(job),
                    reason.clone(),
                    self.params.dispute_favor_worker_points as i64,
                    now,
                );
                self.apply_delta(
                    employer,
                    Some(job),
                    reason,
                    -(self.params.dispute_employer_penalty_points as i64),
                    now,
                );
            }
            DisputeOutcome::FavorEmployer => {
                self.apply_delta(
                    worker,
                    Some(job),
                    reason,
                    -(self.params.dispute_favor_employer_penalty_points as i64),
                    now,
                );
            }
            DisputeOutcome::Partial => {
                let delta = self.partial_delta(worker_share, total);
                self.apply_delta(worker, Some(job), reason.clone(), delta, now);
                self.apply_delta(employer, Some(job), reason, -delta, now);
            }
        }
    }

    /// Fold an observed response latency (e.g. time to answer an offer)
    /// into the rolling average. No score effect.
    pub fn record_response_time(&mut self, wallet: &WalletAddress, secs: u64, now: Timestamp) {
        let retain_bps = self.params.rating_smoothing_retain_bps;
        let profile = self.store.profile_mut_or_create(wallet, now);
        profile.avg_response_secs = smooth(profile.avg_response_secs, secs as f64, retain_bps);
    }

    /// Apply a requested delta with the 0 floor; record and return the
    /// applied change.
    fn apply_delta(
        &mut self,
        wallet: &WalletAddress,
        job: Option<JobId>,
        reason: ReputationReason,
        requested: i64,
        now: Timestamp,
    ) -> i64 {
        let profile = self.store.profile_mut_or_create(wallet, now);
        let before = profile.reputation_score;
        let after = (before as i64).saturating_add(requested).max(0) as u64;
        let applied = after as i64 - before as i64;
        profile.reputation_score = after;

        debug!(%wallet, requested, applied, score = after, ?reason, "reputation delta applied");
        self.store.append_event(ReputationEvent {
            wallet: wallet.clone(),
            job,
            reason,
            delta: applied,
            score_before: before,
            score_after: after,
            timestamp: now,
        });
        applied
    }

    fn rater_weight(&self, rater: &WalletAddress) -> i64 {
        let per_point = self.params.rating_rep_per_weight_point.max(1);
        let earned = (self.store.score(rater) / per_point) as i64;
        (1 + earned).min(self.params.rating_weight_cap)
    }

    fn partial_delta(&self, worker_share: Amount, total: Amount) -> i64 {
        if total.is_zero() {
            return 0;
        }
        let total_raw = total.raw() as i128;
        let ws = worker_share.raw() as i128;
        let pts = self.params.dispute_partial_points as i128;
        ((2 * ws - total_raw) * pts / total_raw) as i64
    }

    fn validate_scores(&self, scores: &RatingScores) -> Result<(), ReputationError> {
        let checks = [
            ("overall", scores.overall),
            ("quality", scores.quality),
            ("communication", scores.communication),
            ("timeliness", scores.timeliness),
        ];
        for (field, value) in checks {
            if value < self.params.min_rating || value > self.params.max_rating {
                return Err(ReputationError::RatingOutOfRange {
                    field,
                    value,
                    min: self.params.min_rating,
                    max: self.params.max_rating,
                });
            }
        }
        Ok(())
    }
}

/// Exponential smoothing: retain `retain_bps` of the old average.
fn smooth(old: f64, value: f64, retain_bps: u32) -> f64 {
    let retain = retain_bps as f64 / 10_000.0;
    old * retain + value * (1.0 - retain)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ReputationEngine {
        ReputationEngine::new(MarketParams::marketplace_defaults())
    }

    fn addr(s: &str) -> WalletAddress {
        WalletAddress::new(s)
    }

    #[test]
    fn completion_awards_base_and_on_time_bonus() {
        let mut rep = engine();
        let worker = addr("worker");
        rep.on_job_completed(&worker, JobId::new(1), Amount::from_whole(2), true, Timestamp::new(10));

        assert_eq!(rep.score(&worker), 15);
        let profile = rep.profile(&worker).unwrap();
        assert_eq!(profile.completed_jobs, 1);
        assert_eq!(profile.total_earned, Amount::from_whole(2));

        let history = rep.history(&worker);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].delta, 15);
        assert_eq!(history[0].job, Some(JobId::new(1)));
    }

    #[test]
    fn late_completion_skips_the_bonus() {
        let mut rep = engine();
        let worker = addr("worker");
        rep.on_job_completed(&worker, JobId::new(1), Amount::from_whole(1), false, Timestamp::new(10));
        assert_eq!(rep.score(&worker), 10);
    }

    #[test]
    fn fresh_rater_contributes_minimum_weight() {
        let mut rep = engine();
        let id = rep
            .submit_rating(
                JobId::new(1),
                &addr("fresh-employer"),
                &addr("worker"),
                RatingDirection::EmployerRatesWorker,
                RatingScores { overall: 5, quality: 5, communication: 5, timeliness: 5 },
                "great".into(),
                true,
                Timestamp::new(10),
            )
            .unwrap();
        assert_eq!(id, RatingId::new(1));
        // (5 - 3) × weight 1.
        assert_eq!(rep.score(&addr("worker")), 2);
    }

    #[test]
    fn vetted_rater_contributes_scaled_weight() {
        let mut rep = engine();
        let employer = addr("employer");
        // Build the employer's reputation to 150 via skill verifications.
        for skill in ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"] {
            rep.on_skill_verified(&employer, skill, &addr("peer"), None, Timestamp::new(1));
        }
        assert_eq!(rep.score(&employer), 150);

        rep.submit_rating(
            JobId::new(1),
            &employer,
            &addr("worker"),
            RatingDirection::EmployerRatesWorker,
            RatingScores { overall: 5, quality: 4, communication: 4, timeliness: 5 },
            "solid".into(),
            true,
            Timestamp::new(10),
        )
        .unwrap();
        // Weight = 1 + 150/50 = 4; delta = (5 − 3) × 4.
        assert_eq!(rep.score(&addr("worker")), 8);
    }

    #[test]
    fn negative_rating_can_lower_the_score() {
        let mut rep = engine();
        let worker = addr("worker");
        rep.on_job_completed(&worker, JobId::new(1), Amount::from_whole(1), true, Timestamp::new(5));
        assert_eq!(rep.score(&worker), 15);

        rep.submit_rating(
            JobId::new(1),
            &addr("employer"),
            &worker,
            RatingDirection::EmployerRatesWorker,
            RatingScores { overall: 1, quality: 1, communication: 2, timeliness: 1 },
            "poor".into(),
            false,
            Timestamp::new(10),
        )
        .unwrap();
        // (1 − 3) × 1 = −2.
        assert_eq!(rep.score(&worker), 13);
        assert!(rep.store().history_consistent(&worker));
    }

    #[test]
    fn duplicate_rating_direction_is_refused() {
        let mut rep = engine();
        let args = (
            JobId::new(1),
            addr("employer"),
            addr("worker"),
            RatingDirection::EmployerRatesWorker,
        );
        rep.submit_rating(
            args.0,
            &args.1,
            &args.2,
            args.3,
            RatingScores { overall: 4, quality: 4, communication: 4, timeliness: 4 },
            String::new(),
            true,
            Timestamp::new(10),
        )
        .unwrap();

        let err = rep
            .submit_rating(
                args.0,
                &args.1,
                &args.2,
                args.3,
                RatingScores { overall: 2, quality: 2, communication: 2, timeliness: 2 },
                String::new(),
                true,
                Timestamp::new(11),
            )
            .unwrap_err();
        assert!(matches!(err, ReputationError::DuplicateRating { .. }));

        // The opposite direction is still open.
        rep.submit_rating(
            args.0,
            &args.2,
            &args.1,
            RatingDirection::WorkerRatesEmployer,
            RatingScores { overall: 5, quality: 5, communication: 5, timeliness: 5 },
            String::new(),
            true,
            Timestamp::new(12),
        )
        .unwrap();
    }

    #[test]
    fn out_of_range_score_is_refused() {
        let mut rep = engine();
        let err = rep
            .submit_rating(
                JobId::new(1),
                &addr("employer"),
                &addr("worker"),
                RatingDirection::EmployerRatesWorker,
                RatingScores { overall: 6, quality: 4, communication: 4, timeliness: 4 },
                String::new(),
                true,
                Timestamp::new(10),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ReputationError::RatingOutOfRange { field: "overall", value: 6, .. }
        ));
    }

    #[test]
    fn skill_verification_pays_once_per_skill() {
        let mut rep = engine();
        let worker = addr("worker");
        let applied = rep.on_skill_verified(&worker, "rust", &addr("peer"), None, Timestamp::new(1));
        assert_eq!(applied, 15);

        let repeat = rep.on_skill_verified(&worker, "rust", &addr("other"), None, Timestamp::new(2));
        assert_eq!(repeat, 0);
        assert_eq!(rep.score(&worker), 15);

        // Both endorsements are on the audit trail.
        assert_eq!(rep.store().verifications().len(), 2);
        assert!(!rep.store().verifications()[1].first_verification);
        // Only the paying one is a point-change event.
        assert_eq!(rep.history(&worker).len(), 1);
    }

    #[test]
    fn dispute_favor_worker_scores_both_parties() {
        let mut rep = engine();
        let (worker, employer) = (addr("worker"), addr("employer"));
        rep.on_skill_verified(&employer, "ops", &addr("peer"), None, Timestamp::new(1));
        assert_eq!(rep.score(&employer), 15);

        rep.on_dispute_resolved(
            JobId::new(1),
            &worker,
            &employer,
            DisputeOutcome::FavorWorker,
            Amount::from_whole(2),
            Amount::from_whole(2),
            Timestamp::new(10),
        );
        assert_eq!(rep.score(&worker), 20);
        assert_eq!(rep.score(&employer), 5);
    }

    #[test]
    fn dispute_penalty_is_clamped_at_zero_without_drift() {
        let mut rep = engine();
        let (worker, employer) = (addr("worker"), addr("employer"));
        rep.on_job_completed(&worker, JobId::new(1), Amount::from_whole(1), true, Timestamp::new(5));
        assert_eq!(rep.score(&worker), 15);

        rep.on_dispute_resolved(
            JobId::new(2),
            &worker,
            &employer,
            DisputeOutcome::FavorEmployer,
            Amount::ZERO,
            Amount::from_whole(1),
            Timestamp::new(10),
        );
        // Requested −25 floors at 0; the recorded delta is the applied −15.
        assert_eq!(rep.score(&worker), 0);
        let history = rep.history(&worker);
        assert_eq!(history.last().unwrap().delta, -15);
        assert!(rep.store().history_consistent(&worker));
        assert!(rep.store().history_consistent(&employer));
    }

    #[test]
    fn even_partial_split_moves_nobody() {
        let mut rep = engine();
        let (worker, employer) = (addr("worker"), addr("employer"));
        let total = Amount::from_whole(2);
        let (ws, _) = total.split_even();
        rep.on_dispute_resolved(
            JobId::new(1),
            &worker,
            &employer,
            DisputeOutcome::Partial,
            ws,
            total,
            Timestamp::new(10),
        );
        assert_eq!(rep.score(&worker), 0);
        assert_eq!(rep.score(&employer), 0);
    }

    #[test]
    fn lopsided_partial_split_scales_the_delta() {
        let mut rep = engine();
        let (worker, employer) = (addr("worker"), addr("employer"));
        rep.on_dispute_resolved(
            JobId::new(1),
            &worker,
            &employer,
            DisputeOutcome::Partial,
            Amount::new(100),
            Amount::new(100),
            Timestamp::new(10),
        );
        // Full share to the worker ⇒ the full +5.
        assert_eq!(rep.score(&worker), 5);
    }

    #[test]
    fn response_times_fold_into_the_rolling_average() {
        let mut rep = engine();
        let worker = addr("worker");
        rep.record_response_time(&worker, 3600, Timestamp::new(1));
        let profile = rep.profile(&worker).unwrap();
        // First sample smoothed against the zero baseline: 3600 × 0.1.
        assert!((profile.avg_response_secs - 360.0).abs() < 1e-9);
    }

    #[test]
    fn badges_land_on_milestones() {
        let mut rep = engine();
        let worker = addr("worker");
        for i in 0..10 {
            rep.on_job_completed(&worker, JobId::new(i), Amount::from_whole(1), true, Timestamp::new(i as u64));
        }
        let profile = rep.profile(&worker).unwrap();
        assert_eq!(profile.badges, vec!["ten-jobs".to_string()]);
    }
}
