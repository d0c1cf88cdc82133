//! The async service facade over the core engines.
//!
//! Engines are synchronous and single-owner; the service puts each behind a
//! `tokio` mutex and acquires them in a fixed order (jobs → escrow →
//! disputes → reputation) for every operation, holding them across the whole
//! operation so each state change is atomic. Per-entity locks serialize
//! state-changing operations on one job or dispute while leaving unrelated
//! entities fully concurrent. All reputation writes pass through the single
//! reputation mutex, which applies a worker's deltas in acceptance order.

use std::sync::Arc;
use tokio::sync::Mutex;

use fairlance_disputes::{DeadlineAction, Dispute, DisputeEngine, DisputeVote, Tally, TallyDecision};
use fairlance_escrow::{EscrowManager, EscrowRecord, SettlementBackend};
use fairlance_jobs::{Application, Job, JobLedger, JobSpec};
use fairlance_reputation::{RatingScores, ReputationEngine, ReputationEvent, WorkerProfile};
use fairlance_types::{
    Amount, ApplicationId, DisputeId, DisputeKind, JobId, JobStatus, MarketParams, RatingDirection,
    RatingId, Timestamp, VoteId, WalletAddress,
};

use crate::config::MarketConfig;
use crate::entity_locks::EntityLocks;
use crate::error::MarketError;
use tracing::info;

/// The transactional core of the marketplace, safe for concurrent callers.
pub struct MarketService<B: SettlementBackend> {
    jobs: Arc<Mutex<JobLedger>>,
    escrow: Arc<Mutex<EscrowManager<B>>>,
    disputes: Arc<Mutex<DisputeEngine>>,
    reputation: Arc<Mutex<ReputationEngine>>,
    job_locks: Arc<EntityLocks>,
    dispute_locks: Arc<EntityLocks>,
}

impl<B: SettlementBackend> Clone for MarketService<B> {
    fn clone(&self) -> Self {
        Self {
            jobs: Arc::clone(&self.jobs),
            escrow: Arc::clone(&self.escrow),
            disputes: Arc::clone(&self.disputes),
            reputation: Arc::clone(&self.reputation),
            job_locks: Arc::clone(&self.job_locks),
            dispute_locks: Arc::clone(&self.dispute_locks),
        }
    }
}

impl<B: SettlementBackend> MarketService<B> {
    pub fn new(backend: B, params: MarketParams) -> Self {
        info!(
            quorum = params.dispute_quorum_power,
            voting_period_secs = params.dispute_voting_period_secs,
            "market service initialised"
        );
        Self {
            jobs: Arc::new(Mutex::new(JobLedger::new())),
            escrow: Arc::new(Mutex::new(EscrowManager::new(backend))),
            disputes: Arc::new(Mutex::new(DisputeEngine::new(params.clone()))),
            reputation: Arc::new(Mutex::new(ReputationEngine::new(params))),
            job_locks: Arc::new(EntityLocks::new()),
            dispute_locks: Arc::new(EntityLocks::new()),
        }
    }

    /// Build a service from a loaded configuration.
    pub fn from_config(backend: B, config: &MarketConfig) -> Self {
        Self::new(backend, config.params.clone())
    }

    // ── Job lifecycle ───────────────────────────────────────────────────

    pub async fn post_job(&self, spec: JobSpec, now: Timestamp) -> Result<JobId, MarketError> {
        let mut jobs = self.jobs.lock().await;
        Ok(jobs.post_job(spec, now)?)
    }

    pub async fn apply_for_job(
        &self,
        job: JobId,
        worker: &WalletAddress,
        now: Timestamp,
    ) -> Result<ApplicationId, MarketError> {
        let _guard = self.job_locks.acquire(&job.to_string()).await;
        let mut jobs = self.jobs.lock().await;
        Ok(jobs.apply_for_job(job, worker, now)?)
    }

    pub async fn accept_application(
        &self,
        job: JobId,
        application: ApplicationId,
        actor: &WalletAddress,
        now: Timestamp,
    ) -> Result<(), MarketError> {
        let _guard = self.job_locks.acquire(&job.to_string()).await;
        let mut jobs = self.jobs.lock().await;
        let mut escrow = self.escrow.lock().await;
        Ok(jobs.accept_application(&mut escrow, job, application, actor, now)?)
    }

    pub async fn mark_complete(
        &self,
        job: JobId,
        actor: &WalletAddress,
        now: Timestamp,
    ) -> Result<(), MarketError> {
        let _guard = self.job_locks.acquire(&job.to_string()).await;
        let mut jobs = self.jobs.lock().await;
        Ok(jobs.mark_complete(job, actor, now)?)
    }

    pub async fn approve_and_pay(
        &self,
        job: JobId,
        actor: &WalletAddress,
        now: Timestamp,
    ) -> Result<(), MarketError> {
        let _guard = self.job_locks.acquire(&job.to_string()).await;
        let mut jobs = self.jobs.lock().await;
        let mut escrow = self.escrow.lock().await;
        let mut reputation = self.reputation.lock().await;
        Ok(jobs.approve_and_pay(&mut escrow, &mut reputation, job, actor, now)?)
    }

    // ── Disputes ────────────────────────────────────────────────────────

    pub async fn raise_dispute(
        &self,
        job: JobId,
        raiser: &WalletAddress,
        reason: String,
        kind: DisputeKind,
        stake: Amount,
        now: Timestamp,
    ) -> Result<DisputeId, MarketError> {
        let _guard = self.job_locks.acquire(&job.to_string()).await;
        let mut jobs = self.jobs.lock().await;
        let mut disputes = self.disputes.lock().await;
        Ok(disputes.raise(&mut jobs, job, raiser, reason, kind, stake, now)?)
    }

    /// Votes need no per-entity lock: different voters on one dispute may
    /// proceed concurrently, serialized only by the brief engine borrow.
    pub async fn cast_vote(
        &self,
        dispute: DisputeId,
        voter: &WalletAddress,
        favor_plaintiff: bool,
        power: u128,
        reasoning: String,
        now: Timestamp,
    ) -> Result<VoteId, MarketError> {
        let jobs = self.jobs.lock().await;
        let mut disputes = self.disputes.lock().await;
        Ok(disputes.cast_vote(&jobs, dispute, voter, favor_plaintiff, power, reasoning, now)?)
    }

    /// Tally the dispute; if the tally is decisive, resolve it in the same
    /// exclusive section.
    pub async fn tally_dispute(
        &self,
        dispute: DisputeId,
        now: Timestamp,
    ) -> Result<Tally, MarketError> {
        let _guard = self.dispute_locks.acquire(&dispute.to_string()).await;
        let mut jobs = self.jobs.lock().await;
        let mut escrow = self.escrow.lock().await;
        let mut disputes = self.disputes.lock().await;
        let mut reputation = self.reputation.lock().await;

        let tally = disputes.tally(dispute, now)?;
        if let TallyDecision::Decisive(outcome) = tally.decision {
            disputes.resolve(&mut jobs, &mut escrow, &mut reputation, dispute, outcome, now)?;
        }
        Ok(tally)
    }

    /// Apply the deadline policy: resolve at quorum, extend once below it,
    /// then fall back to the status quo. Driven by an external scheduler —
    /// the core does no wall-clock polling of its own.
    pub async fn check_dispute_deadline(
        &self,
        dispute: DisputeId,
        now: Timestamp,
    ) -> Result<DeadlineAction, MarketError> {
        let _guard = self.dispute_locks.acquire(&dispute.to_string()).await;
        let mut jobs = self.jobs.lock().await;
        let mut escrow = self.escrow.lock().await;
        let mut disputes = self.disputes.lock().await;
        let mut reputation = self.reputation.lock().await;
        Ok(disputes.check_deadline(&mut jobs, &mut escrow, &mut reputation, dispute, now)?)
    }

    // ── Reputation ──────────────────────────────────────────────────────

    /// Submit a rating for a finished job. The direction is derived from
    /// which party the rater is; the counterpart is the rated one.
    pub async fn submit_rating(
        &self,
        job: JobId,
        rater: &WalletAddress,
        scores: RatingScores,
        review: String,
        delivered_on_time: bool,
        now: Timestamp,
    ) -> Result<RatingId, MarketError> {
        let _guard = self.job_locks.acquire(&job.to_string()).await;
        let mut jobs = self.jobs.lock().await;
        let mut reputation = self.reputation.lock().await;

        let record = jobs.job_required(job)?;
        if !matches!(
            record.status,
            JobStatus::Completed | JobStatus::Paid | JobStatus::Refunded
        ) {
            return Err(MarketError::RatingBeforeCompletion {
                job,
                status: record.status,
            });
        }
        let employer = record.employer.clone();
        let worker = record
            .worker
            .clone()
            .expect("a completed job always has a worker");

        let (direction, rated) = if rater == &employer {
            (RatingDirection::EmployerRatesWorker, worker)
        } else if rater == &worker {
            (RatingDirection::WorkerRatesEmployer, employer)
        } else {
            return Err(MarketError::NotAParty {
                job,
                actor: rater.clone(),
            });
        };

        let overall = scores.overall;
        let id = reputation.submit_rating(
            job,
            rater,
            &rated,
            direction,
            scores,
            review,
            delivered_on_time,
            now,
        )?;
        if direction == RatingDirection::EmployerRatesWorker {
            jobs.record_rating(job, overall)?;
        }
        Ok(id)
    }

    /// Record a skill endorsement; returns the applied reputation delta.
    pub async fn verify_skill(
        &self,
        worker: &WalletAddress,
        skill: &str,
        verifier: &WalletAddress,
        job: Option<JobId>,
        now: Timestamp,
    ) -> Result<i64, MarketError> {
        let mut reputation = self.reputation.lock().await;
        Ok(reputation.on_skill_verified(worker, skill, verifier, job, now))
    }

    /// Fold an observed response latency into a participant's rolling
    /// average (fed by the messaging collaborator).
    pub async fn record_response_time(
        &self,
        wallet: &WalletAddress,
        secs: u64,
        now: Timestamp,
    ) -> Result<(), MarketError> {
        let mut reputation = self.reputation.lock().await;
        reputation.record_response_time(wallet, secs, now);
        Ok(())
    }

    // ── Snapshot reads ──────────────────────────────────────────────────

    pub async fn job(&self, job: JobId) -> Option<Job> {
        self.jobs.lock().await.job(job).cloned()
    }

    pub async fn applications_for(&self, job: JobId) -> Vec<Application> {
        self.jobs
            .lock()
            .await
            .applications_for(job)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn dispute(&self, dispute: DisputeId) -> Option<Dispute> {
        self.disputes.lock().await.dispute(dispute).cloned()
    }

    pub async fn dispute_votes(&self, dispute: DisputeId) -> Vec<DisputeVote> {
        self.disputes.lock().await.votes(dispute).to_vec()
    }

    pub async fn escrow_record(&self, job: JobId) -> Option<EscrowRecord> {
        self.escrow.lock().await.record(job).cloned()
    }

    pub async fn worker_profile(&self, wallet: &WalletAddress) -> Option<WorkerProfile> {
        self.reputation.lock().await.profile(wallet).cloned()
    }

    pub async fn reputation_history(&self, wallet: &WalletAddress) -> Vec<ReputationEvent> {
        self.reputation.lock().await.history(wallet).to_vec()
    }

    /// Serialized profile-store snapshot for host persistence.
    pub async fn save_profiles(&self) -> Vec<u8> {
        self.reputation.lock().await.store().save()
    }

    /// Run a closure against the settlement backend (test doubles use this
    /// to script failures or inspect movements).
    pub async fn with_backend<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        let mut escrow = self.escrow.lock().await;
        f(escrow.backend_mut())
    }
}
