//! The job ledger — owner of the job and application tables.
//!
//! Collaborators are passed in as `&mut` so every operation can call out
//! (escrow, reputation) before committing its own state: a failed external
//! call leaves the ledger exactly as it was.

use crate::application::Application;
use crate::error::JobError;
use crate::job::{Job, JobSpec};
use fairlance_escrow::{EscrowManager, SettlementBackend};
use fairlance_reputation::ReputationEngine;
use fairlance_types::{
    ApplicationId, ApplicationStatus, DisputeOutcome, JobId, JobStatus, Timestamp, WalletAddress,
};
use std::collections::HashMap;
use tracing::info;

/// The job lifecycle state machine.
#[derive(Default)]
pub struct JobLedger {
    jobs: HashMap<JobId, Job>,
    applications: HashMap<ApplicationId, Application>,
    /// Applications per job, in submission order.
    job_applications: HashMap<JobId, Vec<ApplicationId>>,
    next_job_id: u64,
    next_application_id: u64,
}

impl JobLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and record a new job in `Open`. Escrow is not locked yet —
    /// that happens when a worker is accepted.
    pub fn post_job(&mut self, spec: JobSpec, now: Timestamp) -> Result<JobId, JobError> {
        if spec.amount.is_zero() {
            return Err(JobError::InvalidJobSpec(
                "payment amount must be positive".into(),
            ));
        }
        if spec.title.trim().is_empty() {
            return Err(JobError::InvalidJobSpec("title must not be empty".into()));
        }
        if spec.category.trim().is_empty() {
            return Err(JobError::InvalidJobSpec("category must not be empty".into()));
        }
        if !spec.employer.is_valid() {
            return Err(JobError::InvalidJobSpec("employer identity missing".into()));
        }
        if spec.deadline <= now {
            return Err(JobError::InvalidJobSpec(
                "deadline must be in the future".into(),
            ));
        }

        self.next_job_id += 1;
        let id = JobId::new(self.next_job_id);
        self.jobs.insert(id, Job::from_spec(id, spec, now));
        info!(job = %id, "job posted");
        Ok(id)
    }

    /// Record a worker's application to an open job.
    pub fn apply_for_job(
        &mut self,
        job_id: JobId,
        worker: &WalletAddress,
        now: Timestamp,
    ) -> Result<ApplicationId, JobError> {
        let job = self.job_required(job_id)?;
        if job.status != JobStatus::Open {
            return Err(JobError::JobNotOpen {
                job: job_id,
                status: job.status,
            });
        }
        if &job.employer == worker {
            return Err(JobError::OwnJobApplication(job_id));
        }
        let already_applied = self
            .job_applications
            .get(&job_id)
            .map(|ids| {
                ids.iter().any(|id| {
                    self.applications
                        .get(id)
                        .is_some_and(|a| &a.worker == worker)
                })
            })
            .unwrap_or(false);
        if already_applied {
            return Err(JobError::DuplicateApplication {
                job: job_id,
                worker: worker.clone(),
            });
        }

        self.next_application_id += 1;
        let id = ApplicationId::new(self.next_application_id);
        self.applications.insert(
            id,
            Application {
                id,
                job: job_id,
                worker: worker.clone(),
                status: ApplicationStatus::Pending,
                submitted_at: now,
            },
        );
        self.job_applications.entry(job_id).or_default().push(id);
        Ok(id)
    }

    /// Accept one application: lock escrow, fill the job, close siblings.
    ///
    /// The escrow lock is the external call; nothing in the ledger changes
    /// unless it confirms.
    pub fn accept_application<B: SettlementBackend>(
        &mut self,
        escrow: &mut EscrowManager<B>,
        job_id: JobId,
        application_id: ApplicationId,
        actor: &WalletAddress,
        _now: Timestamp,
    ) -> Result<(), JobError> {
        let job = self.job_required(job_id)?;
        if &job.employer != actor {
            return Err(JobError::NotAuthorized {
                job: job_id,
                actor: actor.clone(),
                action: "accept an application for",
            });
        }
        if job.status != JobStatus::Open {
            return Err(JobError::JobNotOpen {
                job: job_id,
                status: job.status,
            });
        }
        let application = self
            .applications
            .get(&application_id)
            .ok_or(JobError::ApplicationNotFound(application_id))?;
        if application.job != job_id {
            return Err(JobError::ApplicationMismatch {
                application: application_id,
                job: job_id,
            });
        }
        if application.status != ApplicationStatus::Pending {
            return Err(JobError::ApplicationClosed {
                application: application_id,
                status: application.status,
            });
        }

        let worker = application.worker.clone();
        let (employer, amount) = (job.employer.clone(), job.amount);
        let lock_ref = escrow.lock(job_id, &employer, amount)?;

        // External call confirmed — commit.
        let job = self.jobs.get_mut(&job_id).expect("job_required checked");
        job.status = JobStatus::Filled;
        job.worker = Some(worker.clone());
        job.escrow_ref = Some(lock_ref);

        for id in self.job_applications.get(&job_id).cloned().unwrap_or_default() {
            let sibling = self.applications.get_mut(&id).expect("indexed application");
            sibling.status = if id == application_id {
                ApplicationStatus::Accepted
            } else {
                ApplicationStatus::Rejected
            };
        }
        info!(job = %job_id, %worker, "application accepted, escrow locked");
        Ok(())
    }

    /// The worker declares the work done: `Filled → Completed`.
    pub fn mark_complete(
        &mut self,
        job_id: JobId,
        actor: &WalletAddress,
        now: Timestamp,
    ) -> Result<(), JobError> {
        let job = self.job_required(job_id)?;
        if job.worker.as_ref() != Some(actor) {
            return Err(JobError::NotAuthorized {
                job: job_id,
                actor: actor.clone(),
                action: "mark completion of",
            });
        }
        if job.status != JobStatus::Filled {
            return Err(JobError::InvalidTransition {
                job: job_id,
                from: job.status,
                action: "mark complete",
            });
        }
        let job = self.jobs.get_mut(&job_id).expect("job_required checked");
        job.status = JobStatus::Completed;
        job.completed_at = Some(now);
        info!(job = %job_id, "work marked complete");
        Ok(())
    }

    /// The employer approves completed work: release escrow, `→ Paid`,
    /// credit the worker's reputation.
    pub fn approve_and_pay<B: SettlementBackend>(
        &mut self,
        escrow: &mut EscrowManager<B>,
        reputation: &mut ReputationEngine,
        job_id: JobId,
        actor: &WalletAddress,
        now: Timestamp,
    ) -> Result<(), JobError> {
        let job = self.job_required(job_id)?;
        if &job.employer != actor {
            return Err(JobError::NotAuthorized {
                job: job_id,
                actor: actor.clone(),
                action: "approve payment for",
            });
        }
        if job.disputed {
            return Err(JobError::JobDisputed(job_id));
        }
        if job.status != JobStatus::Completed {
            return Err(JobError::InvalidTransition {
                job: job_id,
                from: job.status,
                action: "approve and pay",
            });
        }
        let worker = job.worker.clone().expect("completed job has a worker");
        let (amount, on_time) = (job.amount, job.delivered_on_time());

        escrow.release(job_id, &worker)?;

        // External call confirmed — commit.
        let job = self.jobs.get_mut(&job_id).expect("job_required checked");
        job.status = JobStatus::Paid;
        reputation.on_job_completed(&worker, job_id, amount, on_time, now);
        info!(job = %job_id, %worker, "payment approved and released");
        Ok(())
    }

    /// Freeze a job for arbitration. Returns the pre-dispute status, which
    /// the deadline fallback policy keys off.
    pub fn begin_dispute(&mut self, job_id: JobId) -> Result<JobStatus, JobError> {
        let job = self.job_required(job_id)?;
        if job.disputed {
            return Err(JobError::AlreadyDisputed(job_id));
        }
        if !job.status.is_disputable() {
            return Err(JobError::JobNotDisputable {
                job: job_id,
                status: job.status,
            });
        }
        let origin = job.status;
        let job = self.jobs.get_mut(&job_id).expect("job_required checked");
        job.status = JobStatus::Disputed;
        job.disputed = true;
        info!(job = %job_id, origin = ?origin, "job frozen for dispute");
        Ok(origin)
    }

    /// Land a resolved dispute's outcome on the job and lift the freeze.
    pub fn settle_dispute(
        &mut self,
        job_id: JobId,
        outcome: DisputeOutcome,
    ) -> Result<(), JobError> {
        let job = self.job_required(job_id)?;
        if !job.disputed {
            return Err(JobError::NotDisputed(job_id));
        }
        let job = self.jobs.get_mut(&job_id).expect("job_required checked");
        job.disputed = false;
        job.status = match outcome {
            // Funds (fully or partially) went to the worker.
            DisputeOutcome::FavorWorker | DisputeOutcome::Partial => JobStatus::Paid,
            DisputeOutcome::FavorEmployer => JobStatus::Refunded,
        };
        info!(job = %job_id, outcome = ?outcome, "dispute settled on job");
        Ok(())
    }

    /// Record the employer's overall rating on the job card (first write wins).
    pub fn record_rating(&mut self, job_id: JobId, overall: u8) -> Result<(), JobError> {
        let job = self
            .jobs
            .get_mut(&job_id)
            .ok_or(JobError::JobNotFound(job_id))?;
        if job.rating.is_none() {
            job.rating = Some(overall);
        }
        Ok(())
    }

    pub fn job(&self, job_id: JobId) -> Option<&Job> {
        self.jobs.get(&job_id)
    }

    pub fn job_required(&self, job_id: JobId) -> Result<&Job, JobError> {
        self.jobs.get(&job_id).ok_or(JobError::JobNotFound(job_id))
    }

    pub fn application(&self, id: ApplicationId) -> Option<&Application> {
        self.applications.get(&id)
    }

    /// Applications for a job, in submission order.
    pub fn applications_for(&self, job_id: JobId) -> Vec<&Application> {
        self.job_applications
            .get(&job_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.applications.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairlance_escrow::InstantSettlement;
    use fairlance_types::{Amount, MarketParams};

    fn addr(s: &str) -> WalletAddress {
        WalletAddress::new(s)
    }

    fn spec(employer: &str, amount: Amount) -> JobSpec {
        JobSpec {
            title: "Build a parser".into(),
            category: "engineering".into(),
            description: None,
            amount,
            employer: addr(employer),
            deadline: Timestamp::new(10_000),
        }
    }

    fn fixtures() -> (JobLedger, EscrowManager<InstantSettlement>, ReputationEngine) {
        (
            JobLedger::new(),
            EscrowManager::new(InstantSettlement::new()),
            ReputationEngine::new(MarketParams::marketplace_defaults()),
        )
    }

    /// Post a job and accept a worker onto it, returning the job id.
    fn filled_job(
        ledger: &mut JobLedger,
        escrow: &mut EscrowManager<InstantSettlement>,
    ) -> JobId {
        let job = ledger
            .post_job(spec("emp", Amount::from_whole(2)), Timestamp::new(100))
            .unwrap();
        let app = ledger
            .apply_for_job(job, &addr("worker"), Timestamp::new(110))
            .unwrap();
        ledger
            .accept_application(escrow, job, app, &addr("emp"), Timestamp::new(120))
            .unwrap();
        job
    }

    #[test]
    fn post_job_rejects_bad_specs() {
        let mut ledger = JobLedger::new();
        let now = Timestamp::new(100);

        let mut bad = spec("emp", Amount::ZERO);
        assert!(matches!(
            ledger.post_job(bad.clone(), now),
            Err(JobError::InvalidJobSpec(_))
        ));

        bad.amount = Amount::from_whole(1);
        bad.title = "  ".into();
        assert!(matches!(
            ledger.post_job(bad.clone(), now),
            Err(JobError::InvalidJobSpec(_))
        ));

        bad.title = "ok".into();
        bad.deadline = Timestamp::new(50);
        assert!(matches!(
            ledger.post_job(bad, now),
            Err(JobError::InvalidJobSpec(_))
        ));
    }

    #[test]
    fn employer_cannot_apply_to_own_job() {
        let (mut ledger, ..) = fixtures();
        let job = ledger
            .post_job(spec("emp", Amount::from_whole(1)), Timestamp::new(100))
            .unwrap();
        // Case-insensitive identity comparison.
        let err = ledger
            .apply_for_job(job, &addr("EMP"), Timestamp::new(110))
            .unwrap_err();
        assert!(matches!(err, JobError::OwnJobApplication(_)));
    }

    #[test]
    fn duplicate_application_is_refused() {
        let (mut ledger, ..) = fixtures();
        let job = ledger
            .post_job(spec("emp", Amount::from_whole(1)), Timestamp::new(100))
            .unwrap();
        ledger
            .apply_for_job(job, &addr("worker"), Timestamp::new(110))
            .unwrap();
        let err = ledger
            .apply_for_job(job, &addr("worker"), Timestamp::new(111))
            .unwrap_err();
        assert!(matches!(err, JobError::DuplicateApplication { .. }));
    }

    #[test]
    fn acceptance_fills_job_locks_escrow_and_closes_siblings() {
        let (mut ledger, mut escrow, _) = fixtures();
        let job = ledger
            .post_job(spec("emp", Amount::from_whole(2)), Timestamp::new(100))
            .unwrap();
        let first = ledger
            .apply_for_job(job, &addr("alice"), Timestamp::new(110))
            .unwrap();
        let second = ledger
            .apply_for_job(job, &addr("bob"), Timestamp::new(111))
            .unwrap();

        ledger
            .accept_application(&mut escrow, job, first, &addr("emp"), Timestamp::new(120))
            .unwrap();

        let record = ledger.job(job).unwrap();
        assert_eq!(record.status, JobStatus::Filled);
        assert_eq!(record.worker, Some(addr("alice")));
        assert!(record.escrow_ref.is_some());
        assert_eq!(escrow.locked_amount(job), Some(Amount::from_whole(2)));

        assert_eq!(
            ledger.application(first).unwrap().status,
            ApplicationStatus::Accepted
        );
        assert_eq!(
            ledger.application(second).unwrap().status,
            ApplicationStatus::Rejected
        );
    }

    #[test]
    fn second_acceptance_returns_job_not_open() {
        let (mut ledger, mut escrow, _) = fixtures();
        let job = ledger
            .post_job(spec("emp", Amount::from_whole(2)), Timestamp::new(100))
            .unwrap();
        let first = ledger
            .apply_for_job(job, &addr("alice"), Timestamp::new(110))
            .unwrap();
        let second = ledger
            .apply_for_job(job, &addr("bob"), Timestamp::new(111))
            .unwrap();

        ledger
            .accept_application(&mut escrow, job, first, &addr("emp"), Timestamp::new(120))
            .unwrap();
        let err = ledger
            .accept_application(&mut escrow, job, second, &addr("emp"), Timestamp::new(121))
            .unwrap_err();
        assert!(matches!(err, JobError::JobNotOpen { .. }));
    }

    #[test]
    fn failed_escrow_lock_leaves_job_open() {
        let (mut ledger, mut escrow, _) = fixtures();
        let job = ledger
            .post_job(spec("emp", Amount::from_whole(2)), Timestamp::new(100))
            .unwrap();
        let app = ledger
            .apply_for_job(job, &addr("worker"), Timestamp::new(110))
            .unwrap();

        escrow.backend_mut().fail_next("chain congestion");
        let err = ledger
            .accept_application(&mut escrow, job, app, &addr("emp"), Timestamp::new(120))
            .unwrap_err();
        assert!(matches!(err, JobError::Escrow(_)));

        let record = ledger.job(job).unwrap();
        assert_eq!(record.status, JobStatus::Open);
        assert!(record.worker.is_none());
        assert_eq!(
            ledger.application(app).unwrap().status,
            ApplicationStatus::Pending
        );
    }

    #[test]
    fn only_the_worker_may_mark_complete() {
        let (mut ledger, mut escrow, _) = fixtures();
        let job = filled_job(&mut ledger, &mut escrow);

        let err = ledger
            .mark_complete(job, &addr("emp"), Timestamp::new(200))
            .unwrap_err();
        assert!(matches!(err, JobError::NotAuthorized { .. }));

        ledger
            .mark_complete(job, &addr("worker"), Timestamp::new(200))
            .unwrap();
        assert_eq!(ledger.job(job).unwrap().status, JobStatus::Completed);
    }

    #[test]
    fn approve_and_pay_releases_escrow_and_credits_reputation() {
        let (mut ledger, mut escrow, mut reputation) = fixtures();
        let job = filled_job(&mut ledger, &mut escrow);
        ledger
            .mark_complete(job, &addr("worker"), Timestamp::new(200))
            .unwrap();

        ledger
            .approve_and_pay(&mut escrow, &mut reputation, job, &addr("emp"), Timestamp::new(300))
            .unwrap();

        assert_eq!(ledger.job(job).unwrap().status, JobStatus::Paid);
        assert!(escrow.locked_amount(job).is_none());
        // Completed before the deadline: +10 base, +5 on-time.
        assert_eq!(reputation.score(&addr("worker")), 15);
        let history = reputation.history(&addr("worker"));
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].delta, 15);
    }

    #[test]
    fn late_completion_earns_no_bonus() {
        let (mut ledger, mut escrow, mut reputation) = fixtures();
        let job = filled_job(&mut ledger, &mut escrow);
        // Past the 10_000 deadline.
        ledger
            .mark_complete(job, &addr("worker"), Timestamp::new(20_000))
            .unwrap();
        ledger
            .approve_and_pay(&mut escrow, &mut reputation, job, &addr("emp"), Timestamp::new(21_000))
            .unwrap();
        assert_eq!(reputation.score(&addr("worker")), 10);
    }

    #[test]
    fn disputed_job_cannot_be_paid() {
        let (mut ledger, mut escrow, mut reputation) = fixtures();
        let job = filled_job(&mut ledger, &mut escrow);
        ledger
            .mark_complete(job, &addr("worker"), Timestamp::new(200))
            .unwrap();
        ledger.begin_dispute(job).unwrap();

        let err = ledger
            .approve_and_pay(&mut escrow, &mut reputation, job, &addr("emp"), Timestamp::new(300))
            .unwrap_err();
        assert!(matches!(err, JobError::JobDisputed(_)));
    }

    #[test]
    fn begin_dispute_requires_disputable_status() {
        let (mut ledger, ..) = fixtures();
        let job = ledger
            .post_job(spec("emp", Amount::from_whole(1)), Timestamp::new(100))
            .unwrap();
        let err = ledger.begin_dispute(job).unwrap_err();
        assert!(matches!(err, JobError::JobNotDisputable { .. }));
    }

    #[test]
    fn dispute_freeze_and_settle_roundtrip() {
        let (mut ledger, mut escrow, _) = fixtures();
        let job = filled_job(&mut ledger, &mut escrow);

        let origin = ledger.begin_dispute(job).unwrap();
        assert_eq!(origin, JobStatus::Filled);
        assert!(ledger.job(job).unwrap().disputed);
        assert_eq!(ledger.job(job).unwrap().status, JobStatus::Disputed);
        assert!(matches!(
            ledger.begin_dispute(job),
            Err(JobError::AlreadyDisputed(_))
        ));

        ledger
            .settle_dispute(job, DisputeOutcome::FavorEmployer)
            .unwrap();
        let record = ledger.job(job).unwrap();
        assert!(!record.disputed);
        assert_eq!(record.status, JobStatus::Refunded);
    }
}
