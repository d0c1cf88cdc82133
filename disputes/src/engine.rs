//! The arbitration engine.
//!
//! Per-dispute state machine `Open → Voting → Resolved`. `Open` is
//! transient: the voting deadline is computed at raise time and the dispute
//! advances to Voting in the same call.

use crate::dispute::{Dispute, DisputeVote};
use crate::error::DisputeError;
use fairlance_escrow::{EscrowError, EscrowManager, SettlementBackend};
use fairlance_jobs::JobLedger;
use fairlance_reputation::ReputationEngine;
use fairlance_types::{
    Amount, DisputeId, DisputeKind, DisputeOutcome, DisputeStatus, JobId, JobStatus, MarketParams,
    Timestamp, VoteId, WalletAddress,
};
use std::collections::HashMap;
use tracing::info;

/// A weighted vote count for one dispute.
#[derive(Clone, Copy, Debug)]
pub struct Tally {
    pub plaintiff_power: u128,
    pub defendant_power: u128,
    pub quorum: u128,
    pub decision: TallyDecision,
}

/// What a tally concluded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TallyDecision {
    /// Below quorum, or tied before the deadline — keep voting.
    Pending,
    /// Quorum met and decided; safe to resolve with this outcome.
    Decisive(DisputeOutcome),
}

/// What a deadline check did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeadlineAction {
    /// The deadline has not passed yet.
    StillVoting,
    /// Below quorum at the deadline; extended once to the new deadline.
    Extended(Timestamp),
    /// Resolved — by majority, tie, or the status-quo fallback.
    Resolved(DisputeOutcome),
}

/// Manages dispute creation, voter eligibility, tallying, and resolution.
pub struct DisputeEngine {
    disputes: HashMap<DisputeId, Dispute>,
    /// Votes per dispute, in cast order.
    votes: HashMap<DisputeId, Vec<DisputeVote>>,
    /// The dispute (resolved or not) most recently raised per job.
    job_disputes: HashMap<JobId, DisputeId>,
    params: MarketParams,
    next_dispute_id: u64,
    next_vote_id: u64,
}

impl DisputeEngine {
    pub fn new(params: MarketParams) -> Self {
        Self {
            disputes: HashMap::new(),
            votes: HashMap::new(),
            job_disputes: HashMap::new(),
            params,
            next_dispute_id: 0,
            next_vote_id: 0,
        }
    }

    /// Raise a dispute against a Filled or Completed job.
    ///
    /// Freezes the job and opens the voting window. The pre-dispute status
    /// is recorded for the status-quo fallback.
    #[allow(clippy::too_many_arguments)]
    pub fn raise(
        &mut self,
        jobs: &mut JobLedger,
        job_id: JobId,
        raiser: &WalletAddress,
        reason: String,
        kind: DisputeKind,
        stake: Amount,
        now: Timestamp,
    ) -> Result<DisputeId, DisputeError> {
        if let Some(existing) = self.open_dispute_for(job_id) {
            return Err(DisputeError::DuplicateDispute {
                job: job_id,
                existing,
            });
        }
        let job = jobs.job_required(job_id)?;
        if !job.is_party(raiser) {
            return Err(DisputeError::NotAParty {
                job: job_id,
                raiser: raiser.clone(),
            });
        }
        let plaintiff_is_worker = job.worker.as_ref() == Some(raiser);

        // Freezes the job; also re-validates disputability.
        let origin_status = jobs.begin_dispute(job_id)?;

        self.next_dispute_id += 1;
        let id = DisputeId::new(self.next_dispute_id);
        let deadline = now.plus_secs(self.params.dispute_voting_period_secs);
        self.disputes.insert(
            id,
            Dispute {
                id,
                job: job_id,
                raiser: raiser.clone(),
                reason,
                kind,
                status: DisputeStatus::Voting,
                resolution: None,
                stake,
                voting_deadline: deadline,
                origin_status,
                plaintiff_is_worker,
                extended: false,
                raised_at: now,
                resolved_at: None,
            },
        );
        self.job_disputes.insert(job_id, id);
        info!(dispute = %id, job = %job_id, raiser = %raiser, kind = ?kind, "dispute raised");
        Ok(id)
    }

    /// Cast a stake-weighted vote.
    ///
    /// Direct parties to the job cannot vote on their own case; each voter
    /// votes at most once; the window closes at the deadline.
    #[allow(clippy::too_many_arguments)]
    pub fn cast_vote(
        &mut self,
        jobs: &JobLedger,
        dispute_id: DisputeId,
        voter: &WalletAddress,
        favor_plaintiff: bool,
        power: u128,
        reasoning: String,
        now: Timestamp,
    ) -> Result<VoteId, DisputeError> {
        let dispute = self.dispute_required(dispute_id)?;
        if dispute.status != DisputeStatus::Voting || now >= dispute.voting_deadline {
            return Err(DisputeError::VotingClosed(dispute_id));
        }
        let job = jobs.job_required(dispute.job)?;
        if job.is_party(voter) {
            return Err(DisputeError::ConflictOfInterest {
                dispute: dispute_id,
                voter: voter.clone(),
            });
        }
        let votes = self.votes.entry(dispute_id).or_default();
        if votes.iter().any(|v| &v.voter == voter) {
            return Err(DisputeError::DuplicateVote {
                dispute: dispute_id,
                voter: voter.clone(),
            });
        }

        self.next_vote_id += 1;
        let id = VoteId::new(self.next_vote_id);
        votes.push(DisputeVote {
            id,
            dispute: dispute_id,
            voter: voter.clone(),
            favor_plaintiff,
            power,
            reasoning,
            cast_at: now,
        });
        Ok(id)
    }

    /// Sum the weighted votes and decide whether the dispute is resolvable.
    ///
    /// Decisive requires quorum plus a strict weighted majority. An exact
    /// tie at quorum becomes decisive Partial once the deadline passes;
    /// before that it stays Pending so a later vote can break it.
    pub fn tally(&self, dispute_id: DisputeId, now: Timestamp) -> Result<Tally, DisputeError> {
        let dispute = self.dispute_required(dispute_id)?;
        if dispute.status == DisputeStatus::Resolved {
            return Err(DisputeError::AlreadyResolved(dispute_id));
        }

        let (mut plaintiff_power, mut defendant_power) = (0u128, 0u128);
        for vote in self.votes.get(&dispute_id).into_iter().flatten() {
            if vote.favor_plaintiff {
                plaintiff_power = plaintiff_power.saturating_add(vote.power);
            } else {
                defendant_power = defendant_power.saturating_add(vote.power);
            }
        }

        let quorum = self.params.dispute_quorum_power;
        let total = plaintiff_power.saturating_add(defendant_power);
        let decision = if total < quorum {
            TallyDecision::Pending
        } else if plaintiff_power > defendant_power {
            TallyDecision::Decisive(self.side_outcome(dispute, true))
        } else if defendant_power > plaintiff_power {
            TallyDecision::Decisive(self.side_outcome(dispute, false))
        } else if now >= dispute.voting_deadline {
            TallyDecision::Decisive(DisputeOutcome::Partial)
        } else {
            TallyDecision::Pending
        };

        Ok(Tally {
            plaintiff_power,
            defendant_power,
            quorum,
            decision,
        })
    }

    /// Execute an outcome: one escrow instruction, reputation deltas on
    /// both parties, job unfrozen into its terminal status.
    ///
    /// Irreversible and at-most-once: a repeat call is `AlreadyResolved`.
    pub fn resolve<B: SettlementBackend>(
        &mut self,
        jobs: &mut JobLedger,
        escrow: &mut EscrowManager<B>,
        reputation: &mut ReputationEngine,
        dispute_id: DisputeId,
        outcome: DisputeOutcome,
        now: Timestamp,
    ) -> Result<(), DisputeError> {
        let dispute = self.dispute_required(dispute_id)?;
        if dispute.status == DisputeStatus::Resolved {
            return Err(DisputeError::AlreadyResolved(dispute_id));
        }
        let job_id = dispute.job;
        let job = jobs.job_required(job_id)?;
        let worker = job
            .worker
            .clone()
            .expect("a disputed job always has a worker");
        let employer = job.employer.clone();

        let locked = escrow
            .locked_amount(job_id)
            .ok_or(EscrowError::NothingLocked(job_id))?;

        // The external movement happens first; nothing below commits
        // unless it confirms.
        let worker_share = match outcome {
            DisputeOutcome::FavorWorker => {
                escrow.release(job_id, &worker)?;
                locked
            }
            DisputeOutcome::FavorEmployer => {
                escrow.refund(job_id, &employer)?;
                Amount::ZERO
            }
            DisputeOutcome::Partial => {
                let (worker_share, employer_share) = locked.split_even();
                escrow.split_release(job_id, &worker, &employer, worker_share, employer_share)?;
                worker_share
            }
        };

        let dispute = self
            .disputes
            .get_mut(&dispute_id)
            .expect("dispute_required checked");
        dispute.status = DisputeStatus::Resolved;
        dispute.resolution = Some(outcome);
        dispute.resolved_at = Some(now);

        jobs.settle_dispute(job_id, outcome)?;
        reputation.on_dispute_resolved(job_id, &worker, &employer, outcome, worker_share, locked, now);
        info!(dispute = %dispute_id, job = %job_id, outcome = ?outcome, "dispute resolved");
        Ok(())
    }

    /// Apply the deadline policy to a dispute.
    ///
    /// At or past the deadline: resolve if quorum was reached (tie ⇒
    /// Partial); otherwise extend once; otherwise fall back to the status
    /// quo — refund-equivalent of the pre-dispute state.
    pub fn check_deadline<B: SettlementBackend>(
        &mut self,
        jobs: &mut JobLedger,
        escrow: &mut EscrowManager<B>,
        reputation: &mut ReputationEngine,
        dispute_id: DisputeId,
        now: Timestamp,
    ) -> Result<DeadlineAction, DisputeError> {
        let dispute = self.dispute_required(dispute_id)?;
        if dispute.status == DisputeStatus::Resolved {
            return Err(DisputeError::AlreadyResolved(dispute_id));
        }
        if now < dispute.voting_deadline {
            return Ok(DeadlineAction::StillVoting);
        }

        let tally = self.tally(dispute_id, now)?;
        if let TallyDecision::Decisive(outcome) = tally.decision {
            self.resolve(jobs, escrow, reputation, dispute_id, outcome, now)?;
            return Ok(DeadlineAction::Resolved(outcome));
        }

        let dispute = self
            .disputes
            .get_mut(&dispute_id)
            .expect("dispute_required checked");
        if !dispute.extended {
            dispute.extended = true;
            dispute.voting_deadline = now.plus_secs(self.params.dispute_deadline_extension_secs);
            let new_deadline = dispute.voting_deadline;
            info!(dispute = %dispute_id, %new_deadline, "sub-quorum at deadline, extended once");
            return Ok(DeadlineAction::Extended(new_deadline));
        }

        // Second expiry without quorum: deterministic status-quo fallback.
        let outcome = match dispute.origin_status {
            JobStatus::Completed => DisputeOutcome::FavorWorker,
            _ => DisputeOutcome::FavorEmployer,
        };
        info!(dispute = %dispute_id, outcome = ?outcome, "quorum never reached, status-quo fallback");
        self.resolve(jobs, escrow, reputation, dispute_id, outcome, now)?;
        Ok(DeadlineAction::Resolved(outcome))
    }

    pub fn dispute(&self, dispute_id: DisputeId) -> Option<&Dispute> {
        self.disputes.get(&dispute_id)
    }

    /// The unresolved dispute for a job, if one exists.
    pub fn open_dispute_for(&self, job_id: JobId) -> Option<DisputeId> {
        self.job_disputes
            .get(&job_id)
            .filter(|id| {
                self.disputes
                    .get(id)
                    .is_some_and(|d| d.status != DisputeStatus::Resolved)
            })
            .copied()
    }

    /// Votes for a dispute, in cast order.
    pub fn votes(&self, dispute_id: DisputeId) -> &[DisputeVote] {
        self.votes
            .get(&dispute_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn dispute_required(&self, dispute_id: DisputeId) -> Result<&Dispute, DisputeError> {
        self.disputes
            .get(&dispute_id)
            .ok_or(DisputeError::DisputeNotFound(dispute_id))
    }

    /// Map a winning side onto a concrete outcome, given who raised.
    fn side_outcome(&self, dispute: &Dispute, plaintiff_won: bool) -> DisputeOutcome {
        if dispute.plaintiff_is_worker == plaintiff_won {
            DisputeOutcome::FavorWorker
        } else {
            DisputeOutcome::FavorEmployer
        }
    }
}
