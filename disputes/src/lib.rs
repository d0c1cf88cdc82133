//! Dispute arbitration — stake-weighted voting and resolution.
//!
//! Either party of a Filled or Completed job may raise a dispute, freezing
//! the job until independent arbitrators reach quorum. The weighted tally
//! maps onto an escrow instruction (release, refund, or even split) and a
//! pair of reputation deltas, executed exactly once.

pub mod dispute;
pub mod engine;
pub mod error;

pub use dispute::{Dispute, DisputeVote};
pub use engine::{DeadlineAction, DisputeEngine, Tally, TallyDecision};
pub use error::DisputeError;
