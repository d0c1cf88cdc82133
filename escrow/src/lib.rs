//! Escrow custody for job payments.
//!
//! [`EscrowManager`] is the ledger of record for "has this job's money
//! moved". The actual funds live with an external signer/contract
//! collaborator reached through the [`SettlementBackend`] trait; every
//! movement is a single atomic external call, and manager state is only
//! committed after that call confirms.

pub mod error;
pub mod manager;
pub mod settlement;

pub use error::{EscrowError, SettlementError};
pub use manager::{EscrowManager, EscrowRecord, EscrowState};
pub use settlement::{InstantSettlement, Movement, Payment, SettlementBackend, SettlementRef};
