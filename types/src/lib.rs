//! Fundamental types for the Fairlance marketplace core.
//!
//! This crate defines the value types shared across every other crate in the
//! workspace: identities, fixed-point amounts, timestamps, record ids, the
//! closed status enumerations, and the tunable market parameters.

pub mod address;
pub mod amount;
pub mod content;
pub mod ids;
pub mod params;
pub mod status;
pub mod time;

pub use address::WalletAddress;
pub use amount::Amount;
pub use content::ContentRef;
pub use ids::{ApplicationId, DisputeId, JobId, RatingId, VoteId};
pub use params::MarketParams;
pub use status::{
    ApplicationStatus, DisputeKind, DisputeOutcome, DisputeStatus, JobStatus, RatingDirection,
};
pub use time::Timestamp;
