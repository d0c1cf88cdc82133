//! The Fairlance market service.
//!
//! Wires the four core engines — job ledger, escrow manager, dispute
//! arbitration, reputation — behind one async facade with per-entity lock
//! discipline, so concurrent callers (employer, worker, arbitrators) can
//! hit the same job without racing its state machine.

pub mod config;
pub mod entity_locks;
pub mod error;
pub mod logging;
pub mod service;

pub use config::MarketConfig;
pub use entity_locks::EntityLocks;
pub use error::MarketError;
pub use logging::{init_logging, LogFormat};
pub use service::MarketService;
