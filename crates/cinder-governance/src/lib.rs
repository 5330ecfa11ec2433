//! # Cinder Governance
//!
//! Multi-signature authorization layer for the Cinder protocol. Sensitive
//! operations are gated behind a **job** workflow instead of a single owner
//! key:
//!
//! ```text
//! createJob -> addArgument* -> activateJob -> approve/disapprove* -> execute
//! ```
//!
//! A job carries a frozen, typed argument map. Executors re-validate the
//! caller's independently supplied arguments against the frozen ones, so a
//! quorum can never be tricked into authorizing different parameters than
//! the ones it voted on.
//!
//! The contract registry tracks which core contract is current; upgrades
//! retire the old contract and register its replacement in one step.

pub mod auth;
pub mod jobs;
pub mod registry;

// Re-exports
pub use auth::{AuthState, GovernedAction};
pub use jobs::{Job, JobQueue, Vote};
pub use registry::{ContractInfo, ContractRegistry, ContractState};
