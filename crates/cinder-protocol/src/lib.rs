//! # Cinder Protocol - Proof-of-Burn City-Token Core
//!
//! Economic core of a Cinder city deployment. Participants burn base
//! currency to mine blocks, retrospectively selected winners mint city
//! tokens on a halving schedule, and token holders lock ("stack") tokens to
//! earn a share of miners' burns.
//!
//! ## Value flow
//!
//! ```text
//! ┌──────────┐  burn at commit   ┌──────────────────┐
//! │  Miner   │ ─────────────────>│ 30% city treasury │
//! │          │                   │ 70% cycle stackers│
//! └──────────┘                   └──────────────────┘
//!      │ winner, after maturity window
//!      v
//! ┌──────────┐  lock for 1-32 cycles  ┌──────────────┐
//! │ Coinbase │ ──────────────────────>│ Stacking pool │
//! └──────────┘                        └──────────────┘
//! ```
//!
//! Every external call is applied atomically: all guards are evaluated
//! before the first state mutation, so a failed call leaves the ledgers
//! untouched. [`SharedProtocol`] wraps the whole state in a single mutex
//! for callers that need an explicit lock boundary.

pub mod emission;
pub mod ledger;
pub mod mining;
pub mod protocol;
pub mod randomness;
pub mod registration;
pub mod stacking;

// Re-exports
pub use emission::EmissionSchedule;
pub use ledger::{TokenLedger, ValueLedger};
pub use mining::{BlockRecord, MiningLedger};
pub use protocol::{CityProtocol, SharedProtocol};
pub use randomness::{ChainRandomness, FixedRandomness, RandomnessSource};
pub use registration::ParticipantRegistry;
pub use stacking::{CycleTotals, StackingEntry, StackingLedger};
