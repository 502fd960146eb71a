//! Reputation System
//!
//! Trust scores start at 100 and are lowered by moderation. The access policy
//! reads them; only the ledger writes them.
//!
//! ## Invariants
//!
//! - Score is always within [0, 100]
//! - Unblocking clears the block reason and timestamp
//! - Writes are compare-and-swap on the actor version

mod ledger;

pub use ledger::{
    REPORT_PENALTY, ReputationLedger, apply_block, apply_delta, apply_unblock, clamp_score,
};
