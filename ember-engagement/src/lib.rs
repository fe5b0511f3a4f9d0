//! Ember Engagement - Counter Service
//!
//! The operation layer of the engagement subsystem: the only component
//! permitted to mutate post counters. Every mutating operation runs the
//! ledger read, the ledger write, and the counter read-modify-write
//! inside one storage transaction, so the denormalized counters always
//! agree with the ledger at every committed state.

pub mod service;

pub use service::{EngagementService, DEFAULT_MAX_TX_RETRIES};
