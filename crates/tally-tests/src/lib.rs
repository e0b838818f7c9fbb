//! Integration and property test suite for Tally.
//!
//! Drives the wallet engine end to end against an in-memory index: funding,
//! synchronization, payment building, re-indexing the built transaction and
//! re-synchronizing. Ledger invariants are checked under randomized inputs.

pub mod helpers;
