//! # tally-core
//! Foundation types and collaborator traits for the Tally ledger engine.

pub mod address;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod index;
pub mod script;
pub mod traits;
pub mod types;
