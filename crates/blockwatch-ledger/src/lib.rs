//! Append-only block ledger for Blockwatch.
//!
//! This crate is the heart of Blockwatch. It provides:
//! - [`Block`], an immutable record committing to its payload, timestamp and predecessor
//! - [`Ledger`], the in-memory chain with genesis creation, append and verification
//! - [`ValidationReport`], an exhaustive integrity audit of a chain

pub mod block;
pub mod error;
pub mod ledger;
pub mod validation;

pub use block::Block;
pub use error::LedgerError;
pub use ledger::Ledger;
pub use validation::{ValidationReport, Violation, ViolationKind};
