//! Foundation types for Blockwatch.
//!
//! Every other Blockwatch crate depends on `blockwatch-types`.
//!
//! # Key Types
//!
//! - [`BlockHash`]: 256-bit digest committing a block to its content and predecessor
//! - [`Timestamp`]: wall-clock instant stamped on a block at construction

pub mod error;
pub mod hash;
pub mod time;

pub use error::TypeError;
pub use hash::BlockHash;
pub use time::Timestamp;
