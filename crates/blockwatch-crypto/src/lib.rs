//! Cryptographic primitives for Blockwatch.
//!
//! Provides domain-separated BLAKE3 hashing and hash chain verification.
//! All crypto operations wrap established libraries; no custom cryptography.

pub mod chain;
pub mod hasher;

pub use chain::{ChainError, ChainLink, HashChainVerifier};
pub use hasher::ContentHasher;
