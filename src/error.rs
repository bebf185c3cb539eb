//! Crate-wide error taxonomy.

use thiserror::Error;

use crate::El;

/// Errors surfaced by fallible operations of this crate.
///
/// Input errors ([`InvalidPermutation`][Error::InvalidPermutation],
/// [`InvalidPartition`][Error::InvalidPartition]) report malformed caller
/// data. [`DomainOverflow`][Error::DomainOverflow] reports a request past an
/// encoding's capacity. [`IncompleteChain`][Error::IncompleteChain] reports a
/// disagreement between a claimed group order and the constructed chain.
/// [`Cancelled`][Error::Cancelled] reports caller cancellation.
/// [`InvariantViolation`][Error::InvariantViolation] reports an internal bug;
/// the offending chain is discarded, never repaired.
#[derive(Debug, Error)]
pub enum Error {
    /// The supplied image table or cycle list is not a bijection.
    #[error("not a permutation: {reason}")]
    InvalidPermutation {
        /// What made the input invalid.
        reason: String,
    },

    /// The supplied block structure does not partition the domain.
    #[error("not a partition of 0..{domain}: {reason}")]
    InvalidPartition {
        /// Size of the domain the partition was declared over.
        domain: usize,
        /// What made the input invalid.
        reason: String,
    },

    /// A point is too large for the requested encoding or domain.
    #[error("point {point} exceeds the encoding capacity {capacity}")]
    DomainOverflow {
        /// The offending point.
        point: u64,
        /// The largest point the encoding can represent.
        capacity: El,
    },

    /// The constructed chain's order disagrees with the claimed group order.
    #[error("chain order {actual} does not match the claimed order {claimed}")]
    IncompleteChain {
        /// Order claimed by the caller.
        claimed: u128,
        /// Order of the chain that was actually built.
        actual: u128,
    },

    /// The operation was cancelled through its [`CancelToken`][crate::cancel::CancelToken].
    #[error("operation cancelled")]
    Cancelled,

    /// An internal chain invariant failed to hold. This is a bug in this
    /// crate, not a user error.
    #[error("internal invariant violated: {reason}")]
    InvariantViolation {
        /// The invariant that failed.
        reason: String,
    },
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
