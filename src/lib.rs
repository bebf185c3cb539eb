//! A permutation group library built around stabilizer chains.
//!
//! This crate represents a permutation group implicitly by a small generating
//! set and computes with it through a base and strong generating set (BSGS):
//! a factorization of the group along a sequence of base points that turns
//! exponentially large groups into polynomially sized descriptions.
//!
//! The entry point is [`Grp`]: build a group from generators, then ask for
//! its order, test membership, draw uniform random elements, and derive new
//! groups (stabilizers, intersections) from it.
//!
//! ```
//! use firn::{Grp, Perm};
//!
//! // Sym(5) from a transposition and a 5-cycle.
//! let s5 = Grp::from_generators(vec![
//!     Perm::from_cycle(&[0, 1]).unwrap(),
//!     Perm::from_cycle(&[0, 1, 2, 3, 4]).unwrap(),
//! ])
//! .unwrap();
//! assert_eq!(s5.order(), 120);
//! assert!(s5.contains(&Perm::from_cycle(&[2, 3]).unwrap()));
//! ```

pub mod action;
pub mod base_change;
pub mod cancel;
pub mod chain;
pub mod error;
pub mod group;
pub mod orbit;
pub mod partition;
pub mod perm;
pub mod schreier;
pub mod search;
pub mod transversal;

pub use crate::action::{FaithfulPermutationAction, PermutationAction};
pub use crate::cancel::CancelToken;
pub use crate::error::{Error, Result};
pub use crate::group::Grp;
pub use crate::partition::Partition;
pub use crate::perm::{Indexing, Perm};

/// Set element ("point").
///
/// Points are represented by non-negative integers (`u32`) and are always
/// 0-based internally; the 1-based convention exists only at the textual
/// boundary, see [`Indexing`].
pub type El = u32;
