//! The skip-list-backed ordered set.
//!
//! The set is parameterized by a guard type `G: Guard` that determines the
//! memory reclamation strategy:
//!
//! - `DeferredGuard`: Testing - defers destruction until guard drops
//! - `EpochGuard`: Production - epoch-based reclamation (crossbeam-epoch)

pub mod set_key;
pub mod skip_set;

pub use set_key::{SetKey, hash64};
pub use skip_set::{IntSet, SkipSet, SkipSetIter, StringSet};
