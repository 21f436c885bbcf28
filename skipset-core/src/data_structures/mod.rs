//! Data structures for concurrent sets.
//!
//! # Organization
//!
//! - [`sorted`] - The lock-based lazy skip set and its key domains
//! - [`internal`] - The `OrderedSet` trait
//!
//! # Usage
//!
//! Sets are generic over guard type `G: Guard`:
//!
//! ```ignore
//! use skipset_core::{DeferredGuard, IntSet};
//!
//! let set: IntSet<DeferredGuard> = IntSet::new();
//! set.insert(42);
//! ```

pub(crate) mod internal;
pub mod sorted;

// Re-exports for convenience
pub use internal::OrderedSet;
pub use sorted::{IntSet, SetKey, SkipSet, SkipSetIter, StringSet, hash64};
