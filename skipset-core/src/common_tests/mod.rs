//! Shared test suites for `OrderedSet` implementations.
//!
//! The functions here are generic over the set implementation (and thereby
//! over the reclamation guard), so the same suites run against the deferred
//! guard in this crate and the epoch guard in `skipset-crossbeam`.

pub mod ordered_set_core_tests;
