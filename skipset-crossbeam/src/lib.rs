//! Crossbeam-based memory reclamation for skipset collections.
//!
//! This crate provides `EpochGuard`, an implementation of the `Guard` trait
//! using crossbeam-epoch for memory reclamation.
//!
//! # Usage
//!
//! ```ignore
//! use skipset_crossbeam::EpochIntSet;
//!
//! let set = EpochIntSet::new();
//! set.insert(42);
//! ```

pub mod epoch_guard;

pub use epoch_guard::EpochGuard;

/// Skip set over `i64` keys with epoch-based reclamation.
pub type EpochIntSet = skipset_core::IntSet<EpochGuard>;

/// Skip set over `String` keys with epoch-based reclamation.
pub type EpochStringSet = skipset_core::StringSet<EpochGuard>;
