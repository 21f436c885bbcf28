//! Guard trait for memory reclamation strategies.
//!
//! This module defines the `Guard` trait that abstracts over different memory
//! reclamation strategies (epoch-based, deferred, etc.).
//!
//! # Design
//!
//! The `Guard` trait enables sets to be generic over their memory
//! reclamation strategy:
//!
//! ```text
//! SkipSet<K, G: Guard>
//!     │
//!     ├── IntSet<EpochGuard>      (production, skipset-crossbeam)
//!     └── IntSet<DeferredGuard>   (testing)
//! ```
//!
//! Lookups and iteration never lock, so the only thing standing between a
//! reader and a concurrently unlinked node is the guard: every read path
//! pins a `ReadGuard` for its duration, and `delete` routes the physically
//! unlinked victim through `defer_destroy` instead of freeing it in place.

mod deferred_guard;

pub use deferred_guard::DeferredGuard;

/// A memory reclamation guard that protects concurrent access to nodes.
///
/// Different implementations provide different trade-offs:
///
/// - **EpochGuard**: Low overhead, batched reclamation (crossbeam-epoch)
/// - **DeferredGuard**: Simple, defers all destruction until guard drops (testing)
///
/// # Safety Contract
///
/// Implementations must ensure that nodes passed to `defer_destroy` are not
/// freed while any pinned `ReadGuard` from before the call is still alive.
///
/// # Design Note
///
/// Guards are stored in collections and must be `Send + Sync`. The guard
/// stored in a collection schedules deferred destruction; actual thread
/// pinning (for epoch-based guards) happens per-operation via `pin`.
///
pub trait Guard: Sized + Default + Send + Sync {
    /// An active guard that protects reads for its lifetime.
    ///
    /// For epoch-based guards, this holds an actual pinned
    /// `crossbeam_epoch::Guard`. For deferred guards, this can be a unit
    /// type `()` since protection is provided by the collection's stored
    /// guard.
    ///
    type ReadGuard: Sized;

    /// Pin an active read guard.
    ///
    /// This creates a guard that protects all node reads until dropped.
    ///
    fn pin() -> Self::ReadGuard;

    /// Schedule a node for deferred destruction.
    ///
    /// The node will be deallocated when it's safe (no readers).
    ///
    /// # Safety
    ///
    /// - `node` must be a valid pointer previously allocated by the collection
    /// - `node` must be unlinked from the collection (not reachable by traversal)
    /// - `dealloc` must be the correct deallocation function for `node`
    ///
    unsafe fn defer_destroy<N>(&self, node: *mut N, dealloc: unsafe fn(*mut N));
}
