//! Epoch-based reclamation for production use.
//!
//! A `delete` splices its victim out of every level while lookups may still
//! be walking over it: read paths never lock, and the victim's tower keeps
//! pointing at live successors so a reader standing on it can finish its
//! descent. `EpochGuard` closes the reclamation window behind that design
//! with crossbeam-epoch: every read path runs pinned to an epoch, retired
//! victims go to the global collector, and a victim is freed only once no
//! thread remains in an epoch from before its unlinking.

use crossbeam_epoch::{self as epoch, Guard as CrossbeamGuard};
use skipset_core::guard::Guard;

/// Memory reclamation through crossbeam-epoch.
///
/// Stateless: the instance a set stores carries no data, every operation
/// works against the process-wide collector. Pinning is a thread-local
/// epoch bump on each read path, and retirement batches deallocations so
/// their cost amortizes across operations. Retired victims can accumulate
/// while any thread stays pinned, the usual epoch trade-off.
#[derive(Clone, Copy, Default)]
pub struct EpochGuard;

impl EpochGuard {
    /// Create a new epoch guard. Stateless, so this is free.
    pub fn new() -> Self {
        EpochGuard
    }
}

impl Guard for EpochGuard {
    /// A pinned crossbeam epoch guard. Holding one keeps every node
    /// retired after the pin alive, which is exactly the window in which
    /// an unlocked descent may still step onto a victim.
    type ReadGuard = CrossbeamGuard;

    fn pin() -> Self::ReadGuard {
        epoch::pin()
    }

    unsafe fn defer_destroy<N>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        // The victim is unlinked but possibly under a reader's feet; hand
        // it to the collector instead of freeing in place. The pin lives
        // only long enough to enqueue the deferred call.
        unsafe {
            epoch::pin().defer_unchecked(move || dealloc(node));
        }
    }
}
