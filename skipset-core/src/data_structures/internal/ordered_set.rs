//! The `OrderedSet` trait.
//!
//! The trait captures the public operation set of a concurrent ordered set
//! so that the shared test suites in [`crate::common_tests`] and external
//! wrappers can be generic over the implementation and its reclamation
//! strategy.

/// A concurrent set maintaining its elements in ascending order.
///
/// # Consistency
///
/// - `insert`/`delete` return `true` iff this call performed the mutation.
/// - `contains` is non-blocking and linearizes against concurrent
///   mutations: once a successful `insert(k)` has returned, every
///   subsequent `contains(&k)` observes the key until it is deleted.
/// - `range` visits committed members in ascending order but is not a
///   snapshot: members inserted or deleted during the traversal may or may
///   not be observed.
/// - `len` is exact at quiescence and approximate under concurrency; it is
///   not guaranteed to agree with the element count of a concurrent
///   `range`.
///
pub trait OrderedSet<K>: Send + Sync {
    /// Insert a key. Returns `true` iff this call added it.
    ///
    /// If another actor is concurrently inserting the same key, this call
    /// returns `false` only once that insert is visible to all readers.
    fn insert(&self, key: K) -> bool;

    /// Check membership without locking.
    fn contains(&self, key: &K) -> bool;

    /// Remove a key. Returns `true` iff this call removed it.
    fn delete(&self, key: &K) -> bool;

    /// Visit committed members in ascending order as `(index, key)`, where
    /// `index` counts visited members from zero. Stops when the visitor
    /// returns `false`.
    fn range<F>(&self, visitor: F)
    where
        F: FnMut(usize, &K) -> bool;

    /// Number of committed members; approximate under concurrent mutation.
    fn len(&self) -> usize;

    /// True if the set has no committed members.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collect all committed members in ascending order.
    fn to_vec(&self) -> Vec<K>
    where
        K: Clone,
    {
        let mut out = Vec::new();
        self.range(|_, key| {
            out.push(key.clone());
            true
        });
        out
    }
}
