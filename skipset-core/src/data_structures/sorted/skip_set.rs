use std::alloc::{Layout, alloc, dealloc, handle_alloc_error};
use std::cmp;
use std::fmt;
use std::hint;
use std::ptr;
use std::sync::atomic::{AtomicI64, AtomicPtr, AtomicU8, Ordering};

use parking_lot::RawMutex;
use parking_lot::lock_api::RawMutex as _;

use crate::data_structures::OrderedSet;
use crate::data_structures::sorted::SetKey;
use crate::guard::Guard;

const MAX_LEVEL: usize = 16;

type SetNodePtr<K> = *mut SetNode<K>;

// =============================================================================
// LAZY SKIP SET - PROTOCOL OVERVIEW
// =============================================================================
//
// A set over a skip list with per-node locks and lazy deletion. Lookups and
// iteration never lock; inserts and deletes lock the affected predecessors
// (and, for deletes, the victim) bottom-up, validate their search snapshot,
// and retry from the top on any interference.
//
// Level 3:  HEAD ─────────────────────────────────────► 30 ──────────► TAIL
// Level 2:  HEAD ──────────► 10 ─────────────────────► 30 ──────────► TAIL
// Level 1:  HEAD ──────────► 10 ──────────► 20 ──────► 30 ──────────► TAIL
// Level 0:  HEAD ──────────► 10 ──────────► 20 ──────► 30 ──► 40 ───► TAIL
//
// Each node carries two write-once flag bits in a single atomic word:
//
//   FULLY_LINKED - set after every forward pointer of a new node has been
//                  published. A node is a member only once this is set.
//   MARKED       - set under the node's lock by the one deleter that owns
//                  the removal. Never cleared.
//
// INVARIANTS:
// 1. Every level is sorted; a node's tower is a prefix of the levels.
// 2. At most one unmarked fully-linked node per key. A marked node and an
//    in-flight insert of the same key may coexist transiently.
// 3. An edge preds[i].next[i] changes only while preds[i] is locked; a
//    delete additionally holds the victim's lock.
// 4. Lock order: victim before its predecessors, predecessors bottom-up.
//    All acquisition sequences run in non-increasing key order, so the
//    protocol cannot deadlock.
// 5. next[i] is load-Acquire / store-Release. A published node is fully
//    initialized at every slot a reader can follow.
//
// =============================================================================

// ============================================================================
// NodeFlags - packed status word
// ============================================================================

const FULLY_LINKED: u8 = 1 << 0;
const MARKED: u8 = 1 << 1;

/// The two write-once status bits, packed so membership checks read both in
/// a single atomic load.
struct NodeFlags(AtomicU8);

impl NodeFlags {
    fn new() -> Self {
        NodeFlags(AtomicU8::new(0))
    }

    #[inline]
    fn set_fully_linked(&self) {
        self.0.fetch_or(FULLY_LINKED, Ordering::Release);
    }

    #[inline]
    fn set_marked(&self) {
        self.0.fetch_or(MARKED, Ordering::Release);
    }

    #[inline]
    fn is_fully_linked(&self) -> bool {
        self.0.load(Ordering::Acquire) & FULLY_LINKED != 0
    }

    #[inline]
    fn is_marked(&self) -> bool {
        self.0.load(Ordering::Acquire) & MARKED != 0
    }

    /// Fully linked and not marked, decided by one atomic load.
    #[inline]
    fn is_committed(&self) -> bool {
        self.0.load(Ordering::Acquire) & (FULLY_LINKED | MARKED) == FULLY_LINKED
    }
}

// ============================================================================
// SetNode - tower node with per-node lock and packed flags
// ============================================================================

/// A skip set node.
///
/// Uses the flexible array member pattern for efficient memory layout:
/// - Single allocation per node (no separate heap allocation for the tower)
/// - Forward pointers are inline after the struct fields
/// - Layout: [entry, height, lock, flags, next[0..h]] where h = height
///
/// The entry caches the key's score next to the key; sentinels hold no
/// entry and are never compared.
#[repr(C)]
pub struct SetNode<K: SetKey> {
    entry: Option<(K::Score, K)>,
    height: usize,
    lock: RawMutex,
    flags: NodeFlags,
    // Flexible array: pointers are allocated inline after this struct
    pointers: [AtomicPtr<SetNode<K>>; 0],
}

impl<K: SetKey> SetNode<K> {
    /// Calculate layout for a node with given height
    fn layout_for(height: usize) -> Layout {
        Layout::new::<Self>()
            .extend(Layout::array::<AtomicPtr<Self>>(height).unwrap())
            .unwrap()
            .0
            .pad_to_align()
    }

    fn alloc_raw(height: usize) -> *mut Self {
        unsafe {
            let layout = Self::layout_for(height);
            let ptr = alloc(layout) as *mut Self;
            if ptr.is_null() {
                handle_alloc_error(layout);
            }

            ptr::write(&mut (*ptr).height, height);
            ptr::write(&mut (*ptr).lock, RawMutex::INIT);
            ptr::write(&mut (*ptr).flags, NodeFlags::new());

            let pointers_base = (*ptr).pointers.as_ptr() as *mut AtomicPtr<Self>;
            for i in 0..height {
                ptr::write(pointers_base.add(i), AtomicPtr::new(ptr::null_mut()));
            }

            ptr
        }
    }

    /// Allocate and initialize a new node holding a key and its score.
    fn alloc_with_key(key: K, height: usize) -> *mut Self {
        let score = key.score();
        let ptr = Self::alloc_raw(height);
        unsafe {
            ptr::write(&mut (*ptr).entry, Some((score, key)));
        }
        ptr
    }

    /// Allocate and initialize a sentinel node (no entry, full height).
    fn alloc_sentinel() -> *mut Self {
        let ptr = Self::alloc_raw(MAX_LEVEL);
        unsafe {
            ptr::write(&mut (*ptr).entry, None);
        }
        ptr
    }

    /// Deallocate a node.
    ///
    /// # Safety
    /// The pointer must have been allocated by `alloc_with_key` or
    /// `alloc_sentinel`, and must not be reachable or accessed afterwards.
    unsafe fn dealloc_node(ptr: *mut Self) {
        unsafe {
            let height = (*ptr).height;
            let layout = Self::layout_for(height);

            ptr::drop_in_place(&mut (*ptr).entry);

            dealloc(ptr as *mut u8, layout);
        }
    }

    #[inline]
    fn key(&self) -> &K {
        let (_, key) = self
            .entry
            .as_ref()
            .expect("sentinel nodes are never compared");
        key
    }

    /// Order this node's entry against a probe (score, key) pair.
    #[inline]
    fn cmp_probe(&self, score: &K::Score, key: &K) -> cmp::Ordering {
        let (node_score, node_key) = self
            .entry
            .as_ref()
            .expect("sentinel nodes are never compared");
        K::compare(node_score, node_key, score, key)
    }

    #[inline]
    unsafe fn pointer_at(&self, index: usize) -> &AtomicPtr<SetNode<K>> {
        unsafe { &*self.pointers.as_ptr().add(index) }
    }

    /// Load next pointer at level (Acquire ordering)
    #[inline]
    fn load_next(&self, level: usize) -> *mut SetNode<K> {
        unsafe { self.pointer_at(level).load(Ordering::Acquire) }
    }

    /// Store next pointer at level (Release ordering)
    #[inline]
    fn store_next(&self, level: usize, ptr: *mut SetNode<K>) {
        unsafe { self.pointer_at(level).store(ptr, Ordering::Release) }
    }

    #[inline]
    fn lock(&self) {
        self.lock.lock();
    }

    /// # Safety
    /// The current thread must hold this node's lock.
    #[inline]
    unsafe fn unlock(&self) {
        unsafe { self.lock.unlock() }
    }
}

// ============================================================================
// SkipSet - the concurrent ordered set
// ============================================================================

/// A concurrent ordered set backed by a lock-based lazy skip list.
///
/// Membership tests and iteration are wait-free and never lock. Inserts and
/// deletes take the per-node locks of the affected predecessors (deletes
/// also lock the victim), validate, and publish; on interference they retry
/// from a fresh descent. Tuned for read-heavy mixes.
///
/// `K` selects the key domain (see [`SetKey`]); `G` selects the memory
/// reclamation strategy (see [`Guard`]).
///
/// # Example
///
/// ```ignore
/// use skipset_core::{DeferredGuard, IntSet};
///
/// let set: IntSet<DeferredGuard> = IntSet::new();
/// assert!(set.insert(42));
/// assert!(set.contains(&42));
/// assert!(set.delete(&42));
/// ```
pub struct SkipSet<K: SetKey, G: Guard> {
    header: *mut SetNode<K>,
    tail: *mut SetNode<K>,
    length: AtomicI64,
    guard: G,
}

/// Skip set over `i64` keys in natural order.
pub type IntSet<G> = SkipSet<i64, G>;

/// Skip set over `String` keys, ordered by a 64-bit hash of the bytes with
/// a byte-wise tie-break.
pub type StringSet<G> = SkipSet<String, G>;

impl<K: SetKey, G: Guard> SkipSet<K, G> {
    /// Create a new empty skip set.
    pub fn new() -> Self {
        let header = SetNode::<K>::alloc_sentinel();
        let tail = SetNode::<K>::alloc_sentinel();

        unsafe {
            for i in 0..MAX_LEVEL {
                (*header).store_next(i, tail);
            }
            (*header).flags.set_fully_linked();
            (*tail).flags.set_fully_linked();
        }

        SkipSet {
            header,
            tail,
            length: AtomicI64::new(0),
            guard: G::default(),
        }
    }

    /// Generate a random tower height in `[1, MAX_LEVEL]`.
    ///
    /// One RNG word per call: each pair of trailing one-bits promotes the
    /// node one level, giving the geometric distribution with p = 1/4.
    #[inline]
    fn random_level() -> usize {
        let random_bits = fastrand::u64(..);

        let extra_levels = (random_bits.trailing_ones() / 2) as usize;

        (1 + extra_levels).min(MAX_LEVEL)
    }

    /// Top-down descent for `insert`.
    ///
    /// Records `preds[i]`/`succs[i]` per level and stops at the first
    /// (highest) level holding a node equal to the probe. On an early stop
    /// the lower slots keep whatever the previous descent left there;
    /// `insert` only touches them when no match was found.
    fn find_insert(
        &self,
        score: &K::Score,
        key: &K,
        preds: &mut [SetNodePtr<K>; MAX_LEVEL],
        succs: &mut [SetNodePtr<K>; MAX_LEVEL],
    ) -> Option<usize> {
        let mut x = self.header;
        for i in (0..MAX_LEVEL).rev() {
            let mut succ = unsafe { (*x).load_next(i) };
            while succ != self.tail && unsafe { (*succ).cmp_probe(score, key).is_lt() } {
                x = succ;
                succ = unsafe { (*x).load_next(i) };
            }
            preds[i] = x;
            succs[i] = succ;

            if succ != self.tail && unsafe { (*succ).cmp_probe(score, key).is_eq() } {
                return Some(i);
            }
        }
        None
    }

    /// Top-down descent for `delete`.
    ///
    /// Never stops early: fills `preds`/`succs` at every level and reports
    /// the highest level at which the probe was found. The full arrays are
    /// what the unlink phase locks and validates against.
    fn find_delete(
        &self,
        score: &K::Score,
        key: &K,
        preds: &mut [SetNodePtr<K>; MAX_LEVEL],
        succs: &mut [SetNodePtr<K>; MAX_LEVEL],
    ) -> Option<usize> {
        let mut l_found = None;
        let mut x = self.header;
        for i in (0..MAX_LEVEL).rev() {
            let mut succ = unsafe { (*x).load_next(i) };
            while succ != self.tail && unsafe { (*succ).cmp_probe(score, key).is_lt() } {
                x = succ;
                succ = unsafe { (*x).load_next(i) };
            }
            preds[i] = x;
            succs[i] = succ;

            if l_found.is_none()
                && succ != self.tail
                && unsafe { (*succ).cmp_probe(score, key).is_eq() }
            {
                l_found = Some(i);
            }
        }
        l_found
    }

    /// Unlock the distinct predecessors locked so far, highest first.
    /// `preds` may repeat a node across layers; each is unlocked once.
    fn unlock_preds(
        &self,
        preds: &[SetNodePtr<K>; MAX_LEVEL],
        highest_locked: Option<usize>,
    ) {
        let Some(highest) = highest_locked else {
            return;
        };
        let mut prev_pred: SetNodePtr<K> = ptr::null_mut();
        for i in (0..=highest).rev() {
            if preds[i] != prev_pred {
                unsafe { (*preds[i]).unlock() };
                prev_pred = preds[i];
            }
        }
    }

    /// Insert a key. Returns `true` iff this call added it.
    ///
    /// If the key is present but still being linked by a concurrent insert,
    /// this call waits for that insert to become visible before returning
    /// `false`, so a `false` return always means the key is observable.
    pub fn insert(&self, key: K) -> bool {
        let _read = G::pin();

        let height = Self::random_level();
        let score = key.score();
        // The node is built before any lock is taken and reused across
        // validation retries; only the forward links remain to be filled.
        let node = SetNode::alloc_with_key(key, height);

        let mut preds: [SetNodePtr<K>; MAX_LEVEL] = [ptr::null_mut(); MAX_LEVEL];
        let mut succs: [SetNodePtr<K>; MAX_LEVEL] = [ptr::null_mut(); MAX_LEVEL];

        loop {
            let l_found =
                self.find_insert(&score, unsafe { (*node).key() }, &mut preds, &mut succs);
            if let Some(l) = l_found {
                let node_found = succs[l];
                unsafe {
                    if !(*node_found).flags.is_marked() {
                        // Another actor owns this key. Wait out its linking
                        // so the key is visible once we report "present".
                        while !(*node_found).flags.is_fully_linked() {
                            hint::spin_loop();
                        }
                        SetNode::dealloc_node(node);
                        return false;
                    }
                }
                // The resident node is being deleted; retry and race the
                // deleter for the slot.
                continue;
            }

            // Lock the predecessor at each layer, bottom-up, skipping
            // repeats, and validate the snapshot:
            // 1. Neither endpoint was marked since the search.
            // 2. The predecessor still points at the recorded successor.
            let mut highest_locked = None;
            let mut valid = true;
            let mut prev_pred: SetNodePtr<K> = ptr::null_mut();
            for layer in 0..height {
                let pred = preds[layer];
                let succ = succs[layer];
                if pred != prev_pred {
                    unsafe { (*pred).lock() };
                    highest_locked = Some(layer);
                    prev_pred = pred;
                }
                valid = unsafe {
                    !(*pred).flags.is_marked()
                        && !(*succ).flags.is_marked()
                        && (*pred).load_next(layer) == succ
                };
                if !valid {
                    break;
                }
            }
            if !valid {
                self.unlock_preds(&preds, highest_locked);
                continue;
            }

            unsafe {
                // Every slot of the new node is initialized before any
                // predecessor is swung to it; each swing is a release store
                // of an already-complete node.
                for layer in 0..height {
                    (*node).store_next(layer, succs[layer]);
                }
                for layer in 0..height {
                    (*preds[layer]).store_next(layer, node);
                }
                (*node).flags.set_fully_linked();
            }

            self.unlock_preds(&preds, highest_locked);
            self.length.fetch_add(1, Ordering::Relaxed);
            return true;
        }
    }

    /// Check membership. Never locks, never retries.
    pub fn contains(&self, key: &K) -> bool {
        let _read = G::pin();

        let score = key.score();
        let mut x = self.header;
        for i in (0..MAX_LEVEL).rev() {
            let mut next = unsafe { (*x).load_next(i) };
            while next != self.tail && unsafe { (*next).cmp_probe(&score, key).is_lt() } {
                x = next;
                next = unsafe { (*x).load_next(i) };
            }

            if next != self.tail && unsafe { (*next).cmp_probe(&score, key).is_eq() } {
                return unsafe { (*next).flags.is_committed() };
            }
        }
        false
    }

    /// Remove a key. Returns `true` iff this call removed it.
    ///
    /// Two phases: mark the victim under its own lock (the mark decides
    /// which contender owns the removal), then lock the predecessors up to
    /// the victim's top level and splice it out. A validation failure in
    /// the second phase re-descends with the mark kept; no other actor will
    /// touch a marked node.
    pub fn delete(&self, key: &K) -> bool {
        let _read = G::pin();

        let score = key.score();
        let mut victim: SetNodePtr<K> = ptr::null_mut();
        let mut is_marked = false;
        let mut top_layer = 0usize;
        let mut preds: [SetNodePtr<K>; MAX_LEVEL] = [ptr::null_mut(); MAX_LEVEL];
        let mut succs: [SetNodePtr<K>; MAX_LEVEL] = [ptr::null_mut(); MAX_LEVEL];

        loop {
            let l_found = self.find_delete(&score, key, &mut preds, &mut succs);

            // A candidate qualifies only when the search first met it at
            // its top level: a lower-level sighting is a stale view that
            // could let a second deleter mark the same node.
            let eligible = match l_found {
                Some(l) => unsafe {
                    let candidate = succs[l];
                    (*candidate).flags.is_committed() && (*candidate).height - 1 == l
                },
                None => false,
            };

            if is_marked || eligible {
                if !is_marked {
                    let l = l_found.expect("eligible implies a found level");
                    victim = succs[l];
                    top_layer = l;
                    unsafe {
                        (*victim).lock();
                        if (*victim).flags.is_marked() {
                            // Another actor owns the removal.
                            (*victim).unlock();
                            return false;
                        }
                        (*victim).flags.set_marked();
                    }
                    is_marked = true;
                }

                let mut highest_locked = None;
                let mut valid = true;
                let mut prev_pred: SetNodePtr<K> = ptr::null_mut();
                for layer in 0..=top_layer {
                    let pred = preds[layer];
                    let succ = succs[layer];
                    if pred != prev_pred {
                        unsafe { (*pred).lock() };
                        highest_locked = Some(layer);
                        prev_pred = pred;
                    }
                    valid = unsafe {
                        !(*pred).flags.is_marked() && (*pred).load_next(layer) == succ
                    };
                    if !valid {
                        break;
                    }
                }
                if !valid {
                    // Re-descend for fresh predecessors; the victim stays
                    // marked and locked, so the claim on it holds.
                    self.unlock_preds(&preds, highest_locked);
                    continue;
                }

                unsafe {
                    for i in (0..=top_layer).rev() {
                        // The victim is locked and marked: its tower is
                        // frozen, so a plain load of its links suffices.
                        (*preds[i]).store_next(i, (*victim).load_next(i));
                    }
                    (*victim).unlock();
                }
                self.unlock_preds(&preds, highest_locked);
                self.length.fetch_sub(1, Ordering::Relaxed);
                unsafe {
                    self.guard.defer_destroy(victim, SetNode::<K>::dealloc_node);
                }
                return true;
            }

            return false;
        }
    }

    /// Visit committed members in ascending order as `(index, key)`;
    /// `index` counts visited members from zero. Stops when the visitor
    /// returns `false`.
    ///
    /// Not a snapshot: members inserted or deleted during the traversal may
    /// or may not be observed, but every visited key is a committed member
    /// at the moment of its visit.
    pub fn range<F>(&self, mut visitor: F)
    where
        F: FnMut(usize, &K) -> bool,
    {
        let _read = G::pin();

        let mut i = 0usize;
        let mut x = unsafe { (*self.header).load_next(0) };
        while x != self.tail {
            unsafe {
                if !(*x).flags.is_committed() {
                    x = (*x).load_next(0);
                    continue;
                }
                if !visitor(i, (*x).key()) {
                    break;
                }
                x = (*x).load_next(0);
            }
            i += 1;
        }
    }

    /// Number of committed members. Exact at quiescence; under concurrent
    /// mutation the counter may briefly trail the linearization order.
    pub fn len(&self) -> usize {
        self.length.load(Ordering::Relaxed).max(0) as usize
    }

    /// True if the set has no committed members.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// An ascending iterator over committed members, cloning each key.
    /// Same non-snapshot semantics as [`range`](Self::range).
    pub fn iter(&self) -> SkipSetIter<'_, K, G> {
        SkipSetIter {
            _read: G::pin(),
            set: self,
            curr: self.header,
        }
    }

    /// Collect all committed members in ascending order.
    pub fn to_vec(&self) -> Vec<K>
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

impl<K: SetKey, G: Guard> Default for SkipSet<K, G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: SetKey, G: Guard> fmt::Debug for SkipSet<K, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkipSet").field("len", &self.len()).finish()
    }
}

impl<K: SetKey, G: Guard> Drop for SkipSet<K, G> {
    fn drop(&mut self) {
        unsafe {
            let mut curr = (*self.header).load_next(0);
            while curr != self.tail {
                let next = (*curr).load_next(0);
                SetNode::dealloc_node(curr);
                curr = next;
            }
            SetNode::dealloc_node(self.header);
            SetNode::dealloc_node(self.tail);
        }
    }
}

// Safety: the set owns its nodes; all shared mutation goes through atomics
// and per-node locks. SetKey already bounds K by Send + Sync.
unsafe impl<K: SetKey, G: Guard> Send for SkipSet<K, G> {}
unsafe impl<K: SetKey, G: Guard> Sync for SkipSet<K, G> {}

impl<K: SetKey, G: Guard> OrderedSet<K> for SkipSet<K, G> {
    fn insert(&self, key: K) -> bool {
        SkipSet::insert(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        SkipSet::contains(self, key)
    }

    fn delete(&self, key: &K) -> bool {
        SkipSet::delete(self, key)
    }

    fn range<F>(&self, visitor: F)
    where
        F: FnMut(usize, &K) -> bool,
    {
        SkipSet::range(self, visitor)
    }

    fn len(&self) -> usize {
        SkipSet::len(self)
    }
}

// ============================================================================
// Iterator
// ============================================================================

/// Ascending iterator over committed members.
///
/// Holds a read guard for the duration of the iteration; keys are cloned on
/// yield so no reference outlives the guard.
pub struct SkipSetIter<'a, K: SetKey, G: Guard> {
    _read: G::ReadGuard,
    set: &'a SkipSet<K, G>,
    curr: *mut SetNode<K>,
}

impl<K: SetKey + Clone, G: Guard> Iterator for SkipSetIter<'_, K, G> {
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = unsafe { (*self.curr).load_next(0) };
            if next == self.set.tail {
                return None;
            }
            self.curr = next;
            unsafe {
                if (*next).flags.is_committed() {
                    return Some((*next).key().clone());
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
