//! Key domains for the skip set.
//!
//! The set is generic over `SetKey`, which bundles the total order with an
//! optional fixed-width *score* computed once per key. Integer keys order
//! naturally and need no score; string keys order by a 64-bit hash of their
//! bytes with a byte-wise tie-break, so the score caches the hash in the
//! node and the expensive comparison runs only on the rare collision.
//!
//! Note that string iteration order is hash order, not lexicographic
//! order; hash-first ordering spreads insertion locality uniformly across
//! the list regardless of the shape of the key distribution.

use std::cmp::Ordering;
use std::hash::{BuildHasher, Hasher};

use ahash::RandomState;

/// A key type usable by [`SkipSet`](super::SkipSet).
///
/// `Score` is a fixed-width ordering hint computed once when the node is
/// created and stored alongside the key; [`compare`](SetKey::compare)
/// receives both the cached scores and the keys. The derived order must be
/// total: two keys compare equal only if they are the same key.
pub trait SetKey: Sized + Send + Sync + 'static {
    /// Precomputed ordering hint. Zero-sized for naturally ordered keys.
    type Score: Copy + Send + Sync;

    /// Compute the score for this key. Called once per operation for the
    /// probe and once per node at construction.
    fn score(&self) -> Self::Score;

    /// Total order over (score, key) pairs.
    fn compare(score: &Self::Score, key: &Self, other_score: &Self::Score, other: &Self)
        -> Ordering;
}

impl SetKey for i64 {
    type Score = ();

    #[inline]
    fn score(&self) -> Self::Score {}

    #[inline]
    fn compare(_: &(), key: &Self, _: &(), other: &Self) -> Ordering {
        key.cmp(other)
    }
}

impl SetKey for String {
    type Score = u64;

    #[inline]
    fn score(&self) -> u64 {
        hash64(self.as_bytes())
    }

    #[inline]
    fn compare(score: &u64, key: &Self, other_score: &u64, other: &Self) -> Ordering {
        score
            .cmp(other_score)
            .then_with(|| key.as_bytes().cmp(other.as_bytes()))
    }
}

// Fixed seeds: the hash must be deterministic so that the same string lands
// at the same position in every set in the process.
const SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// Deterministic, uniformly distributed 64-bit hash of a byte sequence.
///
/// Collision resistance is not required; ties are broken by byte order in
/// [`SetKey::compare`].
#[inline]
pub fn hash64(bytes: &[u8]) -> u64 {
    let mut hasher = RandomState::with_seeds(SEEDS[0], SEEDS[1], SEEDS[2], SEEDS[3]).build_hasher();
    hasher.write(bytes);
    hasher.finish()
}
