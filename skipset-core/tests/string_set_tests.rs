//! StringSet semantics: hash-first ordering, byte-order tie-breaks, and
//! behavior under forced score collisions.

use std::cmp::Ordering;
use std::sync::Arc;
use std::thread;

use rstest::rstest;
use skipset_core::{DeferredGuard, SetKey, SkipSet, StringSet, hash64};

type DeferredStringSet = StringSet<DeferredGuard>;

/// The comparator the set orders strings by.
fn string_order(a: &str, b: &str) -> Ordering {
    hash64(a.as_bytes())
        .cmp(&hash64(b.as_bytes()))
        .then_with(|| a.as_bytes().cmp(b.as_bytes()))
}

#[test]
fn test_insert_contains_delete() {
    let set = DeferredStringSet::new();

    assert!(set.insert("apple".to_string()));
    assert!(set.insert("banana".to_string()));
    assert!(!set.insert("banana".to_string()));

    assert!(set.contains(&"apple".to_string()));
    assert!(set.contains(&"banana".to_string()));
    assert!(!set.contains(&"cherry".to_string()));

    assert!(set.delete(&"apple".to_string()));
    assert!(!set.delete(&"apple".to_string()));
    assert!(set.contains(&"banana".to_string()));
    assert_eq!(set.len(), 1);
}

#[test]
fn test_range_follows_hash_then_bytes() {
    let set = DeferredStringSet::new();
    let mut words: Vec<String> = ["apple", "banana", "cherry", "durian", "elderberry", "fig"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    for word in &words {
        assert!(set.insert(word.clone()));
    }

    words.sort_by(|a, b| string_order(a, b));
    assert_eq!(set.to_vec(), words);
}

#[rstest]
#[case::two_words(vec!["apple", "banana"])]
#[case::many_words(vec!["kiwi", "lime", "mango", "nectarine", "olive", "peach", "quince"])]
fn test_range_indices_are_dense(#[case] words: Vec<&str>) {
    let set = DeferredStringSet::new();
    for word in &words {
        set.insert(word.to_string());
    }

    let mut expected_index = 0;
    set.range(|i, _| {
        assert_eq!(i, expected_index);
        expected_index += 1;
        true
    });
    assert_eq!(expected_index, words.len());
}

#[test]
fn test_concurrent_string_inserts() {
    let set = Arc::new(DeferredStringSet::new());
    let num_threads = 8;
    let per_thread = 200;

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let set = Arc::clone(&set);
            thread::spawn(move || {
                for i in 0..per_thread {
                    set.insert(format!("key-{}-{}", t, i));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(set.len(), num_threads * per_thread);
    for t in 0..num_threads {
        for i in 0..per_thread {
            assert!(set.contains(&format!("key-{}-{}", t, i)));
        }
    }
}

// ============================================================================
// Forced collisions
// ============================================================================

/// A string key whose score is constant, so every pair of keys collides and
/// ordering falls through to the byte comparison.
#[derive(Clone)]
struct CollidingKey(String);

impl SetKey for CollidingKey {
    type Score = u64;

    fn score(&self) -> u64 {
        42
    }

    fn compare(score: &u64, key: &Self, other_score: &u64, other: &Self) -> Ordering {
        score
            .cmp(other_score)
            .then_with(|| key.0.as_bytes().cmp(other.0.as_bytes()))
    }
}

type CollidingSet = SkipSet<CollidingKey, DeferredGuard>;

#[test]
fn test_colliding_keys_coexist() {
    let set = CollidingSet::new();

    assert!(set.insert(CollidingKey("s1".to_string())));
    assert!(set.insert(CollidingKey("s2".to_string())));
    assert!(!set.insert(CollidingKey("s1".to_string())));

    assert!(set.contains(&CollidingKey("s1".to_string())));
    assert!(set.contains(&CollidingKey("s2".to_string())));
    assert_eq!(set.len(), 2);
}

#[test]
fn test_colliding_keys_iterate_in_byte_order() {
    let set = CollidingSet::new();
    for s in ["delta", "alpha", "echo", "charlie", "bravo"] {
        set.insert(CollidingKey(s.to_string()));
    }

    let visited: Vec<String> = set.iter().map(|k| k.0).collect();
    assert_eq!(visited, vec!["alpha", "bravo", "charlie", "delta", "echo"]);
}

#[test]
fn test_delete_one_colliding_key_keeps_the_other() {
    let set = CollidingSet::new();

    set.insert(CollidingKey("s1".to_string()));
    set.insert(CollidingKey("s2".to_string()));

    assert!(set.delete(&CollidingKey("s1".to_string())));
    assert!(!set.contains(&CollidingKey("s1".to_string())));
    assert!(set.contains(&CollidingKey("s2".to_string())));
    assert_eq!(set.len(), 1);
}
