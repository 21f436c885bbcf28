use std::sync::Arc;
use std::thread;

use crate::data_structures::OrderedSet;

/// Test basic insert, contains, and duplicate rejection
pub fn test_basic_operations<S>(set: &S)
where
    S: OrderedSet<i64>,
{
    // Test insert
    assert!(set.insert(5));
    assert!(set.insert(10));
    assert!(set.insert(3));
    assert!(set.insert(7));
    assert!(set.insert(1));

    // Test duplicate rejection
    assert!(!set.insert(5));
    assert!(!set.insert(10));

    // Test contains
    assert!(set.contains(&1));
    assert!(set.contains(&3));
    assert!(set.contains(&5));
    assert!(set.contains(&7));
    assert!(set.contains(&10));
    assert!(!set.contains(&2));
    assert!(!set.contains(&99));

    // Test delete
    assert!(set.delete(&3));
    assert!(!set.contains(&3));
    assert!(!set.delete(&3)); // Already deleted

    // Verify others still present
    assert!(set.contains(&1));
    assert!(set.contains(&5));
    assert!(set.contains(&7));
    assert!(set.contains(&10));
}

/// Repeated inserts and deletes of one key succeed exactly once per cycle
pub fn test_idempotence<S>()
where
    S: OrderedSet<i64> + Default,
{
    let set = S::default();

    for _ in 0..5 {
        assert!(set.insert(42));
        assert!(!set.insert(42));
        assert!(!set.insert(42));

        assert!(set.delete(&42));
        assert!(!set.delete(&42));
        assert!(!set.delete(&42));
    }

    assert_eq!(set.len(), 0);
}

/// Range visits keys in ascending order with dense zero-based indices
pub fn test_range_ordering<S>()
where
    S: OrderedSet<i64> + Default,
{
    let set = S::default();
    for key in [5, 3, 8, 1, 9] {
        set.insert(key);
    }

    let mut visited = Vec::new();
    set.range(|i, key| {
        visited.push((i, *key));
        true
    });
    assert_eq!(visited, vec![(0, 1), (1, 3), (2, 5), (3, 8), (4, 9)]);
    assert_eq!(set.len(), 5);

    // Stop after the second element
    let mut prefix = Vec::new();
    set.range(|i, key| {
        prefix.push((i, *key));
        i < 1
    });
    assert_eq!(prefix, vec![(0, 1), (1, 3)]);
}

/// len tracks committed inserts minus committed deletes at quiescence
pub fn test_len_law<S>()
where
    S: OrderedSet<i64> + Default,
{
    let set = S::default();
    assert_eq!(set.len(), 0);

    set.insert(10);
    assert_eq!(set.len(), 1);

    set.insert(20);
    assert_eq!(set.len(), 2);

    set.insert(10); // Duplicate
    assert_eq!(set.len(), 2);

    set.delete(&10);
    assert_eq!(set.len(), 1);

    set.delete(&20);
    assert_eq!(set.len(), 0);

    set.delete(&30); // Not found
    assert_eq!(set.len(), 0);
}

/// Test sequential insert and delete pattern
pub fn test_sequential_operations<S>()
where
    S: OrderedSet<i64> + Default,
{
    let set = S::default();

    // Insert 100 elements
    for i in 0..100 {
        assert!(set.insert(i));
    }

    // Verify all exist
    for i in 0..100 {
        assert!(set.contains(&i), "Missing key: {}", i);
    }

    // Remove even numbers
    for i in (0..100).step_by(2) {
        assert!(set.delete(&i));
    }

    // Verify removed
    for i in (0..100).step_by(2) {
        assert!(!set.contains(&i), "Should be removed: {}", i);
    }

    // Verify odd numbers still exist
    for i in (1..100).step_by(2) {
        assert!(set.contains(&i), "Should still exist: {}", i);
    }

    assert_eq!(set.len(), 50);
}

/// Test is_empty functionality
pub fn test_is_empty<S>()
where
    S: OrderedSet<i64> + Default,
{
    let set = S::default();

    assert!(set.is_empty());

    set.insert(1);
    assert!(!set.is_empty());

    set.delete(&1);
    assert!(set.is_empty());
}

/// to_vec returns every member in ascending order
pub fn test_to_vec_sorted<S>()
where
    S: OrderedSet<i64> + Default,
{
    let set = S::default();
    for key in [9, -1, 4, 0, 7, -12] {
        set.insert(key);
    }

    assert_eq!(set.to_vec(), vec![-12, -1, 0, 4, 7, 9]);
}

/// Test concurrent insertions from multiple threads
pub fn test_concurrent_operations<S>()
where
    S: OrderedSet<i64> + Default + 'static,
{
    let set = Arc::new(S::default());
    let num_threads = 4;
    let items_per_thread = 100;

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let set = Arc::clone(&set);
            thread::spawn(move || {
                for i in 0..items_per_thread {
                    let key = thread_id * items_per_thread + i;
                    set.insert(key);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Verify all inserted
    for i in 0..(num_threads * items_per_thread) {
        assert!(set.contains(&i), "Missing key: {}", i);
    }
    assert_eq!(set.len(), (num_threads * items_per_thread) as usize);
}

/// Test concurrent mixed operations (insert, delete, contains, range)
pub fn test_concurrent_mixed_operations<S>()
where
    S: OrderedSet<i64> + Default + 'static,
{
    let set = Arc::new(S::default());
    let num_threads = 6;
    let num_operations = 1000;

    // Pre-populate
    for i in 0..50 {
        set.insert(i * 3);
    }

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let set = Arc::clone(&set);
            thread::spawn(move || {
                for i in 0..num_operations {
                    let key = (thread_id * num_operations + i) % 500;

                    match i % 5 {
                        0 => {
                            set.insert(key);
                        }
                        1 => {
                            set.delete(&key);
                        }
                        2 | 3 => {
                            set.contains(&key);
                        }
                        4 => {
                            // Traversal must stay ascending while mutators run
                            let mut prev = i64::MIN;
                            set.range(|_, &k| {
                                assert!(k > prev, "range regressed: {} after {}", k, prev);
                                prev = k;
                                true
                            });
                        }
                        _ => unreachable!(),
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

/// Test high contention on same keys
pub fn test_high_contention<S>()
where
    S: OrderedSet<i64> + Default + 'static,
{
    let set = Arc::new(S::default());
    let num_threads = 16;
    let range = 100;

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let set = Arc::clone(&set);
            thread::spawn(move || {
                for i in 0..range {
                    set.insert(i);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Should have exactly 'range' items (duplicates rejected)
    for i in 0..range {
        assert!(set.contains(&i), "Missing key: {}", i);
    }
    assert_eq!(set.len(), range as usize);
}
