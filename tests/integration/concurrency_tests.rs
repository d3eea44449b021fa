//! Multi-threaded behavior of the symbol table.
//!
//! The table is a single shared resource guarded by one mutex; these
//! tests check the ref-count arithmetic under contention rather than
//! timing. Thread and iteration counts are sized to finish quickly in CI
//! while still interleaving on any scheduler.

use std::sync::Arc;
use std::thread;

use statname::{StatNameStorage, SymbolTable};

const THREADS: usize = 8;
const ITERATIONS: usize = 250;

#[test]
fn test_concurrent_encode_of_same_name_shares_symbols() {
    let table = Arc::new(SymbolTable::new());

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let table = Arc::clone(&table);
            thread::spawn(move || table.encode("shared.token").unwrap())
        })
        .collect();

    let mut storages: Vec<StatNameStorage> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Every thread resolved the same two tokens.
    assert_eq!(table.num_symbols(), 2);
    for storage in &storages {
        assert_eq!(table.to_string(storage.stat_name()), "shared.token");
    }

    // Each storage owns one count per symbol; releasing all of them
    // empties the table.
    for storage in &mut storages {
        storage.free(&table);
    }
    assert_eq!(table.num_symbols(), 0);
}

#[test]
fn test_concurrent_encode_free_churn_returns_to_baseline() {
    let table = Arc::new(SymbolTable::new());

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                for _ in 0..ITERATIONS {
                    let mut storage = table.encode("shared.token").unwrap();
                    storage.free(&table);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(table.num_symbols(), 0);
}

#[test]
fn test_interleaved_distinct_names_free_cleanly() {
    let table = Arc::new(SymbolTable::new());

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                let name = format!("worker.{i}.rq_total");
                let mut storages = Vec::with_capacity(ITERATIONS);
                for _ in 0..ITERATIONS {
                    storages.push(table.encode(&name).unwrap());
                }
                for storage in &mut storages {
                    storage.free(&table);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(table.num_symbols(), 0);
}

#[test]
fn test_handles_shared_across_threads() {
    let table = Arc::new(SymbolTable::new());
    let storage = Arc::new(table.encode("a.b.c").unwrap());

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let table = Arc::clone(&table);
            let storage = Arc::clone(&storage);
            thread::spawn(move || {
                // Handles are cheap views; reading them takes no ref counts.
                let name = storage.stat_name();
                assert_eq!(table.to_string(name), "a.b.c");
                name.hash()
            })
        })
        .collect();

    let hashes: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(hashes.windows(2).all(|pair| pair[0] == pair[1]));

    Arc::try_unwrap(storage).unwrap().free(&table);
    assert_eq!(table.num_symbols(), 0);
}
