//! Integration tests for FlatStore
//!
//! Multi-threaded scenarios where every thread opens its own `Engine` on
//! the same table, the way separate worker processes would.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use flatstore::{Config, Engine, Filters};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn open_waiting(path: &Path, columns: &[&str]) -> Engine {
    let config = Config::builder()
        .table_path(path)
        .columns(columns.iter().copied())
        .lock_wait_ms(10_000)
        .build();
    Engine::open(config).unwrap()
}

fn ids_of(engine: &Engine) -> Vec<u64> {
    let envelope = engine.select(&Filters::new());
    assert!(envelope.success, "select failed: {}", envelope.message);
    envelope
        .rows()
        .iter()
        .map(|r| r["system_id"].parse().unwrap())
        .collect()
}

fn setup_temp_path() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("shared.csv");
    (temp_dir, path)
}

// =============================================================================
// Writer/Writer Scenarios
// =============================================================================

#[test]
fn test_two_concurrent_inserts_on_fresh_table() {
    let (_temp, path) = setup_temp_path();
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["Allen", "Bob"]
        .into_iter()
        .map(|name| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let engine = open_waiting(&path, &["name"]);
                barrier.wait();
                engine.insert(&json!({ "name": name }))
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().success);
    }

    let engine = open_waiting(&path, &["name"]);
    assert_eq!(ids_of(&engine), vec![1, 2]);

    let names: BTreeSet<String> = engine
        .select(&Filters::new())
        .rows()
        .iter()
        .map(|r| r["name"].clone())
        .collect();
    assert_eq!(names, BTreeSet::from(["Allen".to_string(), "Bob".to_string()]));
}

#[test]
fn test_many_writers_never_lose_or_duplicate_rows() {
    let (_temp, path) = setup_temp_path();
    let threads = 8;
    let per_thread = 10;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let engine = open_waiting(&path, &["name", "writer"]);
                barrier.wait();
                (0..per_thread)
                    .map(|i| {
                        engine.insert(&json!({ "name": format!("t{}-{}", t, i), "writer": t }))
                    })
                    .filter(|envelope| envelope.success)
                    .count()
            })
        })
        .collect();

    let inserted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(inserted, threads * per_thread);

    let engine = open_waiting(&path, &["name", "writer"]);
    let ids = ids_of(&engine);
    let expected: Vec<u64> = (1..=(threads * per_thread) as u64).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_concurrent_updates_and_deletes() {
    let (_temp, path) = setup_temp_path();
    let engine = open_waiting(&path, &["name", "state"]);
    for i in 1..=20 {
        engine.insert(&json!({ "name": format!("row{}", i), "state": "new" }));
    }

    let barrier = Arc::new(Barrier::new(2));

    let deleter = {
        let path = path.clone();
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            let engine = open_waiting(&path, &["name", "state"]);
            barrier.wait();
            (2..=20)
                .step_by(2)
                .all(|id| engine.delete(&id.to_string()).success)
        })
    };

    let updater = {
        let path = path.clone();
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            let engine = open_waiting(&path, &["name", "state"]);
            barrier.wait();
            (1..=19)
                .step_by(2)
                .all(|id| engine.update(&id.to_string(), &json!({ "state": "done" })).success)
        })
    };

    assert!(deleter.join().unwrap());
    assert!(updater.join().unwrap());

    let rows = engine.select(&Filters::new()).rows().to_vec();
    assert_eq!(rows.len(), 10);
    assert!(rows.iter().all(|r| r["state"] == "done"));
    assert_eq!(ids_of(&engine), (1..=19).step_by(2).collect::<Vec<u64>>());
}

// =============================================================================
// Reader/Writer Scenarios
// =============================================================================

#[test]
fn test_readers_never_observe_partial_writes() {
    let (_temp, path) = setup_temp_path();
    open_waiting(&path, &["payload"]);

    let total = 40;
    // Wide values make a torn write visible as a short or malformed table
    let payload = "x".repeat(4096);

    let writer = {
        let path = path.clone();
        thread::spawn(move || {
            let engine = open_waiting(&path, &["payload"]);
            for _ in 0..total {
                assert!(engine.insert(&json!({ "payload": payload })).success);
            }
        })
    };

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let path = path.clone();
            thread::spawn(move || {
                let engine = open_waiting(&path, &["payload"]);
                let deadline = Instant::now() + Duration::from_secs(60);
                let mut last_seen = 0usize;
                loop {
                    assert!(Instant::now() < deadline, "writer never finished");

                    let envelope = engine.select(&Filters::new());
                    assert!(envelope.success, "select failed: {}", envelope.message);

                    let rows = envelope.rows();
                    // Always a contiguous prefix 1..=n of complete rows
                    for (index, row) in rows.iter().enumerate() {
                        assert_eq!(row["system_id"], (index + 1).to_string());
                        assert_eq!(row["payload"].len(), 4096);
                    }
                    assert!(rows.len() >= last_seen);
                    last_seen = rows.len();

                    if last_seen == total {
                        break;
                    }
                    // Leave gaps so the writer can take the exclusive lock
                    thread::sleep(Duration::from_millis(2));
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn test_fail_fast_contention_is_reported_not_lost() {
    let (_temp, path) = setup_temp_path();
    Engine::open_path(&path, ["name"]).unwrap();

    let threads = 4;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let engine = Engine::open_path(&path, ["name"]).unwrap();
                barrier.wait();
                let mut committed = 0usize;
                for i in 0..25 {
                    let envelope = engine.insert(&json!({ "name": format!("{}-{}", t, i) }));
                    if envelope.success {
                        committed += 1;
                    } else {
                        assert_eq!(envelope.message, "System busy, please try again");
                    }
                }
                committed
            })
        })
        .collect();

    let committed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    let engine = open_waiting(&path, &["name"]);
    let ids = ids_of(&engine);
    assert_eq!(ids.len(), committed);
    assert_eq!(ids, (1..=committed as u64).collect::<Vec<u64>>());
}
