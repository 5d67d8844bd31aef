//! Tests for Engine
//!
//! These tests verify:
//! - Bucket creation, idempotence and root rules
//! - put/get/delete-key semantics and error kinds
//! - Prefix scans (ordering, limits, sub-buckets skipped)
//! - Listing with pagination
//! - Recursive bucket deletion
//! - Command execution
//! - Readers never observe a partial mutation

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use arborkv::bucket::BucketPath;
use arborkv::config::Config;
use arborkv::engine::Engine;
use arborkv::error::ErrorKind;
use arborkv::listing::{EntryKind, PageRequest, PageToken};
use arborkv::mutation;
use arborkv::protocol::{Command, Reply};
use proptest::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .writer_lock_timeout_ms(5000)
        .build();
    let engine = Engine::open(config).unwrap();
    (temp_dir, engine)
}

fn path(text: &str) -> BucketPath {
    BucketPath::parse(text).unwrap()
}

fn keys_of(entries: &[arborkv::scan::ScanEntry]) -> Vec<&[u8]> {
    entries.iter().map(|e| e.key.as_slice()).collect()
}

fn names(engine: &Engine, bucket: &str) -> Vec<Vec<u8>> {
    engine
        .list(&path(bucket), &PageRequest::all())
        .unwrap()
        .items
        .into_iter()
        .map(|item| item.name)
        .collect()
}

/// Bucket with keys {"a","ab","abc","b"}
fn setup_scan_bucket(engine: &Engine) -> BucketPath {
    let bucket = path("scan");
    engine.create_bucket(&bucket).unwrap();
    for key in ["b", "abc", "a", "ab"] {
        engine.put(&bucket, key.as_bytes(), key.to_uppercase().as_bytes()).unwrap();
    }
    bucket
}

// =============================================================================
// Create Bucket Tests
// =============================================================================

#[test]
fn test_create_bucket_with_missing_parents() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&path("a/b/c")).unwrap();

    assert_eq!(names(&engine, "/"), vec![b"a".to_vec()]);
    assert_eq!(names(&engine, "a"), vec![b"b".to_vec()]);
    assert_eq!(names(&engine, "a/b"), vec![b"c".to_vec()]);
    assert!(names(&engine, "a/b/c").is_empty());
}

#[test]
fn test_create_bucket_is_idempotent() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&path("a/b")).unwrap();
    engine.put(&path("a/b"), b"k", b"v").unwrap();
    let buckets = engine.store().bucket_count();
    let lsn = engine.store().last_lsn();

    engine.create_bucket(&path("a/b")).unwrap();

    assert_eq!(engine.store().bucket_count(), buckets);
    assert_eq!(engine.store().last_lsn(), lsn);
    assert_eq!(engine.get(&path("a/b"), b"k").unwrap(), b"v");
}

#[test]
fn test_create_bucket_at_root_is_noop() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&BucketPath::root()).unwrap();
    assert_eq!(engine.store().bucket_count(), 1);
}

#[test]
fn test_create_bucket_through_key_fails() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&path("a")).unwrap();
    engine.put(&path("a"), b"leaf", b"v").unwrap();

    let err = engine.create_bucket(&path("a/leaf/x")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotABucket);
    // Nothing was created
    assert_eq!(engine.store().bucket_count(), 2);
}

// =============================================================================
// Put / Get / Delete Key Tests
// =============================================================================

#[test]
fn test_put_get_roundtrip() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&path("users")).unwrap();
    engine.put(&path("users"), b"alice", b"admin").unwrap();

    assert_eq!(engine.get(&path("users"), b"alice").unwrap(), b"admin");
}

#[test]
fn test_put_overwrites() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&path("users")).unwrap();
    engine.put(&path("users"), b"alice", b"1").unwrap();
    engine.put(&path("users"), b"alice", b"2").unwrap();

    assert_eq!(engine.get(&path("users"), b"alice").unwrap(), b"2");
}

#[test]
fn test_binary_keys_and_empty_value() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&path("bin")).unwrap();
    let key = [0u8, 255, 10, 13];
    engine.put(&path("bin"), &key, b"").unwrap();

    assert_eq!(engine.get(&path("bin"), &key).unwrap(), Vec::<u8>::new());
}

#[test]
fn test_put_into_missing_bucket() {
    let (_temp, engine) = setup_temp_engine();
    let err = engine.put(&path("nope"), b"k", b"v").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BucketNotFound);
    assert_eq!(engine.store().bucket_count(), 1);
}

#[test]
fn test_put_empty_key_rejected() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&path("b")).unwrap();
    let err = engine.put(&path("b"), b"", b"v").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidKey);
}

#[test]
fn test_put_at_root_rejected() {
    let (_temp, engine) = setup_temp_engine();
    let err = engine.put(&BucketPath::root(), b"k", b"v").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidKey);
}

#[test]
fn test_put_over_sub_bucket_rejected() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&path("a/child")).unwrap();

    let err = engine.put(&path("a"), b"child", b"v").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidKey);
    assert_eq!(names(&engine, "a/child"), Vec::<Vec<u8>>::new());
}

#[test]
fn test_get_missing_key() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&path("users")).unwrap();

    let err = engine.get(&path("users"), b"ghost").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // A name holding a bucket is not a value
    engine.create_bucket(&path("users/nested")).unwrap();
    let err = engine.get(&path("users"), b"nested").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_get_in_missing_bucket() {
    let (_temp, engine) = setup_temp_engine();
    let err = engine.get(&path("a/b"), b"k").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BucketNotFound);
}

#[test]
fn test_delete_key() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&path("users")).unwrap();
    engine.put(&path("users"), b"alice", b"1").unwrap();
    engine.put(&path("users"), b"bob", b"2").unwrap();

    engine.delete_key(&path("users"), b"alice").unwrap();

    assert_eq!(
        engine.get(&path("users"), b"alice").unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(names(&engine, "users"), vec![b"bob".to_vec()]);
}

#[test]
fn test_delete_absent_key_is_noop() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&path("users")).unwrap();
    engine.put(&path("users"), b"alice", b"1").unwrap();
    let lsn = engine.store().last_lsn();

    engine.delete_key(&path("users"), b"ghost").unwrap();

    assert_eq!(names(&engine, "users"), vec![b"alice".to_vec()]);
    assert_eq!(engine.store().last_lsn(), lsn);
}

#[test]
fn test_delete_key_naming_bucket_rejected() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&path("a/b")).unwrap();

    let err = engine.delete_key(&path("a"), b"b").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidKey);
    assert_eq!(names(&engine, "a"), vec![b"b".to_vec()]);
}

// =============================================================================
// Delete Bucket Tests
// =============================================================================

#[test]
fn test_delete_bucket_recursive() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&path("app/cache/l1")).unwrap();
    engine.create_bucket(&path("app/cache/l2")).unwrap();
    engine.put(&path("app/cache"), b"hits", b"10").unwrap();
    engine.put(&path("app/cache/l1"), b"k", b"v").unwrap();
    engine.create_bucket(&path("app/config")).unwrap();

    engine.delete_bucket(&path("app/cache")).unwrap();

    assert_eq!(names(&engine, "app"), vec![b"config".to_vec()]);
    // root, app, config
    assert_eq!(engine.store().bucket_count(), 3);
    assert_eq!(
        engine.list(&path("app/cache/l1"), &PageRequest::all()).unwrap_err().kind(),
        ErrorKind::BucketNotFound
    );
}

#[test]
fn test_delete_missing_bucket() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&path("a")).unwrap();

    assert_eq!(
        engine.delete_bucket(&path("a/ghost")).unwrap_err().kind(),
        ErrorKind::BucketNotFound
    );
    assert_eq!(
        engine.delete_bucket(&path("x/y")).unwrap_err().kind(),
        ErrorKind::BucketNotFound
    );
}

#[test]
fn test_delete_bucket_on_key() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&path("a")).unwrap();
    engine.put(&path("a"), b"leaf", b"v").unwrap();

    let err = engine.delete_bucket(&path("a/leaf")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotABucket);
    assert_eq!(engine.get(&path("a"), b"leaf").unwrap(), b"v");
}

#[test]
fn test_delete_root_rejected() {
    let (_temp, engine) = setup_temp_engine();
    let err = engine.delete_bucket(&BucketPath::root()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidKey);
}

#[test]
fn test_recreate_after_delete_is_empty() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&path("tmp")).unwrap();
    engine.put(&path("tmp"), b"k", b"v").unwrap();
    engine.delete_bucket(&path("tmp")).unwrap();
    engine.create_bucket(&path("tmp")).unwrap();

    assert!(names(&engine, "tmp").is_empty());
}

// =============================================================================
// Prefix Scan Tests
// =============================================================================

#[test]
fn test_scan_prefix_examples() {
    let (_temp, engine) = setup_temp_engine();
    let bucket = setup_scan_bucket(&engine);

    let ab = engine.scan_prefix(&bucket, b"ab", None).unwrap();
    assert_eq!(keys_of(&ab), vec![&b"ab"[..], b"abc"]);
    assert_eq!(ab[0].value, b"AB");

    let all = engine.scan_prefix(&bucket, b"", None).unwrap();
    assert_eq!(keys_of(&all), vec![&b"a"[..], b"ab", b"abc", b"b"]);

    assert!(engine.scan_prefix(&bucket, b"z", None).unwrap().is_empty());
}

#[test]
fn test_scan_prefix_limit() {
    let (_temp, engine) = setup_temp_engine();
    let bucket = setup_scan_bucket(&engine);

    let limited = engine.scan_prefix(&bucket, b"a", Some(2)).unwrap();
    assert_eq!(keys_of(&limited), vec![&b"a"[..], b"ab"]);
}

#[test]
fn test_scan_default_limit() {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp.path())
        .default_scan_limit(Some(3))
        .build();
    let engine = Engine::open(config).unwrap();
    engine.create_bucket(&path("many")).unwrap();
    for i in 0..10 {
        engine.put(&path("many"), format!("k{}", i).as_bytes(), b"v").unwrap();
    }

    assert_eq!(engine.scan_prefix(&path("many"), b"k", None).unwrap().len(), 3);
    assert_eq!(engine.scan_prefix(&path("many"), b"k", Some(0)).unwrap().len(), 3);
    assert_eq!(engine.scan_prefix(&path("many"), b"k", Some(5)).unwrap().len(), 5);
}

#[test]
fn test_scan_skips_sub_buckets() {
    let (_temp, engine) = setup_temp_engine();
    let bucket = setup_scan_bucket(&engine);
    engine.create_bucket(&bucket.child("abz")).unwrap();
    engine.put(&bucket.child("abz"), b"abzz", b"deep").unwrap();

    let ab = engine.scan_prefix(&bucket, b"ab", None).unwrap();
    assert_eq!(keys_of(&ab), vec![&b"ab"[..], b"abc"]);
}

#[test]
fn test_scan_missing_bucket() {
    let (_temp, engine) = setup_temp_engine();
    assert_eq!(
        engine.scan_prefix(&path("ghost"), b"", None).unwrap_err().kind(),
        ErrorKind::BucketNotFound
    );
}

// =============================================================================
// Listing Tests
// =============================================================================

#[test]
fn test_list_root_and_kinds() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&path("b")).unwrap();
    engine.create_bucket(&path("a/inner")).unwrap();
    engine.put(&path("a"), b"key", b"v").unwrap();

    let root = engine.list(&BucketPath::root(), &PageRequest::all()).unwrap();
    let root_names: Vec<_> = root.items.iter().map(|i| i.name.clone()).collect();
    assert_eq!(root_names, vec![b"a".to_vec(), b"b".to_vec()]);
    assert!(root.next_page_token.is_none());

    let a = engine.list(&path("a"), &PageRequest::all()).unwrap();
    let kinds: Vec<_> = a.items.iter().map(|i| (i.name.clone(), i.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            (b"inner".to_vec(), EntryKind::Bucket),
            (b"key".to_vec(), EntryKind::Key),
        ]
    );
}

#[test]
fn test_list_pagination() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&path("p")).unwrap();
    for i in 0..10 {
        engine.put(&path("p"), format!("key{:02}", i).as_bytes(), b"v").unwrap();
    }

    let first = engine.list(&path("p"), &PageRequest::first(4)).unwrap();
    let token = first.next_page_token.clone().unwrap();
    let second = engine.list(&path("p"), &PageRequest::after(token, 4)).unwrap();
    let token = second.next_page_token.clone().unwrap();
    let third = engine.list(&path("p"), &PageRequest::after(token, 4)).unwrap();

    assert_eq!(first.items.len(), 4);
    assert_eq!(second.items.len(), 4);
    assert_eq!(third.items.len(), 2);
    assert!(third.next_page_token.is_none());

    let seen: Vec<Vec<u8>> = first
        .items
        .iter()
        .chain(&second.items)
        .chain(&third.items)
        .map(|i| i.name.clone())
        .collect();
    let expected: Vec<Vec<u8>> = (0..10).map(|i| format!("key{:02}", i).into_bytes()).collect();
    assert_eq!(seen, expected);
}

#[test]
fn test_list_exact_page_has_no_token() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&path("p")).unwrap();
    for key in ["a", "b", "c", "d"] {
        engine.put(&path("p"), key.as_bytes(), b"v").unwrap();
    }

    let page = engine.list(&path("p"), &PageRequest::first(4)).unwrap();
    assert_eq!(page.items.len(), 4);
    assert!(page.next_page_token.is_none());
}

#[test]
fn test_list_resumes_after_deleted_token() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&path("p")).unwrap();
    for key in ["a", "b", "c", "d"] {
        engine.put(&path("p"), key.as_bytes(), b"v").unwrap();
    }

    let first = engine.list(&path("p"), &PageRequest::first(2)).unwrap();
    let token = first.next_page_token.unwrap();
    assert_eq!(token, PageToken::from_bytes(b"b".to_vec()));

    // The token's own key vanishes between calls
    engine.delete_key(&path("p"), b"b").unwrap();
    let next = engine.list(&path("p"), &PageRequest::after(token, 2)).unwrap();
    let next_names: Vec<_> = next.items.iter().map(|i| i.name.clone()).collect();
    assert_eq!(next_names, vec![b"c".to_vec(), b"d".to_vec()]);
}

#[test]
fn test_list_page_size_capped() {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp.path())
        .max_page_size(3)
        .build();
    let engine = Engine::open(config).unwrap();
    engine.create_bucket(&path("p")).unwrap();
    for i in 0..5 {
        engine.put(&path("p"), format!("{}", i).as_bytes(), b"v").unwrap();
    }

    let page = engine.list(&path("p"), &PageRequest::first(100)).unwrap();
    assert_eq!(page.items.len(), 3);
    assert!(page.next_page_token.is_some());
}

#[test]
fn test_list_key_is_not_a_bucket() {
    let (_temp, engine) = setup_temp_engine();
    engine.create_bucket(&path("a")).unwrap();
    engine.put(&path("a"), b"leaf", b"v").unwrap();

    assert_eq!(
        engine.list(&path("a/leaf"), &PageRequest::all()).unwrap_err().kind(),
        ErrorKind::NotABucket
    );
}

// =============================================================================
// Command Execution Tests
// =============================================================================

#[test]
fn test_execute_commands() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(engine.execute(Command::Ping).unwrap(), Reply::Pong);
    assert_eq!(
        engine.execute(Command::CreateBucket { path: path("c") }).unwrap(),
        Reply::Done
    );
    assert_eq!(
        engine
            .execute(Command::Put {
                path: path("c"),
                key: b"k".to_vec(),
                value: b"v".to_vec(),
            })
            .unwrap(),
        Reply::Done
    );
    assert_eq!(
        engine
            .execute(Command::Get {
                path: path("c"),
                key: b"k".to_vec(),
            })
            .unwrap(),
        Reply::Value(b"v".to_vec())
    );

    match engine
        .execute(Command::List {
            path: path("c"),
            page_token: None,
            page_size: Some(10),
        })
        .unwrap()
    {
        Reply::Listing(page) => assert_eq!(page.items.len(), 1),
        other => panic!("Expected listing, got {:?}", other),
    }

    match engine
        .execute(Command::PrefixScan {
            path: path("c"),
            prefix: b"k".to_vec(),
            limit: None,
        })
        .unwrap()
    {
        Reply::Entries(entries) => assert_eq!(entries.len(), 1),
        other => panic!("Expected entries, got {:?}", other),
    }

    engine
        .execute(Command::DeleteKey {
            path: path("c"),
            key: b"k".to_vec(),
        })
        .unwrap();
    engine
        .execute(Command::DeleteBucket { path: path("c") })
        .unwrap();
    assert_eq!(engine.store().bucket_count(), 1);
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_data_survives_reopen() {
    let temp = TempDir::new().unwrap();
    {
        let engine = Engine::open_path(temp.path()).unwrap();
        engine.create_bucket(&path("a/b")).unwrap();
        engine.put(&path("a/b"), b"k", b"v").unwrap();
        engine.close().unwrap();
    }

    let engine = Engine::open_path(temp.path()).unwrap();
    assert_eq!(engine.get(&path("a/b"), b"k").unwrap(), b"v");
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_scans_never_see_partial_mutation() {
    let (_temp, engine) = setup_temp_engine();
    let engine = Arc::new(engine);
    let bucket = path("pairs");
    engine.create_bucket(&bucket).unwrap();
    engine.put(&bucket, b"left", b"0").unwrap();
    engine.put(&bucket, b"right", b"0").unwrap();

    let stop = Arc::new(AtomicBool::new(false));

    // Writer: bump both keys in one transaction
    let writer = {
        let engine = Arc::clone(&engine);
        let stop = Arc::clone(&stop);
        let bucket = bucket.clone();
        thread::spawn(move || {
            for i in 1..=50u32 {
                let value = i.to_string();
                engine
                    .store()
                    .update(|tx| {
                        mutation::put(tx, &bucket, b"left", value.as_bytes())?;
                        mutation::put(tx, &bucket, b"right", value.as_bytes())
                    })
                    .unwrap();
            }
            stop.store(true, Ordering::SeqCst);
        })
    };

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let stop = Arc::clone(&stop);
            let bucket = bucket.clone();
            thread::spawn(move || {
                while !stop.load(Ordering::SeqCst) {
                    let entries = engine.scan_prefix(&bucket, b"", None).unwrap();
                    assert_eq!(entries.len(), 2);
                    assert_eq!(entries[0].value, entries[1].value);
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
fn test_concurrent_scans_identical_without_writes() {
    let (_temp, engine) = setup_temp_engine();
    let engine = Arc::new(engine);
    let bucket = setup_scan_bucket(&engine);
    let expected = engine.scan_prefix(&bucket, b"a", None).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let bucket = bucket.clone();
            thread::spawn(move || engine.scan_prefix(&bucket, b"a", None).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_scan_matches_filter(
        entries in prop::collection::btree_map(
            prop::collection::vec(0u8..4, 1..5),
            prop::collection::vec(any::<u8>(), 0..8),
            0..24,
        ),
        prefix in prop::collection::vec(0u8..4, 0..3),
    ) {
        let (_temp, engine) = setup_temp_engine();
        let bucket = path("prop");
        engine.create_bucket(&bucket).unwrap();
        for (key, value) in &entries {
            engine.put(&bucket, key, value).unwrap();
        }

        let scanned: Vec<(Vec<u8>, Vec<u8>)> = engine
            .scan_prefix(&bucket, &prefix, Some(usize::MAX))
            .unwrap()
            .into_iter()
            .map(|e| (e.key, e.value))
            .collect();
        let expected: Vec<(Vec<u8>, Vec<u8>)> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        prop_assert_eq!(scanned, expected);
    }

    #[test]
    fn prop_create_bucket_idempotent(
        segments in prop::collection::vec("[a-z]{1,4}", 1..4),
    ) {
        let (_temp, engine) = setup_temp_engine();
        let bucket = BucketPath::new(segments).unwrap();

        engine.create_bucket(&bucket).unwrap();
        let count = engine.store().bucket_count();
        let lsn = engine.store().last_lsn();
        engine.create_bucket(&bucket).unwrap();

        prop_assert_eq!(engine.store().bucket_count(), count);
        prop_assert_eq!(engine.store().last_lsn(), lsn);
    }

    #[test]
    fn prop_pages_partition_listing(
        count in 0usize..30,
        page_size in 1usize..7,
    ) {
        let (_temp, engine) = setup_temp_engine();
        let bucket = path("pages");
        engine.create_bucket(&bucket).unwrap();
        let mut expected = BTreeMap::new();
        for i in 0..count {
            let key = format!("k{:03}", i).into_bytes();
            engine.put(&bucket, &key, b"v").unwrap();
            expected.insert(key, ());
        }

        let mut seen = Vec::new();
        let mut request = PageRequest::first(page_size);
        loop {
            let page = engine.list(&bucket, &request).unwrap();
            prop_assert!(page.items.len() <= page_size);
            seen.extend(page.items.into_iter().map(|i| i.name));
            match page.next_page_token {
                Some(token) => request = PageRequest::after(token, page_size),
                None => break,
            }
        }

        prop_assert_eq!(seen, expected.into_keys().collect::<Vec<_>>());
    }
}
