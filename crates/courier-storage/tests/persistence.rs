//! The store must survive process restarts: reopening an existing root
//! sees everything stored before.

use courier_storage::Storage;
use std::collections::HashSet;
use tempfile::TempDir;

#[test]
fn reopen_sees_previous_entries() {
    let dir = TempDir::new().unwrap();

    {
        let storage = Storage::open(dir.path()).unwrap();
        storage.store("models/alpha", b"weights-a").unwrap();
        storage.store("models/beta", b"weights-b").unwrap();
    }

    let storage = Storage::open(dir.path()).unwrap();
    let loaded = storage.load("models").unwrap();
    assert_eq!(
        loaded,
        vec![
            ("models/alpha".to_string(), b"weights-a".to_vec()),
            ("models/beta".to_string(), b"weights-b".to_vec()),
        ]
    );
}

#[test]
fn reopen_appends_after_existing_entries() {
    let dir = TempDir::new().unwrap();

    {
        let storage = Storage::open(dir.path()).unwrap();
        storage.store("log/1", b"one").unwrap();
    }

    let storage = Storage::open(dir.path()).unwrap();
    storage.store("log/2", b"two").unwrap();

    let names: Vec<String> = storage
        .load("log")
        .unwrap()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, vec!["log/1".to_string(), "log/2".to_string()]);
}

#[test]
fn reopen_preserves_dedup_and_missing_sets() {
    let dir = TempDir::new().unwrap();

    {
        let storage = Storage::open(dir.path()).unwrap();
        storage.store("first", b"shared").unwrap();
    }

    let storage = Storage::open(dir.path()).unwrap();
    storage.store("second", b"shared").unwrap();

    let blobs = std::fs::read_dir(dir.path().join("blobs")).unwrap().count();
    assert_eq!(blobs, 1);

    let required: HashSet<String> = ["first", "second", "third"]
        .into_iter()
        .map(String::from)
        .collect();
    let expected: HashSet<String> = ["third"].into_iter().map(String::from).collect();
    assert_eq!(storage.find_missing(&required).unwrap(), expected);
}
