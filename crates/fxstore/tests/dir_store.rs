//! Integration tests for the directory-backed store.

use std::path::PathBuf;

use rand::Rng;

use fxstore::ContentId;
use fxstore::ContentStore;
use fxstore::DirStore;
use fxstore::Error;

/// Fresh, unique directory under the system temp dir.
fn scratch_dir() -> PathBuf {
    let tag: u64 = rand::thread_rng().r#gen();
    std::env::temp_dir().join(format!("fxstore-test-{:016x}", tag))
}

#[tokio::test]
async fn test_dir_put_get() {
    let root = scratch_dir();
    let store = DirStore::open(&root).await.unwrap();

    let id = store.put(b"Hello World!").await.unwrap();
    assert_eq!(store.get(&id).await.unwrap(), b"Hello World!");

    let hex = id.to_string();
    assert!(root.join(&hex[..2]).join(&hex[2..]).is_file());

    let _ = std::fs::remove_dir_all(root);
}

#[tokio::test]
async fn test_dir_survives_reopen() {
    let root = scratch_dir();
    let id = {
        let store = DirStore::open(&root).await.unwrap();
        store.put(b"persistent").await.unwrap()
    };

    let store = DirStore::open(&root).await.unwrap();
    assert!(store.has(&id).await.unwrap());
    assert_eq!(store.get(&id).await.unwrap(), b"persistent");

    let _ = std::fs::remove_dir_all(root);
}

#[tokio::test]
async fn test_dir_put_is_idempotent() {
    let root = scratch_dir();
    let store = DirStore::open(&root).await.unwrap();

    let payload: Vec<u8> = (0..4096).map(|_| rand::thread_rng().r#gen()).collect();
    let a = store.put(&payload).await.unwrap();
    let b = store.put(&payload).await.unwrap();
    assert_eq!(a, b);

    let hex = a.to_string();
    let shard: Vec<_> = std::fs::read_dir(root.join(&hex[..2])).unwrap().collect();
    assert_eq!(shard.len(), 1, "no temp files or duplicates left behind");

    let _ = std::fs::remove_dir_all(root);
}

#[tokio::test]
async fn test_dir_missing_blob() {
    let root = scratch_dir();
    let store = DirStore::open(&root).await.unwrap();
    let id = ContentId::of(b"absent");

    assert_eq!(store.get(&id).await, Err(Error::NotFound(id)));
    assert!(!store.has(&id).await.unwrap());

    let _ = std::fs::remove_dir_all(root);
}

#[tokio::test]
async fn test_dir_detects_tampering() {
    let root = scratch_dir();
    let store = DirStore::open(&root).await.unwrap();
    let id = store.put(b"original").await.unwrap();

    let hex = id.to_string();
    std::fs::write(root.join(&hex[..2]).join(&hex[2..]), b"tampered").unwrap();

    assert_eq!(
        store.get(&id).await,
        Err(Error::Integrity { expected: id, actual: ContentId::of(b"tampered") })
    );

    let _ = std::fs::remove_dir_all(root);
}
