//! Deploy behaviour: identity, idempotence, and what gets written.

use std::sync::Arc;

use fxrun::Error;
use fxrun::FunctionManifest;
use fxrun::Runtime;
use fxrun::TypeDescriptor;
use fxstore::ContentId;
use fxstore::ContentStore;
use fxstore::MemoryStore;

const ECHO: &str = include_str!("fixtures/echo.wat");
const SUM: &str = include_str!("fixtures/sum.wat");

fn setup() -> (Arc<MemoryStore>, Runtime) {
    let store = Arc::new(MemoryStore::new());
    let runtime = Runtime::new(store.clone()).unwrap();
    (store, runtime)
}

#[tokio::test]
async fn test_deploy_stores_bytecode_and_manifest() {
    let (store, runtime) = setup();
    let fx = runtime.deploy(ECHO.as_bytes(), ["fx"], [TypeDescriptor::new("string")]).await.unwrap();

    assert_eq!(store.len(), 2);
    assert!(store.contains(&ContentId::of(ECHO.as_bytes())));

    let bytes = store.get(&fx).await.unwrap();
    assert_eq!(fx, ContentId::of(&bytes));
    let manifest = FunctionManifest::decode(&bytes).unwrap();
    assert_eq!(manifest.bytecode(), ContentId::of(ECHO.as_bytes()));
    assert_eq!(manifest.entrypoints(), &["fx".to_string()]);
}

#[tokio::test]
async fn test_deploy_is_idempotent() {
    let (store, runtime) = setup();
    let a = runtime.deploy(ECHO.as_bytes(), ["fx"], [TypeDescriptor::new("string")]).await.unwrap();
    let b = runtime.deploy(ECHO.as_bytes(), ["fx"], [TypeDescriptor::new("string")]).await.unwrap();

    assert_eq!(a, b);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_identity_covers_every_manifest_field() {
    let (_store, runtime) = setup();
    let base = runtime.deploy(ECHO.as_bytes(), ["fx"], [TypeDescriptor::new("string")]).await.unwrap();

    let other_code = runtime.deploy(SUM.as_bytes(), ["fx"], [TypeDescriptor::new("string")]).await.unwrap();
    let other_entry = runtime.deploy(ECHO.as_bytes(), ["fx", "fx2"], [TypeDescriptor::new("string")]).await.unwrap();
    let other_type = runtime.deploy(ECHO.as_bytes(), ["fx"], [TypeDescriptor::new("bytes")]).await.unwrap();
    let other_codec = runtime
        .deploy(
            ECHO.as_bytes(),
            ["fx"],
            [TypeDescriptor::with_codec("string", ContentId::of(b"codec"))],
        )
        .await
        .unwrap();

    let ids = [base, other_code, other_entry, other_type, other_codec];
    for (i, a) in ids.iter().enumerate() {
        for b in &ids[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[tokio::test]
async fn test_empty_entrypoints_writes_nothing() {
    let (store, runtime) = setup();
    let err = runtime
        .deploy(ECHO.as_bytes(), Vec::<String>::new(), [TypeDescriptor::new("string")])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Manifest(fxrun::manifest::Error::EmptyEntrypoints)));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_deploy_does_not_validate_bytecode() {
    let (store, runtime) = setup();
    let fx = runtime.deploy(b"not a module", ["fx"], []).await.unwrap();
    assert!(store.contains(&fx));

    let err = runtime.call(&fx, "fx", &[]).await.unwrap_err();
    assert!(matches!(err, Error::Sandbox(fxrun::sandbox::Error::Load(_))));
}
