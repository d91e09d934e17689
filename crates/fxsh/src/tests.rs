//! Shell tests against an in-memory store.

use std::path::PathBuf;
use std::sync::Arc;

use fxrun::Runtime;
use fxstore::ContentId;
use fxstore::ContentStore;
use fxstore::MemoryStore;
use rand::Rng;

use crate::shell::Error;
use crate::shell::Outcome;
use crate::shell::Shell;

const ECHO: &str = include_str!("../../fxrun/tests/fixtures/echo.wat");
const SUM: &str = include_str!("../../fxrun/tests/fixtures/sum.wat");

fn shell() -> (Arc<MemoryStore>, Shell) {
    let store = Arc::new(MemoryStore::new());
    let runtime = Runtime::new(store.clone()).unwrap();
    (store, Shell::new(runtime))
}

/// Fresh scratch directory, removed by the caller.
fn scratch_dir() -> PathBuf {
    let tag: u64 = rand::thread_rng().r#gen();
    let dir = std::env::temp_dir().join(format!("fxsh-test-{:016x}", tag));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn expect_id(outcome: Outcome) -> ContentId {
    match outcome {
        Outcome::Added(id) | Outcome::Deployed(id) | Outcome::Called(id) => id,
        other => panic!("expected an id, got {:?}", other),
    }
}

#[tokio::test]
async fn test_add_and_get() {
    let (store, shell) = shell();
    let id = expect_id(shell.exec_line("add_Hello World!").await.unwrap());
    assert_eq!(store.get(&id).await.unwrap(), b"Hello World!");

    let outcome = shell.exec_line(&format!("get_{}", id)).await.unwrap();
    assert_eq!(outcome, Outcome::Blob(b"Hello World!".to_vec()));
    assert_eq!(outcome.to_string(), "Get: Hello World!");
}

#[tokio::test]
async fn test_deploy_abi_and_call() {
    let (store, shell) = shell();
    let dir = scratch_dir();
    let wasm = dir.join("echo.wat");
    std::fs::write(&wasm, ECHO).unwrap();

    let fx = expect_id(
        shell
            .exec_line(&format!("deploy_{}_fx_string", wasm.display()))
            .await
            .unwrap(),
    );

    let abi = shell.exec_line(&format!("abi_{}", fx)).await.unwrap();
    match &abi {
        Outcome::Manifest(m) => {
            assert_eq!(m.entrypoints(), &["fx".to_string()]);
            assert_eq!(m.bytecode(), ContentId::of(ECHO.as_bytes()));
        }
        other => panic!("expected a manifest, got {:?}", other),
    }
    assert!(abi.to_string().contains("args:        [string]"));

    let arg = expect_id(shell.exec_line("add_ping").await.unwrap());
    let out = expect_id(shell.exec_line(&format!("call_{}_fx_{}", fx, arg)).await.unwrap());
    assert_eq!(store.get(&out).await.unwrap(), b"ping");

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_add_file() {
    let (store, shell) = shell();
    let dir = scratch_dir();
    let file = dir.join("blob.bin");
    std::fs::write(&file, [0u8, 1, 2, 255]).unwrap();

    let id = expect_id(shell.exec_line(&format!("addFile_{}", file.display())).await.unwrap());
    assert_eq!(store.get(&id).await.unwrap(), vec![0u8, 1, 2, 255]);

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_script_runs_in_order() {
    let (store, shell) = shell();
    let dir = scratch_dir();

    let runtime = shell.runtime();
    let fx = runtime
        .deploy(SUM.as_bytes(), ["fx"], [fxrun::TypeDescriptor::new("i32"), fxrun::TypeDescriptor::new("i32")])
        .await
        .unwrap();
    let a = store.put(&2i32.to_le_bytes()).await.unwrap();
    let b = store.put(&3i32.to_le_bytes()).await.unwrap();

    let script = dir.join("demo.fx");
    let text = format!(
        "# adds two numbers\n\nadd_unused\ncall_{fx}_fx_{a}&{b}\nexit\nadd_never reached\n"
    );
    std::fs::write(&script, text).unwrap();

    let outcome = shell.exec_line(&format!("script_{}", script.display())).await.unwrap();
    let steps = match outcome {
        Outcome::Script(steps) => steps,
        other => panic!("expected script outcome, got {:?}", other),
    };
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0].0, "add_unused");
    assert_eq!(steps[2].1, Outcome::Exit);

    let out = match &steps[1].1 {
        Outcome::Called(id) => *id,
        other => panic!("expected call outcome, got {:?}", other),
    };
    assert_eq!(store.get(&out).await.unwrap(), 5i32.to_le_bytes());
    assert!(!store.contains(&ContentId::of(b"never reached")));

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_script_stops_at_first_failure() {
    let (store, shell) = shell();
    let dir = scratch_dir();
    let script = dir.join("broken.fx");
    let missing = ContentId::of(b"no such function");
    std::fs::write(&script, format!("add_first\ncall_{}_fx\nadd_second\n", missing)).unwrap();

    let err = shell.run_script(&script).await.unwrap_err();
    match err {
        Error::Script { line, source, .. } => {
            assert_eq!(line, 2);
            assert!(matches!(*source, Error::Run(fxrun::Error::ManifestNotFound(id)) if id == missing));
        }
        other => panic!("expected script error, got {:?}", other),
    }
    assert!(store.contains(&ContentId::of(b"first")));
    assert!(!store.contains(&ContentId::of(b"second")));

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_errors_are_reported_not_raised() {
    let (_store, shell) = shell();

    assert!(matches!(shell.exec_line("bogus").await, Err(Error::Parse(_))));
    assert!(matches!(
        shell.exec_line("addFile_/definitely/not/here").await,
        Err(Error::Io { .. })
    ));

    let missing = ContentId::of(b"absent");
    let err = shell.exec_line(&format!("get_{}", missing)).await.unwrap_err();
    assert!(matches!(err, Error::Store(fxstore::Error::NotFound(id)) if id == missing));
}

#[tokio::test]
async fn test_help_and_exit() {
    let (_store, shell) = shell();
    let help = shell.exec_line("help").await.unwrap();
    assert!(help.to_string().contains("deploy_<path>"));
    assert_eq!(shell.exec_line("exit").await.unwrap(), Outcome::Exit);
}
