//! Tests for tokio spawner utilities

use prometheus_lease::core::Spawn;
use prometheus_lease::runtime::tokio_spawner::TokioSpawner;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[tokio::test]
async fn test_tokio_spawner_current() {
    let spawner = TokioSpawner::current().unwrap();
    let joined = spawner.handle().spawn(async { "ran" }).await.unwrap();
    assert_eq!(joined, "ran");
}

#[test]
fn test_tokio_spawner_without_runtime() {
    let err = TokioSpawner::current().unwrap_err();
    assert!(err.to_string().starts_with("runtime unavailable"));
}
