//! Integration tests for the on-disk deployment store.

use tempfile::tempdir;
use vt_state::{DeploymentStore, StateError, StoreConfig};

#[test]
fn test_records_survive_reopen() {
    let temp = tempdir().unwrap();
    let config = StoreConfig::new(temp.path().join("state"));

    {
        let store = DeploymentStore::open(&config).unwrap();
        store.add("docker-compose", "sqli-basic").unwrap();
        store.add("docker", "xss-reflected").unwrap();
    }

    let store = DeploymentStore::open(&config).unwrap();
    assert!(store.exists("docker-compose", "sqli-basic").unwrap());
    assert!(store.exists("docker", "xss-reflected").unwrap());
    assert_eq!(store.list_all().unwrap().len(), 2);
    assert_eq!(store.path(), Some(config.database_path().as_path()));
}

#[test]
fn test_second_open_is_locked() {
    let temp = tempdir().unwrap();
    let config = StoreConfig::new(temp.path());

    let _held = DeploymentStore::open(&config).unwrap();
    match DeploymentStore::open(&config) {
        Err(StateError::Locked(path)) => assert_eq!(path, config.lock_path()),
        other => panic!("expected Locked, got {other:?}"),
    }
}

#[test]
fn test_lock_released_on_drop() {
    let temp = tempdir().unwrap();
    let config = StoreConfig::new(temp.path());

    drop(DeploymentStore::open(&config).unwrap());
    assert!(DeploymentStore::open(&config).is_ok());
}

#[test]
fn test_same_template_on_two_providers() {
    let temp = tempdir().unwrap();
    let store = DeploymentStore::open(&StoreConfig::new(temp.path())).unwrap();

    store.add("docker-compose", "sqli-basic").unwrap();
    store.add("docker", "sqli-basic").unwrap();
    store.remove("docker", "sqli-basic").unwrap();

    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].provider_name, "docker-compose");
    assert_eq!(all[0].template_id, "sqli-basic");
}

#[test]
fn test_remove_is_idempotent() {
    let temp = tempdir().unwrap();
    let store = DeploymentStore::open(&StoreConfig::new(temp.path())).unwrap();

    store.add("docker-compose", "sqli-basic").unwrap();
    store.remove("docker-compose", "sqli-basic").unwrap();
    store.remove("docker-compose", "sqli-basic").unwrap();
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn test_custom_bucket_is_isolated() {
    let temp = tempdir().unwrap();
    let base = StoreConfig::new(temp.path());

    {
        let store = DeploymentStore::open(&base).unwrap();
        store.add("docker-compose", "sqli-basic").unwrap();
    }

    let other = DeploymentStore::open(&base.clone().with_bucket_name("archive")).unwrap();
    assert!(other.list_all().unwrap().is_empty());
}
