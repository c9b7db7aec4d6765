// std
use std::{fs, path::PathBuf, process};
// crates.io
use time::OffsetDateTime;
// self
use linkhub_client::{
	auth::TokenPair,
	store::{FileStore, MemoryStore, StoreError, TokenStore},
};

fn scratch_path(label: &str) -> PathBuf {
	let nonce = OffsetDateTime::now_utc().unix_timestamp_nanos();

	std::env::temp_dir()
		.join(format!("linkhub-client-{label}-{}-{nonce}", process::id()))
		.join("session.json")
}

async fn assert_contract(store: &dyn TokenStore) {
	assert_eq!(store.get().await.expect("Empty read should succeed."), None);

	store.set(TokenPair::new("at1", "rt1")).await.expect("First write should succeed.");

	assert_eq!(store.get().await.expect("Read should succeed."), Some(TokenPair::new("at1", "rt1")));

	store.set(TokenPair::new("at2", "rt2")).await.expect("Replacement should succeed.");

	assert_eq!(
		store.get().await.expect("Read should succeed."),
		Some(TokenPair::new("at2", "rt2")),
		"A set must replace the whole pair."
	);

	store.clear().await.expect("Clear should succeed.");
	store.clear().await.expect("Clearing an empty store should succeed.");

	assert_eq!(store.get().await.expect("Read after clear should succeed."), None);
}

#[tokio::test]
async fn memory_store_honors_contract() {
	assert_contract(&MemoryStore::default()).await;
}

#[tokio::test]
async fn memory_store_clones_share_state() {
	let store = MemoryStore::default();
	let clone = store.clone();

	store.set(TokenPair::new("at1", "rt1")).await.expect("Write should succeed.");

	assert_eq!(clone.snapshot(), Some(TokenPair::new("at1", "rt1")));
}

#[tokio::test]
async fn file_store_honors_contract() {
	let path = scratch_path("contract");
	let store = FileStore::open(&path).expect("Opening a fresh path should succeed.");

	assert_contract(&store).await;
	assert!(!path.exists(), "Clear should remove the backing file.");

	if let Some(dir) = path.parent() {
		let _ = fs::remove_dir_all(dir);
	}
}

#[test]
fn file_store_rejects_corrupt_file() {
	let path = scratch_path("corrupt");

	if let Some(dir) = path.parent() {
		fs::create_dir_all(dir).expect("Scratch directory should be creatable.");
	}

	fs::write(&path, b"{not json").expect("Corrupt fixture should be writable.");

	assert!(matches!(FileStore::open(&path), Err(StoreError::Serialization { .. })));

	if let Some(dir) = path.parent() {
		let _ = fs::remove_dir_all(dir);
	}
}
