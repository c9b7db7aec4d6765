//! Thread-safe in-memory [`TokenStore`] for tests and short-lived processes.

// self
use crate::{
	_prelude::*,
	auth::TokenPair,
	store::{StoreFuture, TokenStore},
};

/// Keeps the token pair in-process; lost when the process exits.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<Option<TokenPair>>>);
impl MemoryStore {
	/// Creates a store already holding `pair`.
	pub fn with_pair(pair: TokenPair) -> Self {
		Self(Arc::new(RwLock::new(Some(pair))))
	}

	/// Synchronous snapshot of the stored pair.
	pub fn snapshot(&self) -> Option<TokenPair> {
		self.0.read().clone()
	}
}
impl TokenStore for MemoryStore {
	fn get(&self) -> StoreFuture<'_, Option<TokenPair>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.read().clone()) })
	}

	fn set(&self, pair: TokenPair) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(pair);

			Ok(())
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			slot.write().take();

			Ok(())
		})
	}
}
