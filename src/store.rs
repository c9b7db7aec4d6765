//! Persistence contract and built-in backends for the session's token pair.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::TokenPair};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Key-value persistence for the single token pair a session holds.
///
/// Implementations must offer read-after-write consistency within the process: a `get` that
/// follows a completed `set` or `clear` observes it.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns the stored pair, or `None` when the session is absent.
	fn get(&self) -> StoreFuture<'_, Option<TokenPair>>;

	/// Replaces the stored pair as one value.
	fn set(&self, pair: TokenPair) -> StoreFuture<'_, ()>;

	/// Removes any stored pair. Clearing an empty store succeeds.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
