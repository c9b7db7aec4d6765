//! Authenticated session with a single-flight token refresh.
//!
//! [`Session`] owns the token store handle and the refresh state. A call that observes a `401`
//! invokes [`Session::on_auth_failure`], which registers a one-shot waiter and, when no refresh
//! is in flight, makes that caller the leader that performs the exchange. However many calls
//! fail concurrently, exactly one refresh request is sent, and every waiter registered before
//! it settles receives the same outcome exactly once.
//!
//! Registration and the `in_progress` check-and-set share one critical section that never
//! spans an `.await`. Settlement drains every waiter and clears `in_progress` in another, so a
//! failure observed after settlement starts a fresh refresh.
//!
//! [`Session::end`] advances a generation counter. A refresh that started under an older
//! generation never leaves its pair in the store; it settles with [`RefreshError::SessionEnded`].

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::{
	mem,
	sync::atomic::{AtomicU64, Ordering},
};
// crates.io
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	auth::{TokenPair, TokenSecret},
	error::RefreshError,
	obs::{self, CallKind, CallOutcome, CallSpan},
	store::TokenStore,
};

/// Outcome delivered to every caller waiting on one refresh.
pub type RefreshOutcome = Result<TokenPair, RefreshError>;

/// Boxed future returned by [`TokenRefresher::exchange`].
pub type RefreshFuture<'a> = Pin<Box<dyn Future<Output = RefreshOutcome> + 'a + Send>>;

/// Performs the refresh-token exchange against the service.
///
/// The session calls this at most once per single-flight round and owns storing the result.
pub trait TokenRefresher
where
	Self: Send + Sync,
{
	/// Trades `refresh_token` for a new pair.
	fn exchange<'a>(&'a self, refresh_token: &'a TokenSecret) -> RefreshFuture<'a>;
}

type Waiter = oneshot::Sender<RefreshOutcome>;

#[derive(Debug, Default)]
struct RefreshState {
	in_progress: bool,
	waiters: Vec<Waiter>,
}

/// Token pair plus refresh coordination, shared by every call a client makes.
pub struct Session {
	store: Arc<dyn TokenStore>,
	refresher: Arc<dyn TokenRefresher>,
	refresh_timeout: Option<Duration>,
	state: Mutex<RefreshState>,
	generation: AtomicU64,
	metrics: RefreshMetrics,
}
impl Session {
	/// Creates a session over `store`, refreshing through `refresher`.
	pub fn new(store: Arc<dyn TokenStore>, refresher: Arc<dyn TokenRefresher>) -> Self {
		Self {
			store,
			refresher,
			refresh_timeout: None,
			state: Default::default(),
			generation: AtomicU64::new(0),
			metrics: Default::default(),
		}
	}

	/// Bounds each refresh exchange; `None` waits indefinitely.
	pub fn with_refresh_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.refresh_timeout = timeout;

		self
	}

	/// Counters for refresh rounds.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	/// Returns `true` while a refresh exchange is outstanding.
	pub fn is_refreshing(&self) -> bool {
		self.state.lock().in_progress
	}

	/// Number of callers currently waiting on the in-flight refresh.
	pub fn pending_callers(&self) -> usize {
		self.state.lock().waiters.len()
	}

	/// Current token pair, if the session is established.
	pub async fn current(&self) -> Result<Option<TokenPair>> {
		Ok(self.store.get().await?.and_then(TokenPair::into_complete))
	}

	/// Access token used by the signer stage. Never waits on a refresh.
	pub async fn access_token(&self) -> Result<Option<TokenSecret>> {
		Ok(self.current().await?.map(|pair| pair.access_token))
	}

	/// Stores a pair obtained outside the refresh path (login).
	pub async fn establish(&self, pair: TokenPair) -> Result<()> {
		self.store.set(pair).await?;

		Ok(())
	}

	/// Drops local session state. An in-flight refresh will not restore it.
	pub async fn end(&self) -> Result<()> {
		self.generation.fetch_add(1, Ordering::SeqCst);
		self.store.clear().await?;

		Ok(())
	}

	/// Registers the caller for the current refresh round, leading it if none is in flight,
	/// and resolves once that round settles.
	pub async fn on_auth_failure(&self) -> RefreshOutcome {
		let (pending, leads) = self.register();

		if leads {
			let leader = Leader { session: self, settled: false };
			let outcome = self.lead().await;

			leader.settle(outcome);
		}

		pending.await.unwrap_or(Err(RefreshError::Abandoned))
	}

	/// Proactive refresh. Joins an in-flight round instead of racing it.
	pub async fn refresh(&self) -> RefreshOutcome {
		self.on_auth_failure().await
	}

	fn register(&self) -> (oneshot::Receiver<RefreshOutcome>, bool) {
		let (tx, rx) = oneshot::channel();
		let mut state = self.state.lock();
		let leads = !state.in_progress;

		state.in_progress = true;
		state.waiters.push(tx);

		drop(state);

		if leads {
			self.metrics.record_exchange();
		} else {
			self.metrics.record_joined();
		}

		(rx, leads)
	}

	async fn lead(&self) -> RefreshOutcome {
		const KIND: CallKind = CallKind::Refresh;

		let span = CallSpan::new(KIND, "refresh_session");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let outcome = span
			.instrument(async {
				let outcome = self.rotate().await;

				if outcome.is_err() {
					self.clear_after_failure().await;
				}

				outcome
			})
			.await;

		match &outcome {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		outcome
	}

	async fn rotate(&self) -> RefreshOutcome {
		let generation = self.generation.load(Ordering::SeqCst);
		let current = self
			.store
			.get()
			.await?
			.and_then(TokenPair::into_complete)
			.ok_or(RefreshError::MissingRefreshToken)?;
		let exchange = self.refresher.exchange(&current.refresh_token);
		let pair = match self.refresh_timeout {
			Some(limit) => tokio::time::timeout(limit.unsigned_abs(), exchange)
				.await
				.map_err(|_| RefreshError::TimedOut(limit))??,
			None => exchange.await?,
		};
		let pair = pair.into_complete().ok_or_else(|| RefreshError::Exchange {
			message: "refresh response carried an incomplete token pair".into(),
		})?;

		if self.generation.load(Ordering::SeqCst) != generation {
			return Err(RefreshError::SessionEnded);
		}

		self.store.set(pair.clone()).await?;

		// `end` may have cleared the store while `set` was pending.
		if self.generation.load(Ordering::SeqCst) != generation {
			return Err(RefreshError::SessionEnded);
		}

		Ok(pair)
	}

	async fn clear_after_failure(&self) {
		if let Err(e) = self.store.clear().await {
			obs::cleanup_degraded("clear_session_after_refresh_failure", &e);
		}
	}

	fn settle(&self, outcome: RefreshOutcome) {
		let waiters = {
			let mut state = self.state.lock();

			state.in_progress = false;

			mem::take(&mut state.waiters)
		};

		match &outcome {
			Ok(_) => self.metrics.record_success(),
			Err(_) => self.metrics.record_failure(),
		}

		obs::refresh_settled(outcome.is_ok(), waiters.len());

		for waiter in waiters {
			// A waiter whose caller was dropped has nobody to notify.
			let _ = waiter.send(outcome.clone());
		}
	}
}
impl Debug for Session {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("Session")
			.field("refresh_in_progress", &state.in_progress)
			.field("pending_callers", &state.waiters.len())
			.field("refresh_timeout", &self.refresh_timeout)
			.finish()
	}
}

/// Settles the round with [`RefreshError::Abandoned`] if the leading future is dropped early.
struct Leader<'a> {
	session: &'a Session,
	settled: bool,
}
impl Leader<'_> {
	fn settle(mut self, outcome: RefreshOutcome) {
		self.settled = true;
		self.session.settle(outcome);
	}
}
impl Drop for Leader<'_> {
	fn drop(&mut self) {
		if !self.settled {
			self.session.settle(Err(RefreshError::Abandoned));
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::MemoryStore;

	struct FixedRefresher(RefreshOutcome);
	impl TokenRefresher for FixedRefresher {
		fn exchange<'a>(&'a self, _refresh_token: &'a TokenSecret) -> RefreshFuture<'a> {
			let outcome = self.0.clone();

			Box::pin(async move { outcome })
		}
	}

	fn session(store: &MemoryStore, outcome: RefreshOutcome) -> Session {
		Session::new(Arc::new(store.clone()), Arc::new(FixedRefresher(outcome)))
	}

	#[tokio::test]
	async fn successful_round_rotates_store_and_resets_state() {
		let store = MemoryStore::with_pair(TokenPair::new("at1", "rt1"));
		let session = session(&store, Ok(TokenPair::new("at2", "rt2")));
		let pair = session.on_auth_failure().await.expect("Refresh should succeed.");

		assert_eq!(pair, TokenPair::new("at2", "rt2"));
		assert_eq!(store.snapshot(), Some(TokenPair::new("at2", "rt2")));
		assert!(!session.is_refreshing());
		assert_eq!(session.pending_callers(), 0);
		assert_eq!(session.metrics().exchanges(), 1);
		assert_eq!(session.metrics().successes(), 1);
	}

	#[tokio::test]
	async fn rejected_round_clears_store() {
		let store = MemoryStore::with_pair(TokenPair::new("at1", "rt1"));
		let rejection = RefreshError::Rejected { status: 401, reason: "expired".into() };
		let session = session(&store, Err(rejection.clone()));

		assert_eq!(session.on_auth_failure().await, Err(rejection));
		assert_eq!(store.snapshot(), None);
		assert!(!session.is_refreshing());
		assert_eq!(session.metrics().failures(), 1);
	}

	#[tokio::test]
	async fn incomplete_refresh_response_fails_round() {
		let store = MemoryStore::with_pair(TokenPair::new("at1", "rt1"));
		let session = session(&store, Ok(TokenPair::new("at2", "")));
		let err = session.on_auth_failure().await.expect_err("Half pairs must be rejected.");

		assert!(matches!(err, RefreshError::Exchange { .. }));
		assert_eq!(store.snapshot(), None);
	}

	#[test]
	fn dropped_leader_releases_waiters() {
		let store = MemoryStore::with_pair(TokenPair::new("at1", "rt1"));
		let session = session(&store, Ok(TokenPair::new("at2", "rt2")));
		let (follower, leads) = session.register();

		assert!(leads);

		drop(Leader { session: &session, settled: false });

		assert!(!session.is_refreshing());
		assert_eq!(follower.blocking_recv().ok(), Some(Err(RefreshError::Abandoned)));
		assert_eq!(store.snapshot(), Some(TokenPair::new("at1", "rt1")));
	}
}
