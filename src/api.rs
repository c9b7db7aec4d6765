//! Typed operations over the gatekept pipeline.
//!
//! Every method validates its arguments, builds an [`ApiRequest`], and runs it through
//! [`Pipeline::call`], so the caller sees one result whether or not a refresh-and-retry
//! happened underneath.

pub mod analytics;
pub mod auth;
pub mod links;
pub mod observability;
pub mod projects;

pub use analytics::*;
pub use auth::*;
pub use links::*;
pub use observability::*;
pub use projects::*;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	error::ValidationError,
	http::{ApiHttpClient, ApiRequest, ApiResponse, Method},
	pipeline::{self, Pipeline},
	session::{RefreshMetrics, Session},
	store::TokenStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Client specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestApiClient = Client<ReqwestHttpClient>;

/// Handle to the service. Clones share one transport and one [`Session`].
pub struct Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	config: Arc<ClientConfig>,
	pipeline: Pipeline<C>,
}
impl<C> Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a client over a caller-provided transport.
	pub fn with_http_client(
		config: ClientConfig,
		store: Arc<dyn TokenStore>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		let config = Arc::new(config);
		let http = http_client.into();
		let refresher = Arc::new(RefreshEndpoint::new(Arc::clone(&config), Arc::clone(&http)));
		let session = Arc::new(
			Session::new(store, refresher).with_refresh_timeout(config.refresh_timeout),
		);
		let pipeline = Pipeline::new(http, session, config.user_agent.clone());

		Self { config, pipeline }
	}

	/// Validated configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Session shared by every clone of this client.
	pub fn session(&self) -> &Arc<Session> {
		self.pipeline.session()
	}

	/// Refresh counters for the shared session.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		self.session().metrics()
	}

	pub(crate) fn url(&self, path: &str) -> Result<Url> {
		Ok(self.config.endpoint(path)?)
	}

	pub(crate) fn url_with_query(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
		let mut url = self.url(path)?;

		if !query.is_empty() {
			let mut pairs = url.query_pairs_mut();

			for (key, value) in query {
				pairs.append_pair(key, value);
			}
		}

		Ok(url)
	}

	pub(crate) async fn get_json<T>(&self, stage: &'static str, url: Url) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self.pipeline.call(stage, ApiRequest::new(Method::Get, url)).await?;

		pipeline::decode(&response)
	}

	pub(crate) async fn send_json<B, T>(
		&self,
		stage: &'static str,
		method: Method,
		url: Url,
		body: &B,
	) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		let request = ApiRequest::new(method, url).with_json(body)?;
		let response = self.pipeline.call(stage, request).await?;

		pipeline::decode(&response)
	}

	pub(crate) async fn delete(&self, stage: &'static str, url: Url) -> Result<()> {
		self.pipeline.call(stage, ApiRequest::new(Method::Delete, url)).await?;

		Ok(())
	}

	/// Sends a request outside the gatekeeper; a `401` is returned as-is, never refreshed.
	pub(crate) async fn send_unguarded(&self, request: ApiRequest) -> Result<ApiResponse> {
		self.pipeline.send(request).await
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestHttpClient> {
	/// Creates a client with its own reqwest-backed transport.
	pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
		Ok(Self::with_http_client(config, store, ReqwestHttpClient::new()?))
	}
}
impl<C> Clone for Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			config: Arc::clone(&self.config),
			pipeline: self.pipeline.clone(),
		}
	}
}
impl<C> Debug for Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("base_url", &self.config.base_url.as_str())
			.field("session", self.session())
			.finish()
	}
}

/// One page of a cursor-paginated listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
	/// Items on this page.
	pub items: Vec<T>,
	/// Cursor for the next page; `None` on the last page.
	#[serde(default)]
	pub next_cursor: Option<String>,
	/// Total item count, when the service reports it.
	#[serde(default)]
	pub total: Option<u64>,
}
impl<T> Page<T> {
	/// Returns `true` when another page can be requested.
	pub fn has_more(&self) -> bool {
		self.next_cursor.is_some()
	}
}

/// Cursor and size for a listing call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageRequest {
	cursor: Option<String>,
	limit: Option<u32>,
}
impl PageRequest {
	/// Largest page the service serves.
	pub const MAX_LIMIT: u32 = 100;

	/// First page with the service's default size.
	pub fn first() -> Self {
		Self::default()
	}

	/// Continues after `cursor`.
	pub fn after(mut self, cursor: impl Into<String>) -> Self {
		self.cursor = Some(cursor.into());

		self
	}

	/// Sets the page size.
	pub fn limit(mut self, limit: u32) -> Self {
		self.limit = Some(limit);

		self
	}

	/// Page following `page`, or `None` on the last page.
	pub fn next<T>(&self, page: &Page<T>) -> Option<Self> {
		page.next_cursor.as_ref().map(|cursor| Self { cursor: Some(cursor.clone()), limit: self.limit })
	}

	pub(crate) fn query(&self) -> Result<Vec<(&'static str, String)>, ValidationError> {
		let mut query = Vec::new();

		if let Some(limit) = self.limit {
			if limit == 0 || limit > Self::MAX_LIMIT {
				return Err(ValidationError::PageSize { max: Self::MAX_LIMIT });
			}

			query.push(("limit", limit.to_string()));
		}
		if let Some(cursor) = self.cursor.as_ref().filter(|cursor| !cursor.is_empty()) {
			query.push(("cursor", cursor.clone()));
		}

		Ok(query)
	}
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
	if value.trim().is_empty() { Err(ValidationError::MissingField { field }) } else { Ok(()) }
}
