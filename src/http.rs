//! Transport primitives for service calls.
//!
//! [`ApiHttpClient`] is the client's only dependency on an HTTP stack. The pipeline hands it a
//! fully prepared [`ApiRequest`] (URL, method, JSON body, optional bearer token) and receives
//! an [`ApiResponse`] carrying the status, `Retry-After` hint, and raw body. Status codes are
//! never interpreted here; the gatekeeper stage owns that decision.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")]
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, RETRY_AFTER, USER_AGENT};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, auth::TokenSecret};

/// Boxed future returned by [`ApiHttpClient::execute`].
pub type HttpFuture<'a, E> = Pin<Box<dyn Future<Output = Result<ApiResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing service calls.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by every
/// clone of a client, and the futures they return must be `Send` so calls can hop executors.
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends `request` and resolves once the full response body has been read.
	///
	/// Any HTTP status, including `401` and `5xx`, is a successful transport outcome.
	fn execute(&self, request: ApiRequest) -> HttpFuture<'_, Self::TransportError>;
}

/// HTTP methods used by the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the wire verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Transport-agnostic description of one outgoing call.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute request URL, query string included.
	pub url: Url,
	/// Serialized JSON body, if any.
	pub body: Option<Vec<u8>>,
	/// Bearer credential; attached by the signer stage.
	pub bearer: Option<TokenSecret>,
	/// Optional `User-Agent` override.
	pub user_agent: Option<String>,
}
impl ApiRequest {
	/// Creates an unsigned request without a body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, body: None, bearer: None, user_agent: None }
	}

	/// Serializes `body` as the JSON payload.
	pub fn with_json<T>(mut self, body: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(body).map_err(crate::error::ConfigError::from)?);

		Ok(self)
	}

	/// Returns a copy signed with `token`, replacing any previous credential.
	pub fn signed(&self, token: Option<TokenSecret>) -> Self {
		Self { bearer: token, ..self.clone() }
	}
}

/// Response captured by the transport.
#[derive(Clone, Debug, Default)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Service calls should not follow redirects; configure any custom [`ReqwestClient`] with
/// `redirect::Policy::none()` before wrapping it.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds the default transport with redirects disabled.
	pub fn new() -> Result<Self> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(crate::error::ConfigError::from)?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: ApiRequest) -> HttpFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let method = match request.method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
				Method::Patch => reqwest::Method::PATCH,
				Method::Delete => reqwest::Method::DELETE,
			};
			let mut builder = client.request(method, request.url).header(ACCEPT, "application/json");

			if let Some(token) = request.bearer.as_ref() {
				builder = builder.header(AUTHORIZATION, token.bearer_header());
			}
			if let Some(agent) = request.user_agent {
				builder = builder.header(USER_AGENT, agent);
			}
			if let Some(body) = request.body {
				builder = builder.header(CONTENT_TYPE, "application/json").body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let retry_after = parse_retry_after(response.headers());
			let body = response.bytes().await?.to_vec();

			Ok(ApiResponse { status, retry_after, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// crates.io
	use reqwest::header::HeaderValue;
	// self
	use super::*;

	#[test]
	fn retry_after_accepts_seconds_and_ignores_garbage() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("120"));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(120)));

		headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));

		assert_eq!(parse_retry_after(&headers), None);
		assert_eq!(parse_retry_after(&HeaderMap::new()), None);
	}

	#[test]
	fn signing_replaces_previous_credential() {
		let url = Url::parse("https://api.example.com/v1/projects").expect("URL should parse.");
		let request = ApiRequest::new(Method::Get, url).signed(Some(TokenSecret::new("at1")));
		let resigned = request.signed(Some(TokenSecret::new("at2")));

		assert_eq!(resigned.bearer.as_ref().map(TokenSecret::expose), Some("at2"));
		assert_eq!(request.bearer.as_ref().map(TokenSecret::expose), Some("at1"));
	}
}
