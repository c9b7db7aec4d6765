//! Client-level error types shared across the pipeline, session, stores, and API surface.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Caller supplied missing or malformed arguments; no request was sent.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Session refresh failed; every caller waiting on that refresh receives the same value.
	#[error(transparent)]
	RefreshFailed(#[from] RefreshError),

	/// The service rejected the credentials, including after one refresh-and-retry.
	#[error("The service rejected the request as unauthenticated.")]
	Unauthenticated,
	/// The service answered with a non-success status other than `401`.
	#[error("The service returned HTTP {status}: {message}.")]
	Api {
		/// HTTP status code.
		status: u16,
		/// Error message extracted from the response body, or the raw body preview.
		message: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Response body did not match the expected shape.
	#[error("The service returned a body that could not be decoded (HTTP {status}).")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code of the decoded response.
		status: u16,
	},
}
impl Error {
	/// Returns `true` when the failure came from authentication (rejected call or failed refresh).
	pub fn is_auth_failure(&self) -> bool {
		matches!(self, Self::Unauthenticated | Self::RefreshFailed(_))
	}
}

/// Configuration failures raised while wiring the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Client configuration failed validation.
	#[error(transparent)]
	Client(#[from] crate::config::ClientConfigError),
	/// An endpoint path could not be joined onto the base URL.
	#[error("Endpoint `{path}` cannot be joined onto the base URL.")]
	InvalidEndpoint {
		/// Path that failed to join.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	RequestBody(#[from] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Argument validation failures detected before any request leaves the process.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// An identifier argument was malformed.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),
	/// A required text field was empty or whitespace.
	#[error("The `{field}` field is required.")]
	MissingField {
		/// Name of the offending field.
		field: &'static str,
	},
	/// A URL argument could not be parsed or uses an unsupported scheme.
	#[error("The `{field}` field must be an absolute http(s) URL: {value}.")]
	InvalidUrl {
		/// Name of the offending field.
		field: &'static str,
		/// Value that failed validation.
		value: String,
	},
	/// A time range ends before it starts.
	#[error("The time range ends before it starts.")]
	InvertedRange,
	/// A timestamp argument cannot be rendered as RFC 3339.
	#[error("The `{field}` timestamp cannot be rendered as RFC 3339.")]
	UnrepresentableTimestamp {
		/// Name of the offending field.
		field: &'static str,
	},
	/// A page size of zero or above the service maximum.
	#[error("Page size must be between 1 and {max}.")]
	PageSize {
		/// Maximum accepted page size.
		max: u32,
	},
}

/// Refresh failures fanned out to every caller waiting on the same refresh.
///
/// The type is [`Clone`] because one settled refresh resolves many pending callers.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RefreshError {
	/// No refresh token was stored when the refresh started.
	#[error("No refresh token is stored for this session.")]
	MissingRefreshToken,
	/// The refresh endpoint rejected the refresh token.
	#[error("The refresh endpoint rejected the refresh token (HTTP {status}): {reason}.")]
	Rejected {
		/// HTTP status code returned by the refresh endpoint.
		status: u16,
		/// Service-supplied reason string.
		reason: String,
	},
	/// The refresh exchange failed before the service answered.
	#[error("The refresh exchange failed: {message}.")]
	Exchange {
		/// Rendered underlying failure.
		message: String,
	},
	/// The token store failed while reading or rotating the pair.
	#[error("The token store failed during refresh: {0}")]
	Storage(#[from] crate::store::StoreError),
	/// The refresh exchange exceeded the configured timeout.
	#[error("The refresh exchange timed out after {0}.")]
	TimedOut(Duration),
	/// The session was ended while the exchange was in flight; the new pair was discarded.
	#[error("The session ended before the refresh settled.")]
	SessionEnded,
	/// The caller driving the refresh was dropped before the exchange settled.
	#[error("The refresh was abandoned before it settled.")]
	Abandoned,
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the service.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
