//! Client configuration: service location, auth endpoint paths, and refresh policy.

// self
use crate::{_prelude::*, error::ConfigError};

/// Errors raised while constructing or validating a [`ClientConfig`].
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ClientConfigError {
	/// Base URL must use HTTPS unless it points at a loopback host.
	#[error("The base URL must use HTTPS: {url}.")]
	InsecureBaseUrl {
		/// URL that failed validation.
		url: String,
	},
	/// Base URL cannot carry a query string or fragment.
	#[error("The base URL cannot carry a query or fragment: {url}.")]
	BaseUrlHasQuery {
		/// URL that failed validation.
		url: String,
	},
	/// Base URL must be hierarchical (`https://host/...`).
	#[error("The base URL cannot be used as a base: {url}.")]
	OpaqueBaseUrl {
		/// URL that failed validation.
		url: String,
	},
	/// Endpoint paths must be non-empty.
	#[error("The {endpoint} endpoint path cannot be empty.")]
	EmptyEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
	},
	/// Refresh timeout must be positive when set.
	#[error("The refresh timeout must be positive.")]
	NonPositiveRefreshTimeout,
	/// User agent must be non-empty when set.
	#[error("The user agent cannot be empty.")]
	EmptyUserAgent,
}

/// Relative paths of the auth endpoints, joined onto [`ClientConfig::base_url`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthEndpoints {
	/// Credential exchange.
	pub login: String,
	/// Refresh-token exchange.
	pub refresh: String,
	/// Session invalidation.
	pub logout: String,
}
impl Default for AuthEndpoints {
	fn default() -> Self {
		Self {
			login: "auth/login".into(),
			refresh: "auth/refresh".into(),
			logout: "auth/logout".into(),
		}
	}
}

/// Validated client configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Root of the service API; resource paths are joined under it.
	pub base_url: Url,
	/// Auth endpoint paths.
	#[serde(default)]
	pub endpoints: AuthEndpoints,
	/// Upper bound for one refresh exchange. `None` waits indefinitely.
	#[serde(default)]
	pub refresh_timeout: Option<Duration>,
	/// Optional `User-Agent` sent with every call.
	#[serde(default)]
	pub user_agent: Option<String>,
}
impl ClientConfig {
	/// Starts a builder rooted at `base_url`.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Parses a JSON document and validates it.
	pub fn from_json(raw: &str) -> Result<Self> {
		let parsed: Self = serde_json::from_str(raw).map_err(ConfigError::from)?;
		let mut builder = Self::builder(parsed.base_url).endpoints(parsed.endpoints);

		if let Some(timeout) = parsed.refresh_timeout {
			builder = builder.refresh_timeout(timeout);
		}
		if let Some(agent) = parsed.user_agent {
			builder = builder.user_agent(agent);
		}

		Ok(builder.build().map_err(ConfigError::from)?)
	}

	/// Resolves `path` (relative, no leading slash required) against the base URL.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let relative = path.trim_start_matches('/');

		self.base_url
			.join(relative)
			.map_err(|source| ConfigError::InvalidEndpoint { path: path.to_owned(), source })
	}

	fn validate(&self) -> Result<(), ClientConfigError> {
		let url = &self.base_url;

		if url.cannot_be_a_base() {
			return Err(ClientConfigError::OpaqueBaseUrl { url: url.to_string() });
		}
		if url.scheme() != "https" && !(url.scheme() == "http" && is_loopback(url)) {
			return Err(ClientConfigError::InsecureBaseUrl { url: url.to_string() });
		}
		if url.query().is_some() || url.fragment().is_some() {
			return Err(ClientConfigError::BaseUrlHasQuery { url: url.to_string() });
		}

		for (endpoint, path) in [
			("login", &self.endpoints.login),
			("refresh", &self.endpoints.refresh),
			("logout", &self.endpoints.logout),
		] {
			if path.trim_matches('/').trim().is_empty() {
				return Err(ClientConfigError::EmptyEndpoint { endpoint });
			}
		}

		if self.refresh_timeout.is_some_and(|timeout| !timeout.is_positive()) {
			return Err(ClientConfigError::NonPositiveRefreshTimeout);
		}
		if self.user_agent.as_deref().is_some_and(|agent| agent.trim().is_empty()) {
			return Err(ClientConfigError::EmptyUserAgent);
		}

		Ok(())
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	base_url: Url,
	endpoints: AuthEndpoints,
	refresh_timeout: Option<Duration>,
	user_agent: Option<String>,
}
impl ClientConfigBuilder {
	fn new(base_url: Url) -> Self {
		Self { base_url, endpoints: AuthEndpoints::default(), refresh_timeout: None, user_agent: None }
	}

	/// Overrides all auth endpoint paths.
	pub fn endpoints(mut self, endpoints: AuthEndpoints) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Bounds each refresh exchange; pending callers fail with a timeout once it elapses.
	pub fn refresh_timeout(mut self, timeout: Duration) -> Self {
		self.refresh_timeout = Some(timeout);

		self
	}

	/// Sets the `User-Agent` header.
	pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
		self.user_agent = Some(agent.into());

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ClientConfigError> {
		let mut base_url = self.base_url;

		// Url::join drops the last segment unless the path ends with a slash.
		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());

			base_url.set_path(&path);
		}

		let config = ClientConfig {
			base_url,
			endpoints: self.endpoints,
			refresh_timeout: self.refresh_timeout,
			user_agent: self.user_agent,
		};

		config.validate()?;

		Ok(config)
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}
