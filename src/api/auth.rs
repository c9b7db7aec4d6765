//! Login, logout, and the refresh exchange behind the session.

// self
use crate::{
	_prelude::*,
	api::Client,
	auth::{Credentials, TokenPair, TokenSecret},
	config::ClientConfig,
	error::RefreshError,
	http::{ApiHttpClient, ApiRequest, Method},
	obs::{self, CallKind, CallOutcome, CallSpan},
	pipeline,
	session::{RefreshFuture, TokenRefresher},
};

/// Account the current session belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	/// Account identifier.
	pub id: String,
	/// Login email.
	pub email: String,
	/// Display name.
	#[serde(default)]
	pub name: Option<String>,
}

#[derive(Serialize)]
struct RefreshBody<'a> {
	refresh_token: &'a str,
}

/// [`TokenRefresher`] that posts the refresh token to the configured refresh endpoint.
pub struct RefreshEndpoint<C>
where
	C: ?Sized + ApiHttpClient,
{
	config: Arc<ClientConfig>,
	http: Arc<C>,
}
impl<C> RefreshEndpoint<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Binds the endpoint to a configuration and transport.
	pub fn new(config: Arc<ClientConfig>, http: Arc<C>) -> Self {
		Self { config, http }
	}

	async fn exchange_now(&self, refresh_token: &TokenSecret) -> Result<TokenPair, RefreshError> {
		let url = self
			.config
			.endpoint(&self.config.endpoints.refresh)
			.map_err(|e| RefreshError::Exchange { message: e.to_string() })?;
		let mut request = ApiRequest::new(Method::Post, url)
			.with_json(&RefreshBody { refresh_token: refresh_token.expose() })
			.map_err(|e| RefreshError::Exchange { message: e.to_string() })?;

		request.user_agent = self.config.user_agent.clone();

		let response = self
			.http
			.execute(request)
			.await
			.map_err(|e| RefreshError::Exchange { message: e.to_string() })?;

		if (400..500).contains(&response.status) {
			return Err(RefreshError::Rejected {
				status: response.status,
				reason: pipeline::error_message(&response),
			});
		}
		if !response.is_success() {
			return Err(RefreshError::Exchange {
				message: format!(
					"HTTP {}: {}",
					response.status,
					pipeline::error_message(&response)
				),
			});
		}

		pipeline::decode(&response).map_err(|e| RefreshError::Exchange { message: e.to_string() })
	}
}
impl<C> TokenRefresher for RefreshEndpoint<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn exchange<'a>(&'a self, refresh_token: &'a TokenSecret) -> RefreshFuture<'a> {
		Box::pin(self.exchange_now(refresh_token))
	}
}

impl<C> Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Exchanges credentials for a token pair and stores it as the session.
	///
	/// Must not overlap an in-flight refresh on the same client.
	pub async fn login(&self, credentials: &Credentials) -> Result<TokenPair> {
		const KIND: CallKind = CallKind::Login;

		let span = CallSpan::new(KIND, "login");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.login_now(credentials)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	async fn login_now(&self, credentials: &Credentials) -> Result<TokenPair> {
		let url = self.url(&self.config().endpoints.login)?;
		let request = ApiRequest::new(Method::Post, url).with_json(credentials)?;
		let response = self.send_unguarded(request).await?;

		// Login is the credential check itself, so a 401 never triggers a refresh.
		if response.status == 401 {
			return Err(Error::Unauthenticated);
		}
		if !response.is_success() {
			return Err(pipeline::api_error(&response));
		}

		let pair = pipeline::decode::<TokenPair>(&response)?.into_complete().ok_or_else(|| {
			Error::Api {
				status: response.status,
				message: "login response carried an incomplete token pair".into(),
				retry_after: None,
			}
		})?;

		self.session().establish(pair.clone()).await?;

		Ok(pair)
	}

	/// Invalidates the session remotely and always clears it locally.
	///
	/// A failed remote call is logged and swallowed; calling this while logged out succeeds.
	pub async fn logout(&self) -> Result<()> {
		const KIND: CallKind = CallKind::Logout;

		let span = CallSpan::new(KIND, "logout");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async {
				match self.session().current().await {
					Ok(Some(pair)) =>
						if let Err(e) = self.remote_logout(&pair).await {
							obs::cleanup_degraded("remote_logout", &e);
						},
					Ok(None) => {},
					Err(e) => obs::cleanup_degraded("read_session", &e),
				}

				self.session().end().await
			})
			.await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	async fn remote_logout(&self, pair: &TokenPair) -> Result<()> {
		let url = self.url(&self.config().endpoints.logout)?;
		let request = ApiRequest::new(Method::Post, url)
			.with_json(&RefreshBody { refresh_token: pair.refresh_token.expose() })?
			.signed(Some(pair.access_token.clone()));
		let response = self.send_unguarded(request).await?;

		if response.is_success() { Ok(()) } else { Err(pipeline::api_error(&response)) }
	}

	/// Proactively refreshes the session, joining any refresh already in flight.
	pub async fn refresh_session(&self) -> Result<TokenPair> {
		Ok(self.session().refresh().await?)
	}

	/// Returns `true` when a complete token pair is stored.
	pub async fn is_authenticated(&self) -> Result<bool> {
		Ok(self.session().current().await?.is_some())
	}

	/// Account behind the current session.
	pub async fn current_user(&self) -> Result<User> {
		self.get_json("current_user", self.url("auth/me")?).await
	}
}
