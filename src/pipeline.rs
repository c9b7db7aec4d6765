//! Explicit `sign → send → gatekeep` stages every API call runs through.
//!
//! [`Pipeline::call`] composes the stages: the signer attaches the stored access token, the
//! transport sends the request, and [`gatekeep`] classifies the response. A `401` on the first
//! attempt parks the call on [`Session::on_auth_failure`] and re-sends it once with the token
//! that refresh produced; a `401` on the retry is final.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::TransportError,
	http::{ApiHttpClient, ApiRequest, ApiResponse},
	obs::{self, CallKind, CallOutcome, CallSpan},
	session::Session,
};

const UNAUTHORIZED: u16 = 401;
const BODY_PREVIEW_LIMIT: usize = 256;

/// Which attempt of a logical call a response belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attempt {
	/// Original send.
	First,
	/// The single re-send after a refresh.
	Retry,
}

/// Gatekeeper decision for a completed call.
#[derive(Debug)]
pub enum Verdict {
	/// 2xx; hand the response to the caller.
	Pass(ApiResponse),
	/// `401` on the first attempt; refresh and retry.
	Refresh,
	/// Terminal failure for the call.
	Fail(Error),
}

/// Classifies `response` for the given attempt.
pub fn gatekeep(response: ApiResponse, attempt: Attempt) -> Verdict {
	if response.is_success() {
		return Verdict::Pass(response);
	}
	if response.status == UNAUTHORIZED {
		return match attempt {
			Attempt::First => Verdict::Refresh,
			Attempt::Retry => Verdict::Fail(Error::Unauthenticated),
		};
	}

	Verdict::Fail(api_error(&response))
}

/// Maps a non-success response into [`Error::Api`].
pub fn api_error(response: &ApiResponse) -> Error {
	Error::Api {
		status: response.status,
		message: error_message(response),
		retry_after: response.retry_after,
	}
}

/// Extracts `message` or `error` from a JSON error body, else a bounded body preview.
pub fn error_message(response: &ApiResponse) -> String {
	#[derive(Deserialize)]
	struct ErrorBody {
		message: Option<String>,
		error: Option<String>,
	}

	let structured = serde_json::from_slice::<ErrorBody>(&response.body)
		.ok()
		.and_then(|body| body.message.or(body.error));

	if let Some(text) = structured {
		return text;
	}

	let preview = String::from_utf8_lossy(&response.body);
	let preview = preview.trim();

	if preview.is_empty() {
		return "no response body".into();
	}

	preview.chars().take(BODY_PREVIEW_LIMIT).collect()
}

/// Deserializes a success body, locating the failing field on mismatch.
pub fn decode<T>(response: &ApiResponse) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(&response.body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::Decode { source, status: response.status })
}

/// Composes the signer, transport, and gatekeeper over one [`Session`].
pub struct Pipeline<C>
where
	C: ?Sized + ApiHttpClient,
{
	http: Arc<C>,
	session: Arc<Session>,
	user_agent: Option<String>,
}
impl<C> Pipeline<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a pipeline sending through `http` and signing from `session`.
	pub fn new(http: Arc<C>, session: Arc<Session>, user_agent: Option<String>) -> Self {
		Self { http, session, user_agent }
	}

	/// Session backing the signer and refresh stages.
	pub fn session(&self) -> &Arc<Session> {
		&self.session
	}

	/// Signer stage: attaches the current access token, or leaves the request unsigned.
	pub async fn sign(&self, request: &ApiRequest) -> Result<ApiRequest> {
		let token = self.session.access_token().await?;

		Ok(request.signed(token))
	}

	/// Transport stage.
	pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse> {
		if request.user_agent.is_none() {
			request.user_agent = self.user_agent.clone();
		}

		self.http.execute(request).await.map_err(|e| TransportError::network(e).into())
	}

	/// Runs the full pipeline for an authenticated call.
	pub async fn call(&self, stage: &'static str, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: CallKind = CallKind::Api;

		let span = CallSpan::new(KIND, stage);

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.call_gatekept(request)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	async fn call_gatekept(&self, request: ApiRequest) -> Result<ApiResponse> {
		let signed = self.sign(&request).await?;

		match gatekeep(self.send(signed).await?, Attempt::First) {
			Verdict::Pass(response) => Ok(response),
			Verdict::Fail(err) => Err(err),
			Verdict::Refresh => {
				obs::record_call_outcome(CallKind::Api, CallOutcome::Retried);

				let pair = self.session.on_auth_failure().await?;
				let retried = request.signed(Some(pair.access_token));

				match gatekeep(self.send(retried).await?, Attempt::Retry) {
					Verdict::Pass(response) => Ok(response),
					Verdict::Fail(err) => Err(err),
					Verdict::Refresh => Err(Error::Unauthenticated),
				}
			},
		}
	}
}
impl<C> Clone for Pipeline<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http: Arc::clone(&self.http),
			session: Arc::clone(&self.session),
			user_agent: self.user_agent.clone(),
		}
	}
}
impl<C> Debug for Pipeline<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Pipeline").field("session", &self.session).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn response(status: u16, body: &str) -> ApiResponse {
		ApiResponse { status, retry_after: None, body: body.as_bytes().to_vec() }
	}

	#[test]
	fn only_first_attempt_401_requests_refresh() {
		assert!(matches!(gatekeep(response(401, ""), Attempt::First), Verdict::Refresh));
		assert!(matches!(
			gatekeep(response(401, ""), Attempt::Retry),
			Verdict::Fail(Error::Unauthenticated)
		));
		assert!(matches!(gatekeep(response(204, ""), Attempt::Retry), Verdict::Pass(_)));
	}

	#[test]
	fn other_statuses_pass_through_as_api_errors() {
		let verdict = gatekeep(response(403, r#"{"message":"forbidden project"}"#), Attempt::First);

		match verdict {
			Verdict::Fail(Error::Api { status, message, .. }) => {
				assert_eq!(status, 403);
				assert_eq!(message, "forbidden project");
			},
			other => panic!("Expected an API error, got {other:?}."),
		}
	}

	#[test]
	fn error_message_falls_back_to_preview() {
		assert_eq!(error_message(&response(500, r#"{"error":"db down"}"#)), "db down");
		assert_eq!(error_message(&response(502, "  bad gateway  ")), "bad gateway");
		assert_eq!(error_message(&response(503, "")), "no response body");
		assert_eq!(error_message(&response(500, &"x".repeat(1000))).len(), BODY_PREVIEW_LIMIT);
	}

	#[test]
	fn decode_reports_field_path() {
		#[derive(Debug, Deserialize)]
		#[allow(dead_code)]
		struct Shape {
			count: u64,
		}

		let err = decode::<Shape>(&response(200, r#"{"count":"many"}"#))
			.expect_err("String count should fail to decode.");

		match err {
			Error::Decode { source, status } => {
				assert_eq!(status, 200);
				assert_eq!(source.path().to_string(), "count");
			},
			other => panic!("Expected a decode error, got {other:?}."),
		}
	}
}
