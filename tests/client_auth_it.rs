#![cfg(feature = "reqwest")]

// std
use std::time::Duration as StdDuration;
// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use linkhub_client::{
	_preludet::*,
	api::{NewLink, PageRequest},
	auth::{Credentials, TokenPair},
	config::ClientConfig,
	error::{RefreshError, ValidationError},
	store::{MemoryStore, TokenStore},
};

const PROJECT_JSON: &str =
	r#"{"id":"proj_1","name":"Launch","created_at":"2026-02-01T09:00:00Z"}"#;

async fn logged_in_client(server: &MockServer) -> (ReqwestTestClient, Arc<MemoryStore>) {
	let (client, store) = build_reqwest_test_client(test_config(&server.base_url()));

	store.set(TokenPair::new("at1", "rt1")).await.expect("Seeding the memory store should succeed.");

	(client, store)
}

#[tokio::test]
async fn concurrent_401s_refresh_once_and_retry_with_new_token() {
	let server = MockServer::start_async().await;
	let (client, store) = logged_in_client(&server).await;
	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/projects/proj_1").header("authorization", "Bearer at1");
			then.status(401).body(r#"{"message":"token expired"}"#);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh").json_body(json!({ "refresh_token": "rt1" }));
			then.status(200)
				.header("content-type", "application/json")
				.delay(StdDuration::from_millis(200))
				.body(r#"{"access_token":"T2","refresh_token":"rt2"}"#);
		})
		.await;
	let accepted = server
		.mock_async(|when, then| {
			when.method(GET).path("/projects/proj_1").header("authorization", "Bearer T2");
			then.status(200).header("content-type", "application/json").body(PROJECT_JSON);
		})
		.await;
	let (a, b) = tokio::join!(client.project("proj_1"), client.project("proj_1"));

	assert_eq!(a.expect("Call A should succeed after refresh.").name, "Launch");
	assert_eq!(b.expect("Call B should succeed after refresh.").name, "Launch");

	rejected.assert_calls_async(2).await;
	refresh.assert_calls_async(1).await;
	accepted.assert_calls_async(2).await;

	assert_eq!(store.snapshot(), Some(TokenPair::new("T2", "rt2")));
	assert_eq!(client.refresh_metrics().exchanges(), 1);
}

#[tokio::test]
async fn second_401_surfaces_unauthenticated_without_another_refresh() {
	let server = MockServer::start_async().await;
	let (client, _store) = logged_in_client(&server).await;
	let always_rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/projects");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"T2","refresh_token":"rt2"}"#);
		})
		.await;
	let err = client
		.list_projects(&PageRequest::first())
		.await
		.expect_err("A retry that is still rejected must fail.");

	assert!(matches!(err, Error::Unauthenticated));

	always_rejected.assert_calls_async(2).await;
	refresh.assert_calls_async(1).await;
}

#[tokio::test]
async fn login_stores_pair_and_accepted_calls_never_refresh() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(test_config(&server.base_url()));
	let login = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/login")
				.json_body(json!({ "email": "ops@example.com", "password": "hunter2" }));
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"at1","refresh_token":"rt1"}"#);
		})
		.await;
	let me = server
		.mock_async(|when, then| {
			when.method(GET).path("/auth/me").header("authorization", "Bearer at1");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"id":"usr_1","email":"ops@example.com"}"#);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(500);
		})
		.await;
	let credentials =
		Credentials::new("ops@example.com", "hunter2").expect("Credentials should be valid.");

	assert!(!client.is_authenticated().await.expect("Store read should succeed."));

	client.login(&credentials).await.expect("Login should succeed.");

	assert_eq!(store.snapshot(), Some(TokenPair::new("at1", "rt1")));

	let user = client.current_user().await.expect("Accepted call should succeed.");

	assert_eq!(user.email, "ops@example.com");
	assert!(client.is_authenticated().await.expect("Store read should succeed."));

	login.assert_async().await;
	me.assert_async().await;
	refresh.assert_calls_async(0).await;
}

#[tokio::test]
async fn rejected_login_is_unauthenticated_and_stores_nothing() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(test_config(&server.base_url()));
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/login");
			then.status(401).body(r#"{"message":"bad credentials"}"#);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200);
		})
		.await;
	let credentials = Credentials::new("ops@example.com", "wrong").expect("Credentials should be valid.");
	let err = client.login(&credentials).await.expect_err("Bad credentials must fail.");

	assert!(matches!(err, Error::Unauthenticated));
	assert_eq!(store.snapshot(), None);

	login.assert_async().await;
	refresh.assert_calls_async(0).await;
}

#[tokio::test]
async fn rejected_refresh_clears_session_and_fails_call() {
	let server = MockServer::start_async().await;
	let (client, store) = logged_in_client(&server).await;
	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/status");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(400).body(r#"{"error":"invalid_grant"}"#);
		})
		.await;
	let err = client.service_status().await.expect_err("A rejected refresh must fail the call.");

	match &err {
		Error::RefreshFailed(RefreshError::Rejected { status, reason }) => {
			assert_eq!(*status, 400);
			assert_eq!(reason, "invalid_grant");
		},
		other => panic!("Expected a rejected refresh, got {other:?}."),
	}

	assert!(err.is_auth_failure());
	assert_eq!(store.snapshot(), None);

	rejected.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
}

#[tokio::test]
async fn configured_refresh_timeout_fails_stalled_refresh() {
	let server = MockServer::start_async().await;
	let limit = Duration::milliseconds(100);
	let config = ClientConfig::builder(
		Url::parse(&server.base_url()).expect("Mock server base URL should parse."),
	)
	.refresh_timeout(limit)
	.build()
	.expect("Config with a refresh timeout should be valid.");
	let (client, store) = build_reqwest_test_client(config);

	store.set(TokenPair::new("at1", "rt1")).await.expect("Seeding the memory store should succeed.");

	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/status");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.delay(StdDuration::from_secs(2))
				.body(r#"{"access_token":"T2","refresh_token":"rt2"}"#);
		})
		.await;
	let err = client.service_status().await.expect_err("A stalled refresh must time out.");

	assert!(matches!(err, Error::RefreshFailed(RefreshError::TimedOut(elapsed)) if elapsed == limit));
	assert_eq!(store.snapshot(), None);

	rejected.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
}

#[tokio::test]
async fn unsigned_call_without_session_reports_missing_refresh_token() {
	let server = MockServer::start_async().await;
	let (client, _store) = build_reqwest_test_client(test_config(&server.base_url()));
	let unsigned = server
		.mock_async(|when, then| {
			when.method(GET).path("/status").header_missing("authorization");
			then.status(401);
		})
		.await;
	let err = client.service_status().await.expect_err("No session means no refresh.");

	assert!(matches!(err, Error::RefreshFailed(RefreshError::MissingRefreshToken)));

	unsigned.assert_async().await;
}

#[tokio::test]
async fn other_errors_pass_through_without_refresh() {
	let server = MockServer::start_async().await;
	let (client, store) = logged_in_client(&server).await;
	let unavailable = server
		.mock_async(|when, then| {
			when.method(GET).path("/projects/proj_1/links");
			then.status(503).header("retry-after", "7").body(r#"{"message":"maintenance"}"#);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200);
		})
		.await;
	let err = client
		.list_links("proj_1", &PageRequest::first())
		.await
		.expect_err("A 503 should surface as an API error.");

	match err {
		Error::Api { status, message, retry_after } => {
			assert_eq!(status, 503);
			assert_eq!(message, "maintenance");
			assert_eq!(retry_after, Some(Duration::seconds(7)));
		},
		other => panic!("Expected an API error, got {other:?}."),
	}

	assert_eq!(store.snapshot(), Some(TokenPair::new("at1", "rt1")));

	unavailable.assert_async().await;
	refresh.assert_calls_async(0).await;
}

#[tokio::test]
async fn logout_clears_locally_even_when_remote_fails() {
	let server = MockServer::start_async().await;
	let (client, store) = logged_in_client(&server).await;
	let logout = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/logout")
				.header("authorization", "Bearer at1")
				.json_body(json!({ "refresh_token": "rt1" }));
			then.status(500);
		})
		.await;

	client.logout().await.expect("Logout should swallow remote failures.");

	assert_eq!(store.snapshot(), None);

	client.logout().await.expect("Logging out twice should succeed.");

	assert_eq!(store.snapshot(), None);

	logout.assert_calls_async(1).await;
}

#[tokio::test]
async fn invalid_arguments_fail_before_any_request() {
	let server = MockServer::start_async().await;
	let (client, _store) = logged_in_client(&server).await;
	let anything = server
		.mock_async(|_when, then| {
			then.status(200);
		})
		.await;

	assert!(matches!(
		client.project("").await,
		Err(Error::Validation(ValidationError::Identifier(_)))
	));
	assert!(matches!(
		client.link("proj_1", "../escape").await,
		Err(Error::Validation(ValidationError::Identifier(_)))
	));
	assert!(matches!(
		client.list_projects(&PageRequest::first().limit(1_000)).await,
		Err(Error::Validation(ValidationError::PageSize { .. }))
	));
	assert!(matches!(
		client
			.create_link(
				"proj_1",
				&NewLink::new("https://example.com/").expect("Destination should be valid.").slug("")
			)
			.await,
		Err(Error::Validation(ValidationError::MissingField { field: "slug" }))
	));

	anything.assert_calls_async(0).await;
}
