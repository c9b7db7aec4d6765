//! Walks through login, an expired access token, and the transparent refresh-and-retry against a
//! local mock of the service.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use linkhub_client::{
	api::{Client, NewLink, PageRequest},
	auth::Credentials,
	config::ClientConfig,
	store::{MemoryStore, TokenStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let login_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/login");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-access-1\",\"refresh_token\":\"demo-refresh-1\"}");
		})
		.await;
	let expired_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/projects/proj_demo/links")
				.header("authorization", "Bearer demo-access-1");
			then.status(401).body("{\"message\":\"access token expired\"}");
		})
		.await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-access-2\",\"refresh_token\":\"demo-refresh-2\"}");
		})
		.await;
	let created_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/projects/proj_demo/links")
				.header("authorization", "Bearer demo-access-2");
			then.status(201).header("content-type", "application/json").body(
				"{\"id\":\"lnk_1\",\"project_id\":\"proj_demo\",\"slug\":\"launch\",\"destination\":\"https://example.com/launch\",\"created_at\":\"2026-01-01T00:00:00Z\"}",
			);
		})
		.await;
	let list_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/projects");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"items\":[],\"next_cursor\":null}");
		})
		.await;
	let config = ClientConfig::builder(Url::parse(&server.base_url())?)
		.user_agent("linkhub-walkthrough/0.1")
		.build()?;
	let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::default());
	let client = Client::new(config, store)?;

	client.login(&Credentials::new("demo@example.com", "demo-password")?).await?;

	let link = client
		.create_link("proj_demo", &NewLink::new("https://example.com/launch")?.slug("launch"))
		.await?;

	println!("Created {} after {} refresh exchange(s).", link.slug, client.refresh_metrics().exchanges());

	let page = client.list_projects(&PageRequest::first().limit(20)).await?;

	println!("Listed {} project(s); more pages: {}.", page.items.len(), page.has_more());

	login_mock.assert_async().await;
	expired_mock.assert_async().await;
	refresh_mock.assert_async().await;
	created_mock.assert_async().await;
	list_mock.assert_async().await;

	Ok(())
}
