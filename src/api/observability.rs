//! Raw click events, request logs, and service health.

// self
use crate::{
	_prelude::*,
	api::{Client, Page, PageRequest, TimeRange, projects::project_path},
	auth::{LinkId, ProjectId},
	error::ValidationError,
	http::ApiHttpClient,
};

/// Filter shared by the event listings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventQuery {
	range: TimeRange,
	link_id: Option<String>,
	page: PageRequest,
}
impl EventQuery {
	/// Events within `range`, first page.
	pub fn new(range: TimeRange) -> Self {
		Self { range, link_id: None, page: PageRequest::first() }
	}

	/// Restricts the listing to one link.
	pub fn link(mut self, link_id: impl Into<String>) -> Self {
		self.link_id = Some(link_id.into());

		self
	}

	/// Selects the page to fetch.
	pub fn page(mut self, page: PageRequest) -> Self {
		self.page = page;

		self
	}

	fn query(&self) -> Result<Vec<(&'static str, String)>, ValidationError> {
		let mut query = self.range.query()?;

		if let Some(link_id) = &self.link_id {
			query.push(("link_id", LinkId::new(link_id)?.into()));
		}

		query.extend(self.page.query()?);

		Ok(query)
	}
}

/// One served redirect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
	/// Event identifier.
	pub id: String,
	/// Link that was followed.
	pub link_id: LinkId,
	/// Instant of the click.
	#[serde(with = "time::serde::rfc3339")]
	pub at: OffsetDateTime,
	/// ISO country code, when resolved.
	#[serde(default)]
	pub country: Option<String>,
	/// Referring URL, when sent.
	#[serde(default)]
	pub referrer: Option<String>,
	/// Device class.
	#[serde(default)]
	pub device: Option<String>,
	/// Browser family.
	#[serde(default)]
	pub browser: Option<String>,
}

/// One API request the service recorded for the project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLog {
	/// Log entry identifier.
	pub id: String,
	/// HTTP method.
	pub method: String,
	/// Request path.
	pub path: String,
	/// Response status.
	pub status: u16,
	/// Server-side handling time in milliseconds.
	pub duration_ms: u64,
	/// Instant the request arrived.
	#[serde(with = "time::serde::rfc3339")]
	pub at: OffsetDateTime,
}

/// Service health as reported by the status endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
	/// Overall state, such as `ok` or `degraded`.
	pub status: String,
	/// Deployed service version.
	#[serde(default)]
	pub version: Option<String>,
	/// Per-component state.
	#[serde(default)]
	pub components: BTreeMap<String, String>,
}
impl ServiceStatus {
	/// Returns `true` when the service reports itself healthy.
	pub fn is_ok(&self) -> bool {
		self.status.eq_ignore_ascii_case("ok")
	}
}

impl<C> Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Click events for a project.
	pub async fn click_events(&self, project_id: &str, query: &EventQuery) -> Result<Page<ClickEvent>> {
		let project = ProjectId::new(project_id).map_err(ValidationError::from)?;
		let url = self
			.url_with_query(&format!("{}/events/clicks", project_path(&project)), &query.query()?)?;

		self.get_json("click_events", url).await
	}

	/// API request log for a project.
	pub async fn request_logs(&self, project_id: &str, query: &EventQuery) -> Result<Page<RequestLog>> {
		let project = ProjectId::new(project_id).map_err(ValidationError::from)?;
		let url = self
			.url_with_query(&format!("{}/events/requests", project_path(&project)), &query.query()?)?;

		self.get_json("request_logs", url).await
	}

	/// Service health.
	pub async fn service_status(&self) -> Result<ServiceStatus> {
		self.get_json("service_status", self.url("status")?).await
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	fn range() -> TimeRange {
		TimeRange::new(datetime!(2026-05-01 00:00 UTC), datetime!(2026-05-02 00:00 UTC))
			.expect("Range should be ordered.")
	}

	#[test]
	fn event_query_combines_filters() {
		let query = EventQuery::new(range()).link("lnk_1").page(PageRequest::first().limit(50));

		assert_eq!(
			query.query(),
			Ok(vec![
				("from", "2026-05-01T00:00:00Z".to_string()),
				("to", "2026-05-02T00:00:00Z".to_string()),
				("link_id", "lnk_1".to_string()),
				("limit", "50".to_string()),
			])
		);
		assert!(EventQuery::new(range()).link("bad id").query().is_err());
	}

	#[test]
	fn status_tolerates_missing_components() {
		let status: ServiceStatus =
			serde_json::from_str(r#"{"status":"OK"}"#).expect("Status should decode.");

		assert!(status.is_ok());
		assert!(status.components.is_empty());
	}
}
