//! Short links within a project.

// self
use crate::{
	_prelude::*,
	api::{Client, Page, PageRequest, projects::project_path},
	auth::{LinkId, ProjectId},
	error::ValidationError,
	http::{ApiHttpClient, Method},
};

/// Shortened URL and its metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
	/// Link identifier.
	pub id: LinkId,
	/// Owning project.
	pub project_id: ProjectId,
	/// Path segment of the short URL.
	pub slug: String,
	/// Redirect target.
	pub destination: Url,
	/// Fully qualified short URL, when the service renders it.
	#[serde(default)]
	pub short_url: Option<Url>,
	/// Display title.
	#[serde(default)]
	pub title: Option<String>,
	/// Free-form labels.
	#[serde(default)]
	pub tags: Vec<String>,
	/// Whether the link stopped redirecting.
	#[serde(default)]
	pub archived: bool,
	/// Creation instant.
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	/// Instant after which the link stops redirecting.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub expires_at: Option<OffsetDateTime>,
}

/// Payload for creating a link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewLink {
	destination: Url,
	#[serde(skip_serializing_if = "Option::is_none")]
	slug: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	title: Option<String>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	tags: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none", with = "time::serde::rfc3339::option")]
	expires_at: Option<OffsetDateTime>,
}
impl NewLink {
	/// Starts a link payload pointing at `destination`, which must be an absolute http(s) URL.
	pub fn new(destination: &str) -> Result<Self, ValidationError> {
		Ok(Self {
			destination: parse_destination(destination)?,
			slug: None,
			title: None,
			tags: Vec::new(),
			expires_at: None,
		})
	}

	/// Requests a specific slug instead of a generated one.
	pub fn slug(mut self, slug: impl Into<String>) -> Self {
		self.slug = Some(slug.into());

		self
	}

	/// Sets the display title.
	pub fn title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());

		self
	}

	/// Adds a label.
	pub fn tag(mut self, tag: impl Into<String>) -> Self {
		self.tags.push(tag.into());

		self
	}

	/// Stops redirecting after `at`.
	pub fn expires_at(mut self, at: OffsetDateTime) -> Self {
		self.expires_at = Some(at);

		self
	}

	fn validate(&self) -> Result<(), ValidationError> {
		validate_slug(self.slug.as_deref())
	}
}

/// Partial update for a link; unset fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LinkPatch {
	/// New redirect target.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub destination: Option<Url>,
	/// New slug.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub slug: Option<String>,
	/// New title.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	/// Replacement label set.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tags: Option<Vec<String>>,
	/// Archive or restore the link.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub archived: Option<bool>,
}
impl LinkPatch {
	/// Patch that only retargets the link.
	pub fn retarget(destination: &str) -> Result<Self, ValidationError> {
		Ok(Self { destination: Some(parse_destination(destination)?), ..Default::default() })
	}

	fn validate(&self) -> Result<(), ValidationError> {
		if let Some(destination) = &self.destination {
			check_scheme(destination)?;
		}

		validate_slug(self.slug.as_deref())
	}
}

fn parse_destination(raw: &str) -> Result<Url, ValidationError> {
	let url = Url::parse(raw.trim()).map_err(|_| ValidationError::InvalidUrl {
		field: "destination",
		value: raw.to_owned(),
	})?;

	check_scheme(&url)?;

	Ok(url)
}

fn check_scheme(url: &Url) -> Result<(), ValidationError> {
	match url.scheme() {
		"http" | "https" if url.has_host() => Ok(()),
		_ => Err(ValidationError::InvalidUrl { field: "destination", value: url.to_string() }),
	}
}

fn validate_slug(slug: Option<&str>) -> Result<(), ValidationError> {
	match slug {
		Some(slug) if slug.trim().is_empty() => Err(ValidationError::MissingField { field: "slug" }),
		_ => Ok(()),
	}
}

pub(crate) fn link_path(project: &ProjectId, link: &LinkId) -> String {
	format!("{}/links/{link}", project_path(project))
}

pub(crate) fn parse_ids(project_id: &str, link_id: &str) -> Result<(ProjectId, LinkId), ValidationError> {
	Ok((ProjectId::new(project_id)?, LinkId::new(link_id)?))
}

impl<C> Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Lists links in a project.
	pub async fn list_links(&self, project_id: &str, page: &PageRequest) -> Result<Page<Link>> {
		let project = ProjectId::new(project_id).map_err(ValidationError::from)?;
		let url =
			self.url_with_query(&format!("{}/links", project_path(&project)), &page.query()?)?;

		self.get_json("list_links", url).await
	}

	/// Fetches one link.
	pub async fn link(&self, project_id: &str, link_id: &str) -> Result<Link> {
		let (project, link) = parse_ids(project_id, link_id)?;

		self.get_json("link", self.url(&link_path(&project, &link))?).await
	}

	/// Creates a link in a project.
	pub async fn create_link(&self, project_id: &str, link: &NewLink) -> Result<Link> {
		let project = ProjectId::new(project_id).map_err(ValidationError::from)?;

		link.validate()?;

		let url = self.url(&format!("{}/links", project_path(&project)))?;

		self.send_json("create_link", Method::Post, url, link).await
	}

	/// Applies a partial update to a link.
	pub async fn update_link(&self, project_id: &str, link_id: &str, patch: &LinkPatch) -> Result<Link> {
		let (project, link) = parse_ids(project_id, link_id)?;

		patch.validate()?;

		self.send_json("update_link", Method::Patch, self.url(&link_path(&project, &link))?, patch)
			.await
	}

	/// Deletes a link.
	pub async fn delete_link(&self, project_id: &str, link_id: &str) -> Result<()> {
		let (project, link) = parse_ids(project_id, link_id)?;

		self.delete("delete_link", self.url(&link_path(&project, &link))?).await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn destination_must_be_absolute_http() {
		assert!(NewLink::new("https://example.com/launch").is_ok());
		assert!(matches!(
			NewLink::new("ftp://example.com/file"),
			Err(ValidationError::InvalidUrl { field: "destination", .. })
		));
		assert!(matches!(
			NewLink::new("/relative/path"),
			Err(ValidationError::InvalidUrl { field: "destination", .. })
		));
		assert!(LinkPatch::retarget("mailto:ops@example.com").is_err());
	}

	#[test]
	fn new_link_serializes_only_set_fields() {
		let link = NewLink::new("https://example.com/").expect("Destination should be valid.").tag("q3");
		let json = serde_json::to_value(&link).expect("Payload should serialize.");

		assert_eq!(json, serde_json::json!({ "destination": "https://example.com/", "tags": ["q3"] }));
	}

	#[test]
	fn blank_slug_is_rejected() {
		let link = NewLink::new("https://example.com/").expect("Destination should be valid.").slug(" ");

		assert_eq!(link.validate(), Err(ValidationError::MissingField { field: "slug" }));
	}

	#[test]
	fn link_paths_nest_under_project() {
		let (project, link) = parse_ids("proj_1", "lnk_9").expect("Identifiers should be valid.");

		assert_eq!(link_path(&project, &link), "projects/proj_1/links/lnk_9");
		assert!(parse_ids("proj_1", "a/b").is_err());
	}
}
