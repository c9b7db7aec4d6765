//! Project CRUD.

// self
use crate::{
	_prelude::*,
	api::{Client, Page, PageRequest, require_text},
	auth::ProjectId,
	error::ValidationError,
	http::{ApiHttpClient, Method},
};

/// Container that owns links and their analytics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
	/// Project identifier.
	pub id: ProjectId,
	/// Display name.
	pub name: String,
	/// Free-form description.
	#[serde(default)]
	pub description: Option<String>,
	/// Number of links in the project, when reported.
	#[serde(default)]
	pub link_count: Option<u64>,
	/// Creation instant.
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}

/// Payload for creating a project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewProject {
	name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	description: Option<String>,
}
impl NewProject {
	/// Starts a project payload; the name cannot be blank.
	pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
		let name = name.into();

		require_text("name", &name)?;

		Ok(Self { name, description: None })
	}

	/// Adds a description.
	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());

		self
	}
}

/// Partial update for a project; unset fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProjectPatch {
	/// New display name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// New description.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}
impl ProjectPatch {
	fn validate(&self) -> Result<(), ValidationError> {
		if let Some(name) = self.name.as_deref() {
			require_text("name", name)?;
		}

		Ok(())
	}
}

pub(crate) fn project_path(project: &ProjectId) -> String {
	format!("projects/{project}")
}

impl<C> Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Lists projects visible to the session.
	pub async fn list_projects(&self, page: &PageRequest) -> Result<Page<Project>> {
		let url = self.url_with_query("projects", &page.query()?)?;

		self.get_json("list_projects", url).await
	}

	/// Fetches one project.
	pub async fn project(&self, project_id: &str) -> Result<Project> {
		let id = ProjectId::new(project_id).map_err(ValidationError::from)?;

		self.get_json("project", self.url(&project_path(&id))?).await
	}

	/// Creates a project.
	pub async fn create_project(&self, project: &NewProject) -> Result<Project> {
		self.send_json("create_project", Method::Post, self.url("projects")?, project).await
	}

	/// Applies a partial update to a project.
	pub async fn update_project(&self, project_id: &str, patch: &ProjectPatch) -> Result<Project> {
		let id = ProjectId::new(project_id).map_err(ValidationError::from)?;

		patch.validate()?;

		self.send_json("update_project", Method::Patch, self.url(&project_path(&id))?, patch).await
	}

	/// Deletes a project and its links.
	pub async fn delete_project(&self, project_id: &str) -> Result<()> {
		let id = ProjectId::new(project_id).map_err(ValidationError::from)?;

		self.delete("delete_project", self.url(&project_path(&id))?).await
	}
}
