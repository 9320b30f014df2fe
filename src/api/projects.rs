//
//  codeship
//  api/projects.rs
//

//! Project resources and operations.
//!
//! A project ties a repository to the CI service. Projects come in two
//! flavors: **basic** projects run their pipelines from web-configured
//! commands, **pro** projects are driven by `codeship-services.yml` and
//! `codeship-steps.yml` files in the repository.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example(org: codeship::Organization) -> codeship::Result<()> {
//! for project in org.list_projects().await? {
//!     println!("{} [{}] {}", project.uuid, project.project_type, project.name);
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::organization::Organization;

/// The flavor of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    /// Web-configured pipelines.
    Basic,
    /// Docker-based pipelines configured in the repository.
    Pro,
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectType::Basic => write!(f, "basic"),
            ProjectType::Pro => write!(f, "pro"),
        }
    }
}

/// A CodeShip project.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    /// Unique identifier of the project.
    pub uuid: Uuid,

    /// Owning organization.
    pub organization_uuid: Uuid,

    /// Human-readable project name, usually `owner/repository`.
    pub name: String,

    /// Whether this is a basic or pro project.
    #[serde(rename = "type")]
    pub project_type: ProjectType,

    /// Clone URL of the backing repository.
    pub repository_url: String,

    /// Hosting provider of the repository (e.g. `github`, `bitbucket`).
    #[serde(default)]
    pub repository_provider: Option<String>,

    /// User the service authenticates against the provider as.
    #[serde(default)]
    pub authentication_user: Option<String>,

    /// Public deploy key registered with the repository.
    #[serde(default)]
    pub ssh_key: Option<String>,

    /// Teams with access to the project.
    #[serde(default)]
    pub team_ids: Vec<i64>,

    /// When the project was created.
    pub created_at: DateTime<Utc>,

    /// When the project was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Payload for [`Organization::create_project`].
///
/// # Example
///
/// ```rust
/// use codeship::api::{CreateProjectRequest, ProjectType};
///
/// let request = CreateProjectRequest {
///     repository_url: "git@github.com:acme/widget.git".to_string(),
///     project_type: ProjectType::Pro,
///     team_ids: Vec::new(),
/// };
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct CreateProjectRequest {
    /// Clone URL of the repository to build.
    pub repository_url: String,

    /// Project flavor to set up.
    #[serde(rename = "type")]
    pub project_type: ProjectType,

    /// Teams granted access; empty grants the default team only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub team_ids: Vec<i64>,
}

#[derive(Deserialize)]
struct ProjectResponse {
    project: Project,
}

#[derive(Deserialize)]
struct ProjectListResponse {
    projects: Vec<Project>,
}

impl Organization {
    /// Lists the organization's projects.
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        let path = format!("/organizations/{}/projects", self.uuid);
        let raw = self.request::<()>(Method::GET, &path, None).await?;
        let response: ProjectListResponse =
            serde_json::from_slice(&raw).map_err(Error::Decoding)?;
        Ok(response.projects)
    }

    /// Fetches a single project by UUID.
    pub async fn get_project(&self, project_uuid: Uuid) -> Result<Project> {
        let path = format!("/organizations/{}/projects/{}", self.uuid, project_uuid);
        let raw = self.request::<()>(Method::GET, &path, None).await?;
        let response: ProjectResponse = serde_json::from_slice(&raw).map_err(Error::Decoding)?;
        Ok(response.project)
    }

    /// Creates a project for a repository.
    ///
    /// The authenticated user needs the `project.write` scope on this
    /// organization.
    pub async fn create_project(&self, request: &CreateProjectRequest) -> Result<Project> {
        let path = format!("/organizations/{}/projects", self.uuid);
        let raw = self.request(Method::POST, &path, Some(request)).await?;
        let response: ProjectResponse = serde_json::from_slice(&raw).map_err(Error::Decoding)?;
        Ok(response.project)
    }
}
