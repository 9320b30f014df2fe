//
//  codeship
//  api/builds.rs
//

//! Build resources and operations.
//!
//! A build is one run of a project's CI workflow against a specific ref
//! and commit. Basic projects expose per-build **pipelines**; pro
//! projects expose **services** and **steps** instead.
//!
//! # Build lifecycle
//!
//! ```text
//! testing -> success | error | stopped
//! ```
//!
//! Starting, stopping and restarting are fire-and-forget: the service
//! acknowledges with `202 Accepted` and an empty body, and the new state
//! shows up on the next fetch.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example(org: codeship::Organization, project: uuid::Uuid) -> codeship::Result<()> {
//! for build in org.list_builds(project).await? {
//!     println!("{} {} ({})", build.uuid, build.status, build.git_ref);
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::organization::Organization;

/// A single run of a project's CI workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct Build {
    /// Unique identifier of the build.
    pub uuid: Uuid,

    /// Project this build belongs to.
    pub project_uuid: Uuid,

    /// Organization the project belongs to.
    pub organization_uuid: Uuid,

    /// Git reference that was built, e.g. `heads/main`.
    #[serde(rename = "ref")]
    pub git_ref: String,

    /// Commit the build ran against.
    pub commit_sha: String,

    /// First line of the commit message, as reported by the provider.
    #[serde(default)]
    pub commit_message: Option<String>,

    /// Current status: `testing`, `success`, `error` or `stopped`.
    pub status: String,

    /// User who triggered the build, when known.
    #[serde(default)]
    pub username: Option<String>,

    /// When the build entered the queue.
    pub queued_at: DateTime<Utc>,

    /// When a build machine picked the build up.
    #[serde(default)]
    pub allocated_at: Option<DateTime<Utc>>,

    /// When the build finished, for completed builds.
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

/// A pipeline run within a build (basic projects only).
#[derive(Debug, Clone, Deserialize)]
pub struct BuildPipeline {
    /// Unique identifier of the pipeline run.
    pub uuid: Uuid,

    /// Build this pipeline belongs to.
    pub build_uuid: Uuid,

    /// Pipeline type reported by the service.
    #[serde(rename = "type")]
    pub pipeline_type: String,

    /// Current status of the pipeline run.
    pub status: String,

    /// Runtime metrics (duration, container counts, ...), stringly keyed.
    #[serde(default)]
    pub metrics: HashMap<String, String>,

    /// When the pipeline record was created.
    pub created_at: DateTime<Utc>,

    /// When the pipeline record was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A service container taking part in a build (pro projects only).
#[derive(Debug, Clone, Deserialize)]
pub struct BuildService {
    /// Unique identifier of the service instance.
    pub uuid: Uuid,

    /// Build this service belongs to.
    pub build_uuid: Uuid,

    /// Service name from `codeship-services.yml`.
    pub name: String,

    /// Current status, when reported.
    #[serde(default)]
    pub status: Option<String>,

    /// When the service record was last updated.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A step executed during a build (pro projects only).
///
/// Steps mirror `codeship-steps.yml`; grouped steps carry their children
/// in [`BuildStep::steps`].
#[derive(Debug, Clone, Deserialize)]
pub struct BuildStep {
    /// Unique identifier of the step.
    pub uuid: Uuid,

    /// Build this step belongs to.
    pub build_uuid: Uuid,

    /// Service the step ran on.
    #[serde(default)]
    pub service_uuid: Option<Uuid>,

    /// Step name from the steps file.
    #[serde(default)]
    pub name: Option<String>,

    /// Step type: `run`, `parallel` or `serial`.
    #[serde(rename = "type")]
    pub step_type: String,

    /// Current status of the step.
    pub status: String,

    /// Command executed, for `run` steps.
    #[serde(default)]
    pub command: Option<String>,

    /// Tag/branch restriction the step declares, if any.
    #[serde(default)]
    pub tag: Option<String>,

    /// When the step started executing.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    /// When the step finished.
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,

    /// Child steps, for `parallel` and `serial` groups.
    #[serde(default)]
    pub steps: Vec<BuildStep>,
}

#[derive(Serialize)]
struct CreateBuildRequest<'a> {
    #[serde(rename = "ref")]
    git_ref: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    commit_sha: Option<&'a str>,
}

#[derive(Deserialize)]
struct BuildResponse {
    build: Build,
}

#[derive(Deserialize)]
struct BuildListResponse {
    builds: Vec<Build>,
}

#[derive(Deserialize)]
struct PipelineListResponse {
    pipelines: Vec<BuildPipeline>,
}

#[derive(Deserialize)]
struct ServiceListResponse {
    services: Vec<BuildService>,
}

#[derive(Deserialize)]
struct StepListResponse {
    steps: Vec<BuildStep>,
}

impl Organization {
    /// Lists a project's builds, most recent first.
    pub async fn list_builds(&self, project_uuid: Uuid) -> Result<Vec<Build>> {
        let path = format!(
            "/organizations/{}/projects/{}/builds",
            self.uuid, project_uuid
        );
        let raw = self.request::<()>(Method::GET, &path, None).await?;
        let response: BuildListResponse = serde_json::from_slice(&raw).map_err(Error::Decoding)?;
        Ok(response.builds)
    }

    /// Fetches a single build.
    pub async fn get_build(&self, project_uuid: Uuid, build_uuid: Uuid) -> Result<Build> {
        let path = format!(
            "/organizations/{}/projects/{}/builds/{}",
            self.uuid, project_uuid, build_uuid
        );
        let raw = self.request::<()>(Method::GET, &path, None).await?;
        let response: BuildResponse = serde_json::from_slice(&raw).map_err(Error::Decoding)?;
        Ok(response.build)
    }

    /// Triggers a build of `git_ref`, optionally pinned to a commit.
    ///
    /// The service acknowledges with an empty `202`; poll
    /// [`Organization::list_builds`] to observe the new build.
    pub async fn create_build(
        &self,
        project_uuid: Uuid,
        git_ref: &str,
        commit_sha: Option<&str>,
    ) -> Result<()> {
        let path = format!(
            "/organizations/{}/projects/{}/builds",
            self.uuid, project_uuid
        );
        let request = CreateBuildRequest { git_ref, commit_sha };
        self.request(Method::POST, &path, Some(&request)).await?;
        Ok(())
    }

    /// Stops a running build.
    pub async fn stop_build(&self, project_uuid: Uuid, build_uuid: Uuid) -> Result<()> {
        let path = format!(
            "/organizations/{}/projects/{}/builds/{}/stop",
            self.uuid, project_uuid, build_uuid
        );
        self.request::<()>(Method::POST, &path, None).await?;
        Ok(())
    }

    /// Restarts a finished build with the same ref and commit.
    pub async fn restart_build(&self, project_uuid: Uuid, build_uuid: Uuid) -> Result<()> {
        let path = format!(
            "/organizations/{}/projects/{}/builds/{}/restart",
            self.uuid, project_uuid, build_uuid
        );
        self.request::<()>(Method::POST, &path, None).await?;
        Ok(())
    }

    /// Lists the pipelines of a build (basic projects).
    pub async fn list_build_pipelines(
        &self,
        project_uuid: Uuid,
        build_uuid: Uuid,
    ) -> Result<Vec<BuildPipeline>> {
        let path = format!(
            "/organizations/{}/projects/{}/builds/{}/pipelines",
            self.uuid, project_uuid, build_uuid
        );
        let raw = self.request::<()>(Method::GET, &path, None).await?;
        let response: PipelineListResponse =
            serde_json::from_slice(&raw).map_err(Error::Decoding)?;
        Ok(response.pipelines)
    }

    /// Lists the service containers of a build (pro projects).
    pub async fn list_build_services(
        &self,
        project_uuid: Uuid,
        build_uuid: Uuid,
    ) -> Result<Vec<BuildService>> {
        let path = format!(
            "/organizations/{}/projects/{}/builds/{}/services",
            self.uuid, project_uuid, build_uuid
        );
        let raw = self.request::<()>(Method::GET, &path, None).await?;
        let response: ServiceListResponse =
            serde_json::from_slice(&raw).map_err(Error::Decoding)?;
        Ok(response.services)
    }

    /// Lists the steps of a build (pro projects).
    pub async fn list_build_steps(
        &self,
        project_uuid: Uuid,
        build_uuid: Uuid,
    ) -> Result<Vec<BuildStep>> {
        let path = format!(
            "/organizations/{}/projects/{}/builds/{}/steps",
            self.uuid, project_uuid, build_uuid
        );
        let raw = self.request::<()>(Method::GET, &path, None).await?;
        let response: StepListResponse = serde_json::from_slice(&raw).map_err(Error::Decoding)?;
        Ok(response.steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Authentication, Client};
    use mockito::{Matcher, Server};
    use std::sync::Arc;

    const ORG_UUID: &str = "28123f10-e33d-5533-b53f-111ef8d7b14f";
    const PROJECT_UUID: &str = "7de09100-7aeb-0136-8a51-4a9a9d71d5a2";

    fn build_json() -> serde_json::Value {
        serde_json::json!({
            "uuid": "25a3dd8c-eb3e-4e75-1298-8cbcbe621342",
            "project_uuid": PROJECT_UUID,
            "organization_uuid": ORG_UUID,
            "ref": "heads/main",
            "commit_sha": "185ab4c3dc4eda0bbeb0a56aaf3f9df0e073b9e7",
            "commit_message": "implement main functionality",
            "status": "success",
            "username": "shipper",
            "queued_at": "2024-03-05T08:00:00.000Z",
            "allocated_at": "2024-03-05T08:00:05.000Z",
            "finished_at": "2024-03-05T08:04:32.000Z"
        })
    }

    // The handle only holds a Weak reference, so the Arc must stay alive
    // for the duration of the test.
    async fn org_against(server: &Server) -> (Arc<Client>, Organization) {
        let client = Arc::new(
            Client::builder()
                .username("user")
                .password("pass")
                .base_url(&server.url())
                .build()
                .expect("client should build"),
        );
        client
            .set_authentication(Some(Authentication {
                access_token: "tok".to_string(),
                expires_at: chrono::Utc::now().timestamp() + 3600,
                organizations: Vec::new(),
            }))
            .await;
        let uuid: Uuid = ORG_UUID.parse().expect("valid uuid");
        let org = Organization::new(uuid, "acme", &[], Arc::downgrade(&client));
        (client, org)
    }

    fn project_uuid() -> Uuid {
        PROJECT_UUID.parse().expect("valid uuid")
    }

    #[tokio::test]
    async fn test_list_builds_unwraps_the_list() {
        let mut server = Server::new_async().await;
        server
            .mock(
                "GET",
                format!("/organizations/{ORG_UUID}/projects/{PROJECT_UUID}/builds").as_str(),
            )
            .with_status(200)
            .with_body(serde_json::json!({ "builds": [build_json()] }).to_string())
            .create_async()
            .await;

        let (_client, org) = org_against(&server).await;
        let builds = org
            .list_builds(project_uuid())
            .await
            .expect("list should parse");
        assert_eq!(builds.len(), 1);
        assert_eq!(builds[0].git_ref, "heads/main");
        assert_eq!(builds[0].status, "success");
        assert_eq!(builds[0].username.as_deref(), Some("shipper"));
        assert!(builds[0].finished_at.is_some());
    }

    #[tokio::test]
    async fn test_get_build_unwraps_the_resource() {
        let build_uuid = "25a3dd8c-eb3e-4e75-1298-8cbcbe621342";
        let mut server = Server::new_async().await;
        server
            .mock(
                "GET",
                format!(
                    "/organizations/{ORG_UUID}/projects/{PROJECT_UUID}/builds/{build_uuid}"
                )
                .as_str(),
            )
            .with_status(200)
            .with_body(serde_json::json!({ "build": build_json() }).to_string())
            .create_async()
            .await;

        let (_client, org) = org_against(&server).await;
        let build = org
            .get_build(project_uuid(), build_uuid.parse().expect("valid uuid"))
            .await
            .expect("build should parse");
        assert_eq!(build.commit_sha, "185ab4c3dc4eda0bbeb0a56aaf3f9df0e073b9e7");
    }

    #[tokio::test]
    async fn test_create_build_posts_ref_and_sha() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock(
                "POST",
                format!("/organizations/{ORG_UUID}/projects/{PROJECT_UUID}/builds").as_str(),
            )
            .match_body(Matcher::Json(serde_json::json!({
                "ref": "heads/main",
                "commit_sha": "185ab4c3"
            })))
            .with_status(202)
            .create_async()
            .await;

        let (_client, org) = org_against(&server).await;
        org.create_build(project_uuid(), "heads/main", Some("185ab4c3"))
            .await
            .expect("create should succeed");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_build_without_sha_omits_the_field() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock(
                "POST",
                format!("/organizations/{ORG_UUID}/projects/{PROJECT_UUID}/builds").as_str(),
            )
            .match_body(Matcher::Exact(r#"{"ref":"heads/main"}"#.to_string()))
            .with_status(202)
            .create_async()
            .await;

        let (_client, org) = org_against(&server).await;
        org.create_build(project_uuid(), "heads/main", None)
            .await
            .expect("create should succeed");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_stop_and_restart_hit_the_action_paths() {
        let build_uuid = "25a3dd8c-eb3e-4e75-1298-8cbcbe621342";
        let mut server = Server::new_async().await;
        let stop = server
            .mock(
                "POST",
                format!(
                    "/organizations/{ORG_UUID}/projects/{PROJECT_UUID}/builds/{build_uuid}/stop"
                )
                .as_str(),
            )
            .match_body(Matcher::Exact(String::new()))
            .with_status(202)
            .create_async()
            .await;
        let restart = server
            .mock(
                "POST",
                format!(
                    "/organizations/{ORG_UUID}/projects/{PROJECT_UUID}/builds/{build_uuid}/restart"
                )
                .as_str(),
            )
            .match_body(Matcher::Exact(String::new()))
            .with_status(202)
            .create_async()
            .await;

        let (_client, org) = org_against(&server).await;
        let build: Uuid = build_uuid.parse().expect("valid uuid");
        org.stop_build(project_uuid(), build)
            .await
            .expect("stop should succeed");
        org.restart_build(project_uuid(), build)
            .await
            .expect("restart should succeed");
        stop.assert_async().await;
        restart.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_build_steps_parses_nested_groups() {
        let build_uuid = "25a3dd8c-eb3e-4e75-1298-8cbcbe621342";
        let mut server = Server::new_async().await;
        server
            .mock(
                "GET",
                format!(
                    "/organizations/{ORG_UUID}/projects/{PROJECT_UUID}/builds/{build_uuid}/steps"
                )
                .as_str(),
            )
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "steps": [{
                        "uuid": "41f12c60-0000-4b51-9425-a0b41bf4e851",
                        "build_uuid": build_uuid,
                        "type": "parallel",
                        "status": "success",
                        "steps": [{
                            "uuid": "529e851c-0000-4b51-9425-a0b41bf4e852",
                            "build_uuid": build_uuid,
                            "name": "tests",
                            "type": "run",
                            "status": "success",
                            "command": "cargo test",
                            "started_at": "2024-03-05T08:01:00.000Z",
                            "finished_at": "2024-03-05T08:03:00.000Z"
                        }]
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let (_client, org) = org_against(&server).await;
        let steps = org
            .list_build_steps(project_uuid(), build_uuid.parse().expect("valid uuid"))
            .await
            .expect("steps should parse");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].step_type, "parallel");
        assert_eq!(steps[0].steps.len(), 1);
        assert_eq!(steps[0].steps[0].command.as_deref(), Some("cargo test"));
    }

    #[tokio::test]
    async fn test_list_build_pipelines_parses_metrics() {
        let build_uuid = "25a3dd8c-eb3e-4e75-1298-8cbcbe621342";
        let mut server = Server::new_async().await;
        server
            .mock(
                "GET",
                format!(
                    "/organizations/{ORG_UUID}/projects/{PROJECT_UUID}/builds/{build_uuid}/pipelines"
                )
                .as_str(),
            )
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "pipelines": [{
                        "uuid": "61013340-0000-4b51-9425-a0b41bf4e853",
                        "build_uuid": build_uuid,
                        "type": "build",
                        "status": "success",
                        "metrics": { "cpu_user": "14", "duration": "182" },
                        "created_at": "2024-03-05T08:00:10.000Z",
                        "updated_at": "2024-03-05T08:04:30.000Z"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let (_client, org) = org_against(&server).await;
        let pipelines = org
            .list_build_pipelines(project_uuid(), build_uuid.parse().expect("valid uuid"))
            .await
            .expect("pipelines should parse");
        assert_eq!(pipelines.len(), 1);
        assert_eq!(pipelines[0].metrics.get("duration").map(String::as_str), Some("182"));
    }

    #[tokio::test]
    async fn test_list_build_services_parses_the_list() {
        let build_uuid = "25a3dd8c-eb3e-4e75-1298-8cbcbe621342";
        let mut server = Server::new_async().await;
        server
            .mock(
                "GET",
                format!(
                    "/organizations/{ORG_UUID}/projects/{PROJECT_UUID}/builds/{build_uuid}/services"
                )
                .as_str(),
            )
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "services": [{
                        "uuid": "795fc830-0000-4b51-9425-a0b41bf4e854",
                        "build_uuid": build_uuid,
                        "name": "app",
                        "status": "finished"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let (_client, org) = org_against(&server).await;
        let services = org
            .list_build_services(project_uuid(), build_uuid.parse().expect("valid uuid"))
            .await
            .expect("services should parse");
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "app");
    }
}
