use importer_core::Project;

use crate::{CreatedIssue, CurrentUser, NewIssue, ProjectQuery, TrackerError};

/// The remote issue tracker as the pipeline sees it.
#[async_trait::async_trait]
pub trait IssueTracker: Send + Sync {
    async fn validate_connection(&self) -> Result<CurrentUser, TrackerError>;

    async fn list_projects(&self, query: &ProjectQuery) -> Result<Vec<Project>, TrackerError>;

    async fn search_projects(&self, text: &str) -> Result<Vec<Project>, TrackerError> {
        self.list_projects(&ProjectQuery {
            per_page: 20,
            page: None,
            search: Some(text.to_string()),
        })
        .await
    }

    /// `Ok(None)` when the tracker reports the path as not found.
    async fn project_by_path(&self, path: &str) -> Result<Option<Project>, TrackerError>;

    async fn create_issue(
        &self,
        project_id: u64,
        issue: &NewIssue,
    ) -> Result<CreatedIssue, TrackerError>;
}
