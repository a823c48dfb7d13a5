use importer_core::Project;
use importer_logging::{importer_info, importer_warn};

use crate::tracker::IssueTracker;
use crate::{ProjectQuery, TrackerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogSettings {
    pub page_size: u32,
    pub max_pages: u32,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_pages: 50,
        }
    }
}

/// Collects every project the token is a member of, page by page, until a
/// short page comes back or `max_pages` is reached.
pub async fn load_catalog(
    tracker: &dyn IssueTracker,
    settings: CatalogSettings,
) -> Result<Vec<Project>, TrackerError> {
    let mut projects = Vec::new();
    for page in 1..=settings.max_pages {
        let batch = tracker
            .list_projects(&ProjectQuery {
                per_page: settings.page_size,
                page: Some(page),
                search: None,
            })
            .await?;
        let short = (batch.len() as u64) < u64::from(settings.page_size);
        projects.extend(batch);
        if short {
            importer_info!("loaded {} projects", projects.len());
            return Ok(projects);
        }
    }
    importer_warn!(
        "project listing stopped at the page cap ({} pages, {} projects)",
        settings.max_pages,
        projects.len()
    );
    Ok(projects)
}
