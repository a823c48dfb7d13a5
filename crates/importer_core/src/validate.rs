use std::fmt;

use crate::catalog::{Project, ProjectCatalog};
use crate::csv::Row;
use crate::documents::DocumentIndex;

/// How table columns become issue fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueMapping {
    pub title_column: Option<String>,
    pub repository_column: Option<String>,
    pub default_repository: Option<String>,
    pub use_document_description: bool,
    pub section_heading: Option<String>,
    pub label_columns: Vec<String>,
    pub static_labels: Vec<String>,
}

impl Default for IssueMapping {
    fn default() -> Self {
        Self {
            title_column: None,
            repository_column: None,
            default_repository: None,
            use_document_description: true,
            section_heading: None,
            label_columns: Vec::new(),
            static_labels: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub path: String,
    pub project_id: u64,
}

impl From<&Project> for RepositoryRef {
    fn from(project: &Project) -> Self {
        Self {
            path: project.path_with_namespace.clone(),
            project_id: project.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    EmptyTitle,
    RepositoryNotFound(String),
    DefaultRepositoryNotFound(String),
    RepositoryEmpty,
}

impl RecordError {
    pub fn is_repository(&self) -> bool {
        !matches!(self, RecordError::EmptyTitle)
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::EmptyTitle => write!(f, "Title is empty"),
            RecordError::RepositoryNotFound(value) => {
                write!(f, "Repository \"{value}\" not found in your projects")
            }
            RecordError::DefaultRepositoryNotFound(value) => {
                write!(f, "Default repository \"{value}\" not found in your projects")
            }
            RecordError::RepositoryEmpty => write!(f, "Repository is empty"),
        }
    }
}

/// One filtered row, resolved against the catalog and document index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRecord {
    pub id: String,
    pub external_id: String,
    pub title: String,
    pub repository: Option<RepositoryRef>,
    pub matched_document: Option<String>,
    pub description: Option<String>,
    pub labels: Vec<String>,
    pub is_valid: bool,
    pub errors: Vec<RecordError>,
    pub is_excluded: bool,
    /// Non-title columns of the source row, in header order.
    pub source_fields: Vec<(String, String)>,
}

/// A manual correction applied after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordEdit {
    Repository(String),
    Description(String),
    /// Comma-separated label list.
    Labels(String),
}

impl ValidatedRecord {
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn is_submittable(&self) -> bool {
        self.is_valid && !self.is_excluded
    }

    /// Only a repository edit touches validity, and then only the
    /// repository errors are replaced.
    pub fn apply_edit(&mut self, edit: RecordEdit, catalog: &ProjectCatalog) {
        match edit {
            RecordEdit::Repository(value) => {
                self.errors.retain(|error| !error.is_repository());
                let value = value.trim();
                if value.is_empty() {
                    self.repository = None;
                    self.errors.push(RecordError::RepositoryEmpty);
                } else if let Some(project) = catalog.resolve(value) {
                    self.repository = Some(project.into());
                } else {
                    self.repository = None;
                    self.errors
                        .push(RecordError::RepositoryNotFound(value.to_string()));
                }
                self.is_valid = self.errors.is_empty() && !self.title.trim().is_empty();
            }
            RecordEdit::Description(text) => self.description = Some(text),
            RecordEdit::Labels(raw) => self.labels = split_labels(&raw).collect(),
        }
    }
}

pub struct ValidationContext<'a> {
    pub catalog: &'a ProjectCatalog,
    pub documents: &'a DocumentIndex,
    pub identifier_column: Option<&'a str>,
    pub mapping: &'a IssueMapping,
}

/// Validate filtered rows in order. Ids are `row-<n>` over the filtered set.
pub fn validate_rows(
    headers: &[String],
    rows: &[Row],
    context: &ValidationContext<'_>,
) -> Vec<ValidatedRecord> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| validate_row(index, headers, row, context))
        .collect()
}

fn cell<'r>(row: &'r Row, column: Option<&str>) -> &'r str {
    column
        .and_then(|column| row.get(column))
        .map(String::as_str)
        .unwrap_or("")
}

fn validate_row(
    index: usize,
    headers: &[String],
    row: &Row,
    context: &ValidationContext<'_>,
) -> ValidatedRecord {
    let mapping = context.mapping;
    let mut errors = Vec::new();

    let external_id = cell(row, context.identifier_column).to_string();
    let title = cell(row, mapping.title_column.as_deref()).to_string();
    if title.trim().is_empty() {
        errors.push(RecordError::EmptyTitle);
    }

    let repository = match resolve_repository(row, mapping, context.catalog) {
        Ok(repository) => Some(repository),
        Err(error) => {
            errors.push(error);
            None
        }
    };

    let document = if mapping.use_document_description && !external_id.is_empty() {
        context.documents.lookup(&external_id)
    } else {
        None
    };

    let source_fields = headers
        .iter()
        .filter(|header| mapping.title_column.as_deref() != Some(header.as_str()))
        .map(|header| (header.clone(), cell(row, Some(header.as_str())).to_string()))
        .collect();

    ValidatedRecord {
        id: format!("row-{index}"),
        external_id,
        title,
        repository,
        matched_document: document.map(|d| d.source_path.clone()),
        description: document.map(|d| d.extracted_section.clone()),
        labels: collect_labels(row, mapping),
        is_valid: errors.is_empty(),
        errors,
        is_excluded: false,
        source_fields,
    }
}

fn resolve_repository(
    row: &Row,
    mapping: &IssueMapping,
    catalog: &ProjectCatalog,
) -> Result<RepositoryRef, RecordError> {
    let value = cell(row, mapping.repository_column.as_deref());
    if !value.trim().is_empty() {
        return catalog
            .resolve(value)
            .map(RepositoryRef::from)
            .ok_or_else(|| RecordError::RepositoryNotFound(value.to_string()));
    }
    match mapping.default_repository.as_deref().map(str::trim) {
        Some(default) if !default.is_empty() => catalog
            .resolve(default)
            .map(RepositoryRef::from)
            .ok_or_else(|| RecordError::DefaultRepositoryNotFound(default.to_string())),
        _ => Err(RecordError::RepositoryEmpty),
    }
}

fn split_labels(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(ToOwned::to_owned)
}

/// Static labels first, then each label column in configured order.
fn collect_labels(row: &Row, mapping: &IssueMapping) -> Vec<String> {
    let static_labels = mapping
        .static_labels
        .iter()
        .map(|label| label.trim())
        .filter(|label| !label.is_empty())
        .map(ToOwned::to_owned);
    let column_labels = mapping
        .label_columns
        .iter()
        .flat_map(|column| split_labels(cell(row, Some(column.as_str()))));
    static_labels.chain(column_labels).collect()
}
