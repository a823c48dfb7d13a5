//! Importer core: pure reconciliation pipeline and application state.
mod catalog;
mod csv;
mod documents;
mod effect;
mod export;
mod filter;
mod identify;
mod msg;
mod section;
mod state;
mod submission;
mod update;
mod validate;
mod view_model;

pub use catalog::{Project, ProjectCatalog};
pub use csv::{parse_csv, ParsedTable, Row};
pub use documents::{CompanionDocument, DocumentIndex, DocumentMatch, FileKind};
pub use effect::Effect;
pub use export::{escape_field, export_outcomes_csv, results_file_name};
pub use filter::{apply_filters, FilterId, FilterOperator, FilterPatch, FilterRule, UnknownOperator};
pub use identify::detect_identifier_column;
pub use msg::Msg;
pub use section::extract_section;
pub use state::AppState;
pub use submission::{
    description_for, labels_csv, select_for_submission, OutcomeStatus, SubmissionOutcome,
    SubmissionState, SubmissionStatus, INTERRUPTED_MESSAGE,
};
pub use update::update;
pub use validate::{
    validate_rows, IssueMapping, RecordEdit, RecordError, RepositoryRef, ValidatedRecord,
    ValidationContext,
};
pub use view_model::{AppViewModel, SubmissionView};
