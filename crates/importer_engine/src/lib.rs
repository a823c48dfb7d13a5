//! Importer engine: tracker client, file discovery and the submission loop.
mod catalog;
mod decode;
mod engine;
mod gitlab;
mod persist;
mod source;
mod submit;
mod tracker;
mod types;

pub use catalog::{load_catalog, CatalogSettings};
pub use decode::{decode_text, DecodeError, DecodedText};
pub use engine::EngineHandle;
pub use gitlab::{GitLabClient, TrackerSettings};
pub use persist::{ensure_output_dir, write_results_export, AtomicFileWriter, PersistError};
pub use source::{read_companion_documents, scan_export_dir, ExportFiles, SourceError, SourceFile};
pub use submit::{
    gitlab_factory, run_submission, submit_batch, ChannelSubmissionSink, Clock,
    SubmissionControl, SubmissionSink, SubmitSettings, TrackerFactory, ALREADY_CREATED,
    MISSING_REPOSITORY,
};
pub use tracker::IssueTracker;
pub use types::{
    CreatedIssue, CurrentUser, NewIssue, ProjectQuery, SubmissionEvent, TrackerError,
    TrackerErrorKind,
};
