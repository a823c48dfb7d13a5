use chrono::{DateTime, Utc};

use crate::{
    FilterId, FilterOperator, FilterPatch, IssueMapping, Project, RecordEdit, SubmissionOutcome,
    SubmissionState, ValidatedRecord,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User added a filter rule.
    FilterAdded {
        column: String,
        operator: FilterOperator,
        value: String,
    },
    /// User changed part of an existing rule.
    FilterUpdated { id: FilterId, patch: FilterPatch },
    /// User removed a rule.
    FilterRemoved { id: FilterId },
    /// Column-to-field mapping changed.
    MappingChanged(IssueMapping),
    /// Remote project list arrived.
    CatalogLoaded(Vec<Project>),
    /// Fresh validation results replace the current records.
    RecordsValidated(Vec<ValidatedRecord>),
    /// Manual correction of one record.
    RecordEdited { record_id: String, edit: RecordEdit },
    /// User toggled exclusion of one record.
    ExclusionToggled { record_id: String },
    /// Exclude every invalid record.
    ExcludeInvalidClicked,
    /// Clear every exclusion.
    IncludeAllClicked,
    /// User asked to start submitting.
    StartClicked { at: DateTime<Utc> },
    PauseClicked,
    ResumeClicked,
    /// Engine finished one record.
    OutcomeRecorded(SubmissionOutcome),
    /// Engine processed every record.
    SubmissionCompleted { at: DateTime<Utc> },
    /// Engine could not run at all.
    SubmissionFailed { message: String },
    /// Restore a persisted submission state.
    RestoreSubmission(SubmissionState),
    /// Drop a terminal submission state.
    ResetClicked,
    /// Fallback for placeholder wiring.
    NoOp,
}
