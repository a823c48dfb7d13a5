use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use importer_core::{OutcomeStatus, SubmissionOutcome, SubmissionState, SubmissionStatus};
use importer_engine::{ensure_output_dir, AtomicFileWriter};
use importer_logging::{importer_error, importer_info, importer_warn};
use serde::{Deserialize, Serialize};

pub const STATE_FILENAME: &str = ".importer_state.ron";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedOutcome {
    record_id: String,
    external_id: String,
    title: String,
    status: PersistedOutcomeStatus,
    remote_url: Option<String>,
    remote_sequence_number: Option<u64>,
    error: Option<String>,
    timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSubmission {
    status: PersistedStatus,
    #[serde(default)]
    created: BTreeMap<String, String>,
    total_count: usize,
    outcomes: Vec<PersistedOutcome>,
    started_at: Option<String>,
    completed_at: Option<String>,
    failure_message: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PersistedStatus {
    Idle,
    Running,
    Paused,
    Completed,
    Failed,
}

impl From<SubmissionStatus> for PersistedStatus {
    fn from(status: SubmissionStatus) -> Self {
        match status {
            SubmissionStatus::Idle => Self::Idle,
            SubmissionStatus::Running => Self::Running,
            SubmissionStatus::Paused => Self::Paused,
            SubmissionStatus::Completed => Self::Completed,
            SubmissionStatus::Failed => Self::Failed,
        }
    }
}

impl From<PersistedStatus> for SubmissionStatus {
    fn from(status: PersistedStatus) -> Self {
        match status {
            PersistedStatus::Idle => Self::Idle,
            PersistedStatus::Running => Self::Running,
            PersistedStatus::Paused => Self::Paused,
            PersistedStatus::Completed => Self::Completed,
            PersistedStatus::Failed => Self::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PersistedOutcomeStatus {
    Success,
    Failed,
    Skipped,
}

impl From<OutcomeStatus> for PersistedOutcomeStatus {
    fn from(status: OutcomeStatus) -> Self {
        match status {
            OutcomeStatus::Success => Self::Success,
            OutcomeStatus::Failed => Self::Failed,
            OutcomeStatus::Skipped => Self::Skipped,
        }
    }
}

impl From<PersistedOutcomeStatus> for OutcomeStatus {
    fn from(status: PersistedOutcomeStatus) -> Self {
        match status {
            PersistedOutcomeStatus::Success => Self::Success,
            PersistedOutcomeStatus::Failed => Self::Failed,
            PersistedOutcomeStatus::Skipped => Self::Skipped,
        }
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

impl From<&SubmissionState> for PersistedSubmission {
    fn from(state: &SubmissionState) -> Self {
        Self {
            status: state.status().into(),
            created: state.created().clone(),
            total_count: state.total_count(),
            outcomes: state
                .outcomes()
                .iter()
                .map(|outcome| PersistedOutcome {
                    record_id: outcome.record_id.clone(),
                    external_id: outcome.external_id.clone(),
                    title: outcome.title.clone(),
                    status: outcome.status.into(),
                    remote_url: outcome.remote_url.clone(),
                    remote_sequence_number: outcome.remote_sequence_number,
                    error: outcome.error.clone(),
                    timestamp: timestamp(outcome.timestamp),
                })
                .collect(),
            started_at: state.started_at().map(timestamp),
            completed_at: state.completed_at().map(timestamp),
            failure_message: state.failure_message().map(ToOwned::to_owned),
        }
    }
}

impl PersistedSubmission {
    fn into_state(self) -> Option<SubmissionState> {
        let outcomes = self
            .outcomes
            .into_iter()
            .map(|outcome| {
                Some(SubmissionOutcome {
                    record_id: outcome.record_id,
                    external_id: outcome.external_id,
                    title: outcome.title,
                    status: outcome.status.into(),
                    remote_url: outcome.remote_url,
                    remote_sequence_number: outcome.remote_sequence_number,
                    error: outcome.error,
                    timestamp: parse_timestamp(&outcome.timestamp)?,
                })
            })
            .collect::<Option<Vec<_>>>()?;
        let started_at = match self.started_at {
            Some(text) => Some(parse_timestamp(&text)?),
            None => None,
        };
        let completed_at = match self.completed_at {
            Some(text) => Some(parse_timestamp(&text)?),
            None => None,
        };
        Some(SubmissionState::restore(
            self.status.into(),
            self.created,
            self.total_count,
            outcomes,
            started_at,
            completed_at,
            self.failure_message,
        ))
    }
}

/// The persisted submission, or `None` when there is none or it cannot be
/// understood. A run that was active when saved comes back as failed.
pub fn load_submission(output_dir: &Path) -> Option<SubmissionState> {
    let path = output_dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
        Err(err) => {
            importer_warn!("Failed to read persisted state from {:?}: {}", path, err);
            return None;
        }
    };

    let persisted: PersistedSubmission = match ron::from_str(&content) {
        Ok(state) => state,
        Err(err) => {
            importer_warn!("Failed to parse persisted state from {:?}: {}", path, err);
            return None;
        }
    };
    let Some(state) = persisted.into_state() else {
        importer_warn!("Persisted state in {:?} has invalid values; starting fresh", path);
        return None;
    };

    importer_info!(
        "Loaded persisted submission from {:?} ({} outcomes)",
        path,
        state.processed_count()
    );
    Some(state)
}

pub fn save_submission(output_dir: &Path, state: &SubmissionState) {
    if let Err(err) = ensure_output_dir(output_dir) {
        importer_error!("Failed to ensure output dir {:?}: {}", output_dir, err);
        return;
    }

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&PersistedSubmission::from(state), pretty) {
        Ok(text) => text,
        Err(err) => {
            importer_error!("Failed to serialize persisted state: {}", err);
            return;
        }
    };

    if let Err(err) = AtomicFileWriter::new(output_dir).write(STATE_FILENAME, &content) {
        importer_error!(
            "Failed to write persisted state to {:?}: {}",
            output_dir,
            err
        );
    }
}

/// Removes the state file. `Ok(false)` when there was nothing to remove.
pub fn clear_submission(output_dir: &Path) -> io::Result<bool> {
    match fs::remove_file(output_dir.join(STATE_FILENAME)) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}
