use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::validate::ValidatedRecord;

pub const INTERRUPTED_MESSAGE: &str = "run interrupted before completion";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
    Failed,
}

impl SubmissionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SubmissionStatus::Completed | SubmissionStatus::Failed)
    }

    pub fn is_active(self) -> bool {
        matches!(self, SubmissionStatus::Running | SubmissionStatus::Paused)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    Failed,
    Skipped,
}

impl OutcomeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeStatus::Success => "success",
            OutcomeStatus::Failed => "failed",
            OutcomeStatus::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub record_id: String,
    pub external_id: String,
    pub title: String,
    pub status: OutcomeStatus,
    pub remote_url: Option<String>,
    pub remote_sequence_number: Option<u64>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl SubmissionOutcome {
    fn for_record(record: &ValidatedRecord, status: OutcomeStatus, at: DateTime<Utc>) -> Self {
        Self {
            record_id: record.id.clone(),
            external_id: record.external_id.clone(),
            title: record.title.clone(),
            status,
            remote_url: None,
            remote_sequence_number: None,
            error: None,
            timestamp: at,
        }
    }

    pub fn success(
        record: &ValidatedRecord,
        url: impl Into<String>,
        sequence_number: u64,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            remote_url: Some(url.into()),
            remote_sequence_number: Some(sequence_number),
            ..Self::for_record(record, OutcomeStatus::Success, at)
        }
    }

    pub fn failed(record: &ValidatedRecord, error: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::for_record(record, OutcomeStatus::Failed, at)
        }
    }

    pub fn skipped(record: &ValidatedRecord, reason: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::for_record(record, OutcomeStatus::Skipped, at)
        }
    }
}

/// Progress of one submission run. `outcomes` is append-only and
/// `processed_count` always equals `outcomes.len()`.
///
/// `created` maps external ids to issue URLs for every success seen so far.
/// It outlives the run that produced it: `reset` and `start` keep it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmissionState {
    status: SubmissionStatus,
    created: BTreeMap<String, String>,
    total_count: usize,
    outcomes: Vec<SubmissionOutcome>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    failure_message: Option<String>,
}

impl SubmissionState {
    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    pub fn processed_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn outcomes(&self) -> &[SubmissionOutcome] {
        &self.outcomes
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn failure_message(&self) -> Option<&str> {
        self.failure_message.as_deref()
    }

    pub fn created(&self) -> &BTreeMap<String, String> {
        &self.created
    }

    /// External ids that already have an issue, in id order.
    pub fn created_external_ids(&self) -> Vec<String> {
        self.created.keys().cloned().collect()
    }

    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn progress_percent(&self) -> u8 {
        if self.total_count == 0 {
            return 0;
        }
        let percent = (self.processed_count() * 100 + self.total_count / 2) / self.total_count;
        percent.min(100) as u8
    }

    /// Back to idle after a terminal run. No-op while a run is active.
    pub fn reset(&mut self) -> bool {
        if self.status.is_active() {
            return false;
        }
        *self = Self {
            created: std::mem::take(&mut self.created),
            ..Self::default()
        };
        true
    }

    pub fn start(&mut self, total_count: usize, at: DateTime<Utc>) -> bool {
        if self.status != SubmissionStatus::Idle {
            return false;
        }
        *self = Self {
            status: SubmissionStatus::Running,
            total_count,
            started_at: Some(at),
            created: std::mem::take(&mut self.created),
            ..Self::default()
        };
        true
    }

    pub fn record(&mut self, outcome: SubmissionOutcome) -> bool {
        if !self.status.is_active() {
            return false;
        }
        self.remember_created(&outcome);
        self.outcomes.push(outcome);
        true
    }

    pub fn pause(&mut self) -> bool {
        self.transition(SubmissionStatus::Running, SubmissionStatus::Paused)
    }

    pub fn resume(&mut self) -> bool {
        self.transition(SubmissionStatus::Paused, SubmissionStatus::Running)
    }

    pub fn complete(&mut self, at: DateTime<Utc>) -> bool {
        if !self.status.is_active() {
            return false;
        }
        self.status = SubmissionStatus::Completed;
        self.completed_at = Some(at);
        true
    }

    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if !self.status.is_active() {
            return false;
        }
        self.status = SubmissionStatus::Failed;
        self.failure_message = Some(message.into());
        true
    }

    /// Rebuild a state from persisted parts. No loop survives a restart, so
    /// a run that was still active comes back as failed. Successes among
    /// `outcomes` are merged into `created`.
    pub fn restore(
        status: SubmissionStatus,
        created: BTreeMap<String, String>,
        total_count: usize,
        outcomes: Vec<SubmissionOutcome>,
        started_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
        failure_message: Option<String>,
    ) -> Self {
        let (status, failure_message) = if status.is_active() {
            (
                SubmissionStatus::Failed,
                failure_message.or_else(|| Some(INTERRUPTED_MESSAGE.to_string())),
            )
        } else {
            (status, failure_message)
        };
        let mut state = Self {
            status,
            created,
            total_count: total_count.max(outcomes.len()),
            outcomes: Vec::new(),
            started_at,
            completed_at,
            failure_message,
        };
        for outcome in &outcomes {
            state.remember_created(outcome);
        }
        state.outcomes = outcomes;
        state
    }

    fn remember_created(&mut self, outcome: &SubmissionOutcome) {
        if outcome.status != OutcomeStatus::Success || outcome.external_id.is_empty() {
            return;
        }
        self.created.insert(
            outcome.external_id.clone(),
            outcome.remote_url.clone().unwrap_or_default(),
        );
    }

    fn transition(&mut self, from: SubmissionStatus, to: SubmissionStatus) -> bool {
        if self.status != from {
            return false;
        }
        self.status = to;
        true
    }
}

/// Records eligible for submission, in their original order.
pub fn select_for_submission(records: &[ValidatedRecord]) -> Vec<ValidatedRecord> {
    records
        .iter()
        .filter(|record| record.is_submittable())
        .cloned()
        .collect()
}

/// The matched description, or a `**column:** value` summary of the
/// source row when there is none.
pub fn description_for(record: &ValidatedRecord) -> Option<String> {
    if let Some(description) = record.description.as_deref().filter(|d| !d.is_empty()) {
        return Some(description.to_string());
    }
    let summary = record
        .source_fields
        .iter()
        .map(|(column, value)| format!("**{column}:** {value}"))
        .collect::<Vec<_>>()
        .join("\n\n");
    Some(summary).filter(|s| !s.is_empty())
}

pub fn labels_csv(record: &ValidatedRecord) -> Option<String> {
    Some(record.labels.join(",")).filter(|s| !s.is_empty())
}
