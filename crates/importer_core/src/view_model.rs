use crate::{AppState, OutcomeStatus, SubmissionStatus};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub filter_count: usize,
    pub record_count: usize,
    pub valid_count: usize,
    pub excluded_count: usize,
    pub submittable_count: usize,
    pub submission: SubmissionView,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmissionView {
    pub status: SubmissionStatus,
    pub processed: usize,
    pub total: usize,
    pub percent: u8,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub failure_message: Option<String>,
}

impl AppViewModel {
    pub(crate) fn from_state(state: &AppState) -> Self {
        let records = state.records();
        let submission = state.submission();
        Self {
            filter_count: state.filters().len(),
            record_count: records.len(),
            valid_count: records.iter().filter(|r| r.is_valid).count(),
            excluded_count: records.iter().filter(|r| r.is_excluded).count(),
            submittable_count: records.iter().filter(|r| r.is_submittable()).count(),
            submission: SubmissionView {
                status: submission.status(),
                processed: submission.processed_count(),
                total: submission.total_count(),
                percent: submission.progress_percent(),
                succeeded: submission.count(OutcomeStatus::Success),
                failed: submission.count(OutcomeStatus::Failed),
                skipped: submission.count(OutcomeStatus::Skipped),
                failure_message: submission.failure_message().map(ToOwned::to_owned),
            },
        }
    }
}
