use crate::ValidatedRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Submit `records` in order. Records whose external id is listed in
    /// `already_created` are reported as skipped instead of being sent.
    StartSubmission {
        records: Vec<ValidatedRecord>,
        already_created: Vec<String>,
    },
    PauseSubmission,
    ResumeSubmission,
}
