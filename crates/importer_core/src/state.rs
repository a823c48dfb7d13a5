use crate::view_model::AppViewModel;
use crate::{
    FilterId, FilterPatch, FilterRule, IssueMapping, Project, ProjectCatalog,
    RecordEdit, SubmissionState, ValidatedRecord,
};

/// Everything the pipeline stages read or mutate, owned in one place.
/// Persistence is the host's job; nothing in here touches storage.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    filters: Vec<FilterRule>,
    next_filter_id: FilterId,
    mapping: IssueMapping,
    catalog: ProjectCatalog,
    records: Vec<ValidatedRecord>,
    submission: SubmissionState,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filters(&self) -> &[FilterRule] {
        &self.filters
    }

    pub fn mapping(&self) -> &IssueMapping {
        &self.mapping
    }

    pub fn catalog(&self) -> &ProjectCatalog {
        &self.catalog
    }

    pub fn records(&self) -> &[ValidatedRecord] {
        &self.records
    }

    pub fn submission(&self) -> &SubmissionState {
        &self.submission
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel::from_state(self)
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn add_filter(&mut self, mut rule: FilterRule) -> FilterId {
        self.next_filter_id += 1;
        rule.id = self.next_filter_id;
        self.filters.push(rule);
        self.mark_dirty();
        self.next_filter_id
    }

    pub(crate) fn patch_filter(&mut self, id: FilterId, patch: FilterPatch) -> bool {
        let Some(rule) = self.filters.iter_mut().find(|rule| rule.id == id) else {
            return false;
        };
        rule.apply_patch(patch);
        self.mark_dirty();
        true
    }

    pub(crate) fn remove_filter(&mut self, id: FilterId) -> bool {
        let before = self.filters.len();
        self.filters.retain(|rule| rule.id != id);
        let removed = self.filters.len() != before;
        if removed {
            self.mark_dirty();
        }
        removed
    }

    pub(crate) fn set_mapping(&mut self, mapping: IssueMapping) {
        self.mapping = mapping;
        self.mark_dirty();
    }

    pub(crate) fn set_catalog(&mut self, projects: Vec<Project>) {
        self.catalog = ProjectCatalog::new(projects);
        self.mark_dirty();
    }

    pub(crate) fn set_records(&mut self, records: Vec<ValidatedRecord>) {
        self.records = records;
        self.mark_dirty();
    }

    fn record_mut(&mut self, record_id: &str) -> Option<&mut ValidatedRecord> {
        self.records.iter_mut().find(|record| record.id == record_id)
    }

    pub(crate) fn edit_record(&mut self, record_id: &str, edit: RecordEdit) -> bool {
        let Some(record) = self.records.iter_mut().find(|record| record.id == record_id) else {
            return false;
        };
        record.apply_edit(edit, &self.catalog);
        self.mark_dirty();
        true
    }

    pub(crate) fn toggle_exclusion(&mut self, record_id: &str) -> bool {
        let Some(record) = self.record_mut(record_id) else {
            return false;
        };
        record.is_excluded = !record.is_excluded;
        self.mark_dirty();
        true
    }

    pub(crate) fn exclude_invalid(&mut self) {
        for record in &mut self.records {
            record.is_excluded = record.is_excluded || !record.is_valid;
        }
        self.mark_dirty();
    }

    pub(crate) fn include_all(&mut self) {
        for record in &mut self.records {
            record.is_excluded = false;
        }
        self.mark_dirty();
    }

    pub(crate) fn submission_mut(&mut self) -> &mut SubmissionState {
        &mut self.submission
    }

    pub(crate) fn set_submission(&mut self, submission: SubmissionState) {
        self.submission = submission;
        self.mark_dirty();
    }
}
