use importer_logging::{importer_debug, importer_info, importer_warn};

use crate::{select_for_submission, AppState, Effect, FilterRule, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FilterAdded {
            column,
            operator,
            value,
        } => {
            let id = state.add_filter(FilterRule::new(0, column, operator).with_value(value));
            importer_debug!("filter {} added", id);
            Vec::new()
        }
        Msg::FilterUpdated { id, patch } => {
            if !state.patch_filter(id, patch) {
                importer_warn!("filter {} not found for update", id);
            }
            Vec::new()
        }
        Msg::FilterRemoved { id } => {
            state.remove_filter(id);
            Vec::new()
        }
        Msg::MappingChanged(mapping) => {
            state.set_mapping(mapping);
            Vec::new()
        }
        Msg::CatalogLoaded(projects) => {
            importer_info!("catalog loaded with {} projects", projects.len());
            state.set_catalog(projects);
            Vec::new()
        }
        Msg::RecordsValidated(records) => {
            state.set_records(records);
            Vec::new()
        }
        Msg::RecordEdited { record_id, edit } => {
            if !state.edit_record(&record_id, edit) {
                importer_warn!("record {} not found for edit", record_id);
            }
            Vec::new()
        }
        Msg::ExclusionToggled { record_id } => {
            state.toggle_exclusion(&record_id);
            Vec::new()
        }
        Msg::ExcludeInvalidClicked => {
            state.exclude_invalid();
            Vec::new()
        }
        Msg::IncludeAllClicked => {
            state.include_all();
            Vec::new()
        }
        Msg::StartClicked { at } => start_submission(&mut state, at),
        Msg::PauseClicked => {
            if state.submission_mut().pause() {
                state.mark_dirty();
                vec![Effect::PauseSubmission]
            } else {
                Vec::new()
            }
        }
        Msg::ResumeClicked => {
            if state.submission_mut().resume() {
                state.mark_dirty();
                vec![Effect::ResumeSubmission]
            } else {
                Vec::new()
            }
        }
        Msg::OutcomeRecorded(outcome) => {
            if state.submission_mut().record(outcome) {
                state.mark_dirty();
            } else {
                importer_warn!("outcome arrived while no submission was active");
            }
            Vec::new()
        }
        Msg::SubmissionCompleted { at } => {
            if state.submission_mut().complete(at) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SubmissionFailed { message } => {
            if state.submission_mut().fail(message) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::RestoreSubmission(submission) => {
            if state.submission().status().is_active() {
                importer_warn!("ignoring restore while a submission is active");
            } else {
                state.set_submission(submission);
            }
            Vec::new()
        }
        Msg::ResetClicked => {
            if state.submission_mut().reset() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn start_submission(state: &mut AppState, at: chrono::DateTime<chrono::Utc>) -> Vec<Effect> {
    let status = state.submission().status();
    if status.is_active() {
        return Vec::new();
    }

    let records = select_for_submission(state.records());
    if records.is_empty() {
        importer_warn!("nothing to submit: no valid, included records");
        return Vec::new();
    }

    // Every issue created by an earlier run is skipped, not created again.
    let already_created = state.submission().created_external_ids();

    let submission = state.submission_mut();
    submission.reset();
    submission.start(records.len(), at);
    state.mark_dirty();
    importer_info!("submission started for {} records", records.len());

    vec![Effect::StartSubmission {
        records,
        already_created,
    }]
}
