use std::collections::HashSet;
use std::io::{self, BufRead};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use importer_core::{
    apply_filters, detect_identifier_column, parse_csv, update, validate_rows, AppState,
    DocumentIndex, FilterPatch, Msg, OutcomeStatus, SubmissionOutcome, ValidationContext,
};
use importer_engine::{
    gitlab_factory, load_catalog, read_companion_documents, scan_export_dir,
    write_results_export, EngineHandle, GitLabClient, IssueTracker, SubmissionEvent,
    SubmitSettings,
};
use importer_logging::{importer_debug, importer_info};

const CONTROL_POLL: Duration = Duration::from_millis(200);

use crate::args::{Args, Commands};
use crate::config::JobConfig;
use crate::platform::persistence::{clear_submission, load_submission, save_submission};

pub fn run(args: Args) -> Result<()> {
    let config = JobConfig::load(&args.config)?;
    let token = args.token.as_deref();
    match args.command {
        Commands::Preview => preview(&config, token),
        Commands::Submit => submit(&config, token),
        Commands::Export => export(&config),
        Commands::Reset => reset(&config),
    }
}

fn apply(state: AppState, msg: Msg) -> AppState {
    let (state, effects) = update(state, msg);
    if !effects.is_empty() {
        importer_debug!("dropping effects outside a submission: {effects:?}");
    }
    state
}

/// Everything up to submission: discover, parse, filter, load the catalog,
/// match documents, validate and apply configured exclusions.
fn prepare(config: &JobConfig, token: Option<&str>) -> Result<AppState> {
    let token = config.token(token)?;

    let files = scan_export_dir(&config.export_dir)?;
    let csv_file = files.main_csv(config.csv_file.as_deref())?;
    let table = parse_csv(&csv_file.read_text()?);
    importer_info!("parsed {} rows from {}", table.row_count(), csv_file.path);

    let identifier_column = config
        .identifier_column
        .clone()
        .or_else(|| detect_identifier_column(table.headers(), table.rows()));
    match &identifier_column {
        Some(column) => importer_info!("identifier column: {column}"),
        None => importer_info!("no identifier column found; documents will not be matched"),
    }

    let mut state = AppState::new();
    for filter in &config.filters {
        state = apply(
            state,
            Msg::FilterAdded {
                column: filter.column.clone(),
                operator: filter.operator()?,
                value: filter.value.clone(),
            },
        );
        if !filter.enabled {
            if let Some(id) = state.filters().last().map(|rule| rule.id) {
                let patch = FilterPatch {
                    enabled: Some(false),
                    ..FilterPatch::default()
                };
                state = apply(state, Msg::FilterUpdated { id, patch });
            }
        }
    }
    state = apply(state, Msg::MappingChanged(config.mapping.clone().into()));

    let client = GitLabClient::new(&config.tracker.domain, token, config.tracker_settings())
        .map_err(|err| anyhow!(err.user_message()))?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let projects = runtime
        .block_on(async {
            let user = client.validate_connection().await?;
            println!("Connected to {} as {}", client.base_url(), user.username);
            load_catalog(&client, config.catalog_settings()).await
        })
        .map_err(|err| anyhow!(err.user_message()))?;
    state = apply(state, Msg::CatalogLoaded(projects));

    let rows = apply_filters(table.rows(), state.filters());
    importer_info!("{} of {} rows pass the filters", rows.len(), table.row_count());
    let documents = DocumentIndex::build(
        read_companion_documents(&files.markdown),
        state.mapping().section_heading.as_deref(),
    );
    importer_info!("{} document keys indexed", documents.key_count());

    let records = validate_rows(
        table.headers(),
        &rows,
        &ValidationContext {
            catalog: state.catalog(),
            documents: &documents,
            identifier_column: identifier_column.as_deref(),
            mapping: state.mapping(),
        },
    );
    state = apply(state, Msg::RecordsValidated(records));

    let excluded: HashSet<&str> = config.excluded_ids.iter().map(String::as_str).collect();
    let to_exclude: Vec<String> = state
        .records()
        .iter()
        .filter(|record| excluded.contains(record.external_id.as_str()))
        .map(|record| record.id.clone())
        .collect();
    for record_id in to_exclude {
        state = apply(state, Msg::ExclusionToggled { record_id });
    }
    if config.exclude_invalid {
        state = apply(state, Msg::ExcludeInvalidClicked);
    }
    Ok(state)
}

fn preview(config: &JobConfig, token: Option<&str>) -> Result<()> {
    let state = prepare(config, token)?;
    for record in state.records() {
        let mark = if record.is_excluded {
            "excluded"
        } else if record.is_valid {
            "ok"
        } else {
            "invalid"
        };
        let repository = record
            .repository
            .as_ref()
            .map(|repository| repository.path.as_str())
            .unwrap_or("-");
        println!(
            "{mark:<8} {:<14} {} -> {repository}",
            record.external_id, record.title
        );
        if let Some(document) = &record.matched_document {
            println!("{:24}document: {document}", "");
        }
        for message in record.error_messages() {
            println!("{:24}{message}", "");
        }
    }

    let view = state.view();
    println!(
        "{} records, {} valid, {} excluded, {} to submit",
        view.record_count, view.valid_count, view.excluded_count, view.submittable_count
    );
    Ok(())
}

fn submit(config: &JobConfig, token: Option<&str>) -> Result<()> {
    let mut state = prepare(config, token)?;
    let output_dir = config.output_dir.as_path();

    if let Some(previous) = load_submission(output_dir) {
        state = apply(state, Msg::RestoreSubmission(previous));
    }
    let (next, effects) = update(state, Msg::StartClicked { at: Utc::now() });
    state = next;
    if effects.is_empty() {
        println!("Nothing to submit.");
        return Ok(());
    }
    save_submission(output_dir, state.submission());

    let factory = gitlab_factory(
        config.tracker.domain.clone(),
        config.token(token)?,
        config.tracker_settings(),
    );
    let engine = EngineHandle::new(
        factory,
        SubmitSettings {
            interval: config.interval(),
            ..SubmitSettings::default()
        },
    );
    for effect in effects {
        engine.execute(effect);
    }

    println!("Type p + Enter to pause, r + Enter to resume.");
    let controls = spawn_console_controls();
    loop {
        for msg in controls.try_iter() {
            let (next, effects) = update(state, msg);
            state = next;
            for effect in effects {
                engine.execute(effect);
            }
        }
        if state.consume_dirty() {
            save_submission(output_dir, state.submission());
        }
        if state.submission().status().is_terminal() {
            break;
        }

        let msg = match engine.recv_timeout(CONTROL_POLL) {
            Ok(SubmissionEvent::Outcome(outcome)) => {
                print_outcome(&state, &outcome);
                Msg::OutcomeRecorded(outcome)
            }
            Ok(SubmissionEvent::Paused) => {
                let submission = state.submission();
                println!(
                    "Paused after {} of {} records. Type r + Enter to resume.",
                    submission.processed_count(),
                    submission.total_count()
                );
                continue;
            }
            Ok(SubmissionEvent::Resumed) => {
                println!("Resumed.");
                continue;
            }
            Ok(SubmissionEvent::Completed { at }) => Msg::SubmissionCompleted { at },
            Ok(SubmissionEvent::Failed { message }) => Msg::SubmissionFailed { message },
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                bail!("submission engine stopped unexpectedly")
            }
        };
        state = apply(state, msg);
    }

    let path = write_results_export(
        output_dir,
        state.submission().outcomes(),
        Utc::now().date_naive(),
    )?;
    let view = state.view().submission;
    println!(
        "{} created, {} failed, {} skipped. Results written to {}",
        view.succeeded,
        view.failed,
        view.skipped,
        path.display()
    );
    if let Some(message) = view.failure_message {
        bail!("submission failed: {message}");
    }
    Ok(())
}

/// Maps a console line to a pause or resume request.
fn console_msg(line: &str) -> Option<Msg> {
    match line.trim().to_ascii_lowercase().as_str() {
        "p" | "pause" => Some(Msg::PauseClicked),
        "r" | "resume" => Some(Msg::ResumeClicked),
        _ => None,
    }
}

/// Reads stdin on its own thread. The channel closes with stdin.
fn spawn_console_controls() -> mpsc::Receiver<Msg> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match console_msg(&line) {
                Some(msg) => {
                    if tx.send(msg).is_err() {
                        break;
                    }
                }
                None => importer_debug!("ignoring console input {line:?}"),
            }
        }
    });
    rx
}

fn print_outcome(state: &AppState, outcome: &SubmissionOutcome) {
    let position = state.submission().processed_count() + 1;
    let total = state.submission().total_count();
    let detail = match outcome.status {
        OutcomeStatus::Success => outcome.remote_url.as_deref().unwrap_or(""),
        OutcomeStatus::Failed | OutcomeStatus::Skipped => outcome.error.as_deref().unwrap_or(""),
    };
    println!(
        "[{position}/{total}] {:<7} {} {}: {detail}",
        outcome.status.as_str(),
        outcome.external_id,
        outcome.title
    );
}

fn export(config: &JobConfig) -> Result<()> {
    let Some(submission) = load_submission(&config.output_dir) else {
        bail!(
            "no saved submission state in {}",
            config.output_dir.display()
        );
    };
    let path = write_results_export(
        &config.output_dir,
        submission.outcomes(),
        Utc::now().date_naive(),
    )?;
    println!(
        "Wrote {} outcomes to {}",
        submission.processed_count(),
        path.display()
    );
    Ok(())
}

fn reset(config: &JobConfig) -> Result<()> {
    let removed = clear_submission(&config.output_dir).with_context(|| {
        format!(
            "failed to remove state file in {}",
            config.output_dir.display()
        )
    })?;
    if removed {
        println!("Submission state cleared.");
    } else {
        println!("No submission state to clear.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_lines_map_to_pause_and_resume() {
        assert_eq!(console_msg("p"), Some(Msg::PauseClicked));
        assert_eq!(console_msg(" Pause \r"), Some(Msg::PauseClicked));
        assert_eq!(console_msg("r"), Some(Msg::ResumeClicked));
        assert_eq!(console_msg("RESUME"), Some(Msg::ResumeClicked));
        assert_eq!(console_msg(""), None);
        assert_eq!(console_msg("quit"), None);
    }
}
