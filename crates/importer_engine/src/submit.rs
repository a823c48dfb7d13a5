use std::fmt;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use chrono::{DateTime, Utc};
use importer_core::{description_for, labels_csv, SubmissionOutcome, ValidatedRecord};
use importer_logging::{importer_debug, importer_error, importer_info};
use tokio::sync::watch;

use crate::gitlab::{GitLabClient, TrackerSettings};
use crate::tracker::IssueTracker;
use crate::{NewIssue, SubmissionEvent, TrackerError};

pub const MISSING_REPOSITORY: &str = "Repository ID is missing";
pub const ALREADY_CREATED: &str = "already created in a previous run";

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Builds the tracker at the start of a run; an error here fails the run.
pub type TrackerFactory =
    Arc<dyn Fn() -> Result<Arc<dyn IssueTracker>, TrackerError> + Send + Sync>;

#[derive(Clone)]
pub struct SubmitSettings {
    /// Minimum wait between two submissions.
    pub interval: Duration,
    pub clock: Clock,
}

impl Default for SubmitSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            clock: Arc::new(Utc::now),
        }
    }
}

impl fmt::Debug for SubmitSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmitSettings")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

pub trait SubmissionSink: Send + Sync {
    fn emit(&self, event: SubmissionEvent);
}

pub struct ChannelSubmissionSink {
    tx: mpsc::Sender<SubmissionEvent>,
}

impl ChannelSubmissionSink {
    pub fn new(tx: mpsc::Sender<SubmissionEvent>) -> Self {
        Self { tx }
    }
}

impl SubmissionSink for ChannelSubmissionSink {
    fn emit(&self, event: SubmissionEvent) {
        let _ = self.tx.send(event);
    }
}

/// Shared pause flag. The loop only looks at it between records.
#[derive(Debug, Clone)]
pub struct SubmissionControl {
    paused: Arc<watch::Sender<bool>>,
}

impl Default for SubmissionControl {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionControl {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            paused: Arc::new(tx),
        }
    }

    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    async fn wait_while_paused(&self, sink: &dyn SubmissionSink) {
        let mut rx = self.paused.subscribe();
        if !*rx.borrow_and_update() {
            return;
        }
        importer_info!("submission paused");
        sink.emit(SubmissionEvent::Paused);
        // The sender lives in `self`, so this only ends on resume.
        let _ = rx.wait_for(|paused| !*paused).await;
        importer_info!("submission resumed");
        sink.emit(SubmissionEvent::Resumed);
    }
}

pub fn gitlab_factory(
    domain: impl Into<String>,
    token: impl Into<String>,
    settings: TrackerSettings,
) -> TrackerFactory {
    let domain = domain.into();
    let token = token.into();
    Arc::new(move || {
        let client = GitLabClient::new(&domain, token.clone(), settings.clone())?;
        Ok::<_, TrackerError>(Arc::new(client) as Arc<dyn IssueTracker>)
    })
}

/// Submits `records` one at a time, in order, emitting one outcome per
/// record. Per-record errors become failed outcomes and never stop the loop.
/// Returns the completion event; the caller decides when to publish it.
pub async fn submit_batch(
    tracker: &dyn IssueTracker,
    records: &[ValidatedRecord],
    already_created: &[String],
    settings: &SubmitSettings,
    control: &SubmissionControl,
    sink: &dyn SubmissionSink,
) -> SubmissionEvent {
    let now = || (settings.clock)();
    let last = records.len().saturating_sub(1);

    for (index, record) in records.iter().enumerate() {
        control.wait_while_paused(sink).await;

        if already_created.contains(&record.external_id) {
            importer_debug!("{} already created, skipping", record.external_id);
            sink.emit(SubmissionEvent::Outcome(SubmissionOutcome::skipped(
                record,
                ALREADY_CREATED,
                now(),
            )));
            continue;
        }

        let outcome = match submit_one(tracker, record).await {
            Ok(created) => {
                importer_info!("{} created as #{}", record.external_id, created.iid);
                SubmissionOutcome::success(record, created.web_url, created.iid, now())
            }
            Err(message) => {
                importer_error!("{} failed: {}", record.external_id, message);
                SubmissionOutcome::failed(record, message, now())
            }
        };
        sink.emit(SubmissionEvent::Outcome(outcome));

        if index < last && !settings.interval.is_zero() {
            tokio::time::sleep(settings.interval).await;
        }
    }

    SubmissionEvent::Completed { at: now() }
}

async fn submit_one(
    tracker: &dyn IssueTracker,
    record: &ValidatedRecord,
) -> Result<crate::CreatedIssue, String> {
    let project_id = record
        .repository
        .as_ref()
        .map(|repository| repository.project_id)
        .ok_or_else(|| MISSING_REPOSITORY.to_string())?;
    let issue = NewIssue {
        title: record.title.clone(),
        description: description_for(record),
        labels: labels_csv(record),
    };
    tracker
        .create_issue(project_id, &issue)
        .await
        .map_err(|err| err.message)
}

/// One whole run: build the tracker, then submit. Returns the terminal
/// event (`Completed`, or `Failed` when the tracker cannot be built).
pub async fn run_submission(
    factory: &TrackerFactory,
    records: &[ValidatedRecord],
    already_created: &[String],
    settings: &SubmitSettings,
    control: &SubmissionControl,
    sink: &dyn SubmissionSink,
) -> SubmissionEvent {
    let tracker = match factory() {
        Ok(tracker) => tracker,
        Err(err) => {
            importer_error!("cannot start submission: {err}");
            return SubmissionEvent::Failed {
                message: err.user_message(),
            };
        }
    };
    importer_info!("submitting {} records", records.len());
    submit_batch(
        tracker.as_ref(),
        records,
        already_created,
        settings,
        control,
        sink,
    )
    .await
}
