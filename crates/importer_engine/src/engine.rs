use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use importer_core::{Effect, ValidatedRecord};
use importer_logging::importer_warn;

use crate::submit::{
    run_submission, ChannelSubmissionSink, SubmissionControl, SubmissionSink, SubmitSettings,
    TrackerFactory,
};
use crate::SubmissionEvent;

enum EngineCommand {
    Start {
        records: Vec<ValidatedRecord>,
        already_created: Vec<String>,
    },
}

/// Runs submissions on a background thread with its own tokio runtime.
/// One run at a time; events come back through `recv_timeout`.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<SubmissionEvent>,
    control: SubmissionControl,
}

impl EngineHandle {
    pub fn new(factory: TrackerFactory, settings: SubmitSettings) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let control = SubmissionControl::new();
        let loop_control = control.clone();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let running = Arc::new(AtomicBool::new(false));
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Start {
                        records,
                        already_created,
                    } => {
                        if running.swap(true, Ordering::SeqCst) {
                            importer_warn!("submission already running; start ignored");
                            continue;
                        }
                        loop_control.resume();
                        let factory = factory.clone();
                        let settings = settings.clone();
                        let control = loop_control.clone();
                        let running = running.clone();
                        let sink = ChannelSubmissionSink::new(event_tx.clone());
                        runtime.spawn(async move {
                            let terminal = run_submission(
                                &factory,
                                &records,
                                &already_created,
                                &settings,
                                &control,
                                &sink,
                            )
                            .await;
                            running.store(false, Ordering::SeqCst);
                            sink.emit(terminal);
                        });
                    }
                }
            }
        });

        Self {
            cmd_tx,
            event_rx,
            control,
        }
    }

    pub fn start(&self, records: Vec<ValidatedRecord>, already_created: Vec<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Start {
            records,
            already_created,
        });
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    /// Carries out an effect returned by `importer_core::update`.
    pub fn execute(&self, effect: Effect) {
        match effect {
            Effect::StartSubmission {
                records,
                already_created,
            } => self.start(records, already_created),
            Effect::PauseSubmission => self.pause(),
            Effect::ResumeSubmission => self.resume(),
        }
    }

    /// Waits up to `timeout` for the next event. `Disconnected` means the
    /// engine thread is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<SubmissionEvent, RecvTimeoutError> {
        self.event_rx.recv_timeout(timeout)
    }
}
