use std::fmt;

use chrono::{DateTime, Utc};
use importer_core::SubmissionOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: u64,
    pub username: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectQuery {
    pub per_page: u32,
    pub page: Option<u32>,
    pub search: Option<String>,
}

impl Default for ProjectQuery {
    fn default() -> Self {
        Self {
            per_page: 100,
            page: None,
            search: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    pub title: String,
    pub description: Option<String>,
    /// Comma-separated label names.
    pub labels: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    pub iid: u64,
    pub web_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerError {
    pub kind: TrackerErrorKind,
    pub message: String,
}

impl TrackerError {
    pub(crate) fn new(kind: TrackerErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// HTTP status behind the error, when there was a response.
    pub fn status_code(&self) -> Option<u16> {
        match self.kind {
            TrackerErrorKind::Unauthorized(code) | TrackerErrorKind::HttpStatus(code) => Some(code),
            TrackerErrorKind::NotFound => Some(404),
            _ => None,
        }
    }

    /// Message for the person running the import, grouped by cause.
    pub fn user_message(&self) -> String {
        match self.kind {
            TrackerErrorKind::Unauthorized(_) => format!(
                "Authorization failed: check the access token and its API scope ({})",
                self.message
            ),
            TrackerErrorKind::Timeout | TrackerErrorKind::Network | TrackerErrorKind::InvalidUrl => {
                format!("Could not reach the tracker: {}", self.message)
            }
            _ => format!("Tracker API error: {}", self.message),
        }
    }
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TrackerError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerErrorKind {
    InvalidUrl,
    Unauthorized(u16),
    NotFound,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
}

impl fmt::Display for TrackerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerErrorKind::InvalidUrl => write!(f, "invalid url"),
            TrackerErrorKind::Unauthorized(code) => write!(f, "unauthorized ({code})"),
            TrackerErrorKind::NotFound => write!(f, "not found"),
            TrackerErrorKind::HttpStatus(code) => write!(f, "http status {code}"),
            TrackerErrorKind::Timeout => write!(f, "timeout"),
            TrackerErrorKind::Network => write!(f, "network error"),
            TrackerErrorKind::Decode => write!(f, "unexpected response body"),
        }
    }
}

/// Progress reported by a submission run, in the order things happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionEvent {
    Outcome(SubmissionOutcome),
    Paused,
    Resumed,
    Completed { at: DateTime<Utc> },
    Failed { message: String },
}
