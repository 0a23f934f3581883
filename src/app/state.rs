use crate::error::ProcessError;
use crate::progress::ProgressIndicator;
use crate::upload::{DownloadLink, ProcessResponse, RenderedRow};
use std::sync::mpsc::Receiver;

/// Lifecycle of one upload-and-process attempt.
///
/// `Idle --select--> Selecting --submit--> Submitting --settle--> Succeeded | Failed`,
/// and a new selection from `Succeeded` or `Failed` goes back to `Selecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Selecting,
    Submitting,
    Succeeded,
    Failed,
}

impl Phase {
    pub fn accepts_selection(self) -> bool {
        !matches!(self, Phase::Submitting)
    }

    pub fn accepts_submit(self) -> bool {
        matches!(self, Phase::Selecting)
    }

    pub fn button_label(self) -> &'static str {
        match self {
            Phase::Idle | Phase::Selecting => "Process Charges",
            Phase::Submitting => "⚙ Processing...",
            Phase::Succeeded => "Processing Complete",
            Phase::Failed => "Processing Failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Danger,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsTable {
    Rows(Vec<RenderedRow>),
    /// The backend returned no rows.
    Placeholder,
}

impl ResultsTable {
    pub fn from_response(data: &ProcessResponse) -> Self {
        let rows = data.rendered_rows();
        if rows.is_empty() {
            ResultsTable::Placeholder
        } else {
            ResultsTable::Rows(rows)
        }
    }
}

pub type WorkerResult = Result<ProcessResponse, ProcessError>;

/// Everything the view renders, plus the channel from the worker thread.
#[derive(Default)]
pub struct UploadState {
    pub phase: Phase,
    pub notifications: Vec<Notification>,
    /// `Some` once the results section is revealed.
    pub results: Option<ResultsTable>,
    pub download: Option<DownloadLink>,
    pub progress: ProgressIndicator,
    pub drag_hover: bool,
    pub status_receiver: Option<Receiver<WorkerResult>>,
}

impl UploadState {
    /// Clears everything a previous attempt left on screen.
    pub fn clear_for_submission(&mut self) {
        self.notifications.clear();
        self.results = None;
        self.download = None;
        self.progress.reset();
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub fn dismiss(&mut self, index: usize) {
        if index < self.notifications.len() {
            self.notifications.remove(index);
        }
    }

    pub fn is_busy(&self) -> bool {
        self.phase == Phase::Submitting
    }
}
