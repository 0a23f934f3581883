mod state;
mod ui;


use crate::config::{AppConfig, ProgressMode};
use crate::error::ProcessError;
use crate::progress::{CosmeticProgress, ProgressSource, TransferCounter, TransferProgress};
use crate::upload::{Credentials, ProcessClient, SelectedFile};
use eframe::{egui, App};
pub use state::{Notification, NotificationKind, Phase, ResultsTable, UploadState, WorkerResult};
use std::sync::mpsc as std_mpsc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

/// Work handed to the background thread for one submission.
pub struct Submission {
    pub file: SelectedFile,
    pub credentials: Credentials,
    pub counter: Option<TransferCounter>,
}

/// The upload-and-process controller behind the window.
pub struct ChargeProcessor {
    config: AppConfig,
    client: ProcessClient,
    credentials: Credentials,
    selected_file: Option<SelectedFile>,
    state: UploadState,
}

impl ChargeProcessor {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        info!("Initializing charge processor against {}", config.server_url);
        Self::with_config(config)
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            client: ProcessClient::new(config.server_url.clone()),
            config,
            credentials: Credentials::default(),
            selected_file: None,
            state: UploadState::default(),
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn credentials_mut(&mut self) -> &mut Credentials {
        &mut self.credentials
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    /// Replaces the current selection. Refused while a submission is running.
    pub fn handle_file_select(&mut self, file: SelectedFile) -> bool {
        if !self.state.phase.accepts_selection() {
            debug!("ignoring selection of '{}' while processing", file.name);
            return false;
        }
        info!("Selected file: {}", file.name);
        self.selected_file = Some(file);
        self.state.phase = Phase::Selecting;
        true
    }

    /// Takes the first offered file; the rest are ignored.
    pub fn select_first<I>(&mut self, files: I) -> bool
    where
        I: IntoIterator<Item = SelectedFile>,
    {
        match files.into_iter().next() {
            Some(file) => self.handle_file_select(file),
            None => false,
        }
    }

    pub fn set_drag_hover(&mut self, hovering: bool) {
        self.state.drag_hover = hovering && self.state.phase.accepts_selection();
    }

    /// Validates the form and moves to `Submitting`.
    ///
    /// Returns `None` when nothing should be sent: a submission is already
    /// running or finished, or validation failed (one notification is added).
    pub fn begin_submission(&mut self, now: Instant) -> Option<Submission> {
        if matches!(
            self.state.phase,
            Phase::Submitting | Phase::Succeeded | Phase::Failed
        ) {
            debug!("submit ignored in phase {:?}", self.state.phase);
            return None;
        }

        let file = match &self.selected_file {
            Some(file) if self.credentials.is_complete() => file.clone(),
            _ => {
                self.state
                    .notify(Notification::danger(ProcessError::Validation.to_string()));
                return None;
            }
        };

        self.state.clear_for_submission();
        self.state.phase = Phase::Submitting;

        let settings = &self.config.progress;
        let mut counter = None;
        let source: Box<dyn ProgressSource> = match settings.mode {
            ProgressMode::Cosmetic => Box::new(CosmeticProgress::new(now, settings.clone())),
            ProgressMode::Transfer => {
                let shared = TransferCounter::default();
                counter = Some(shared.clone());
                let total = file.size().unwrap_or(0);
                Box::new(TransferProgress::new(shared, total, settings))
            }
        };
        self.state.progress.start(source, now);

        debug!("phase -> Submitting with '{}'", file.name);
        Some(Submission {
            file,
            credentials: self.credentials.clone(),
            counter,
        })
    }

    pub fn start_processing(&mut self) {
        let Some(submission) = self.begin_submission(Instant::now()) else {
            return;
        };

        let (sender, receiver) = std_mpsc::channel();
        self.state.status_receiver = Some(receiver);
        let client = self.client.clone();

        std::thread::spawn(move || {
            let result = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt.block_on(async {
                    client
                        .process(&submission.file, &submission.credentials, submission.counter)
                        .await
                }),
                Err(e) => Err(ProcessError::Runtime(e)),
            };
            // The window may have closed already.
            let _ = sender.send(result);
        });
    }

    /// Advances progress and picks up the worker's result, if any.
    pub fn update_state(&mut self, now: Instant) {
        self.state.progress.tick(now);

        let Some(receiver) = &self.state.status_receiver else {
            return;
        };
        match receiver.try_recv() {
            Ok(result) => self.finish(result),
            Err(std_mpsc::TryRecvError::Empty) => {}
            Err(std_mpsc::TryRecvError::Disconnected) => self.finish(Err(ProcessError::WorkerLost)),
        }
    }

    /// Renders the outcome of the single outstanding request.
    pub fn finish(&mut self, result: WorkerResult) {
        self.state.status_receiver = None;

        match result {
            Ok(data) => {
                self.state.progress.settle(true);
                self.state.phase = Phase::Succeeded;
                self.state.results = Some(ResultsTable::from_response(&data));
                self.state.notify(Notification::success(data.summary()));
                self.state.download = data.download_link(self.client.server_url());
                info!(
                    "Processing complete, download {}",
                    if self.state.download.is_some() { "armed" } else { "unavailable" }
                );
            }
            Err(e) => {
                warn!("Processing failed: {}", e);
                self.state.progress.settle(false);
                self.state.phase = Phase::Failed;
                self.state
                    .notify(Notification::danger(format!("An error occurred: {}", e)));
            }
        }
    }

    pub fn dismiss_notification(&mut self, index: usize) {
        self.state.dismiss(index);
    }

    pub fn open_download(&self) {
        if let Some(link) = &self.state.download {
            info!("Opening download for {}", link.file_name);
            if let Err(e) = open::that(&link.url) {
                warn!("could not open {}: {}", link.url, e);
            }
        }
    }

    pub fn browse_for_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new().pick_file() {
            self.handle_file_select(SelectedFile::from_path(path));
        }
    }

    /// Tracks drag hover and consumes drops so nothing else reacts to them.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());
        self.set_drag_hover(hovering);

        let dropped = ctx.input_mut(|i| std::mem::take(&mut i.raw.dropped_files));
        if dropped.is_empty() {
            return;
        }
        self.state.drag_hover = false;
        if dropped.len() > 1 {
            debug!("{} files dropped, keeping the first", dropped.len());
        }
        self.select_first(dropped.first().and_then(selected_from_drop));
    }
}

fn selected_from_drop(file: &egui::DroppedFile) -> Option<SelectedFile> {
    if let Some(path) = &file.path {
        return Some(SelectedFile::from_path(path.clone()));
    }
    file.bytes
        .as_ref()
        .map(|bytes| SelectedFile::from_bytes(file.name.clone(), bytes.clone()))
}

impl App for ChargeProcessor {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_files(ctx);
        self.update_state(Instant::now());
        self.render(ctx);

        if self.state.is_busy() {
            ctx.request_repaint_after(REPAINT_INTERVAL);
        }
    }
}
