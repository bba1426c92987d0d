use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crossbeam_channel::TryRecvError;

use spectrogram_generator::generation::output::{file_uri, list_outputs, output_file};
use spectrogram_generator::generation::params::{PresetKind, ValidationReport};
use spectrogram_generator::generation::runner::ProcessRunner;
use spectrogram_generator::generation::selection::FileSelection;
use spectrogram_generator::generation::tool::effective_sox;
use spectrogram_generator::generation::workflow::{
    self, GenerationJob, Prepared, ProgressMsg, RunHandle, RunRequest, RunSummary, UnitFailure,
};
use spectrogram_generator::settings::Settings;

// ---------------------------------------------------------------------------
// Notices and run state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

/// A modal message waiting to be acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub text: String,
}

impl Notice {
    fn new(kind: NoticeKind, title: &str, text: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.to_string(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Default)]
pub enum RunState {
    #[default]
    Idle,
    /// Valid parameters, but heights need the user's confirmation.
    AwaitingConfirmation {
        job: GenerationJob,
        report: ValidationReport,
    },
    Running {
        completed: usize,
        total: usize,
        current: Option<(String, PresetKind)>,
    },
    Finished(RunSummary),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Main,
    Settings,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Settings as currently edited (text fields bind straight to these).
    pub settings: Settings,

    /// Where settings are saved; None when no config dir is available.
    pub settings_path: Option<PathBuf>,

    pub selection: FileSelection,

    /// Highlighted rows of the input list.
    pub highlighted: BTreeSet<usize>,

    pub full_enabled: bool,
    pub zoom_enabled: bool,

    /// Image names in the output folder, sorted.
    pub outputs: Vec<String>,
    pub selected_output: Option<usize>,

    /// Preview URIs whose cached images may be stale after a rescan.
    pub stale_previews: Vec<String>,

    /// SoX executable resolved at startup or from the saved override.
    pub sox_path: Option<PathBuf>,

    pub run: RunState,
    handle: Option<RunHandle>,

    /// Failures of the current or last run.
    pub failures: Vec<UnitFailure>,

    pub notice: Option<Notice>,
    pub status_message: String,
    pub tab: Tab,
}

impl AppState {
    pub fn new(settings: Settings, settings_path: Option<PathBuf>) -> Self {
        let sox_path = effective_sox(&settings.full.sox_path);
        let mut state = Self {
            settings,
            settings_path,
            selection: FileSelection::default(),
            highlighted: BTreeSet::new(),
            full_enabled: true,
            zoom_enabled: false,
            outputs: Vec::new(),
            selected_output: None,
            stale_previews: Vec::new(),
            sox_path,
            run: RunState::Idle,
            handle: None,
            failures: Vec::new(),
            notice: None,
            status_message: "Ready".to_string(),
            tab: Tab::Main,
        };
        state.refresh_outputs();
        state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.run, RunState::Running { .. })
    }

    pub fn output_folder(&self) -> PathBuf {
        self.settings.output_folder()
    }

    fn notify(&mut self, kind: NoticeKind, title: &str, text: impl Into<String>) {
        self.notice = Some(Notice::new(kind, title, text));
    }

    // ---- File selection ----

    pub fn add_files(&mut self, paths: Vec<PathBuf>) {
        let added = self.selection.add_files(paths);
        log::debug!("Added {added} files");
    }

    pub fn add_folder(&mut self, dir: &Path) {
        match self.selection.add_folder(dir) {
            Ok(0) => self.notify(
                NoticeKind::Warning,
                "Add folder",
                format!("No new FLAC files in {}", dir.display()),
            ),
            Ok(n) => log::debug!("Added {n} files from {}", dir.display()),
            Err(e) => self.notify(NoticeKind::Error, "Add folder", format!("{e:#}")),
        }
    }

    pub fn toggle_highlight(&mut self, index: usize) {
        if !self.highlighted.remove(&index) {
            self.highlighted.insert(index);
        }
    }

    pub fn remove_highlighted(&mut self) {
        self.selection.remove_indices(&self.highlighted);
        self.highlighted.clear();
    }

    pub fn clear_files(&mut self) {
        self.selection.clear();
        self.highlighted.clear();
    }

    // ---- Output listing ----

    /// Rescan the output folder. Images may have been rewritten under the
    /// same name, so every listed preview is queued to be reloaded.
    pub fn refresh_outputs(&mut self) {
        let folder = self.output_folder();
        self.outputs = list_outputs(&folder);
        self.selected_output = None;
        self.stale_previews = self
            .outputs
            .iter()
            .map(|name| file_uri(&output_file(&folder, name)))
            .collect();
    }

    pub fn selected_output_path(&self) -> Option<PathBuf> {
        let name = self.outputs.get(self.selected_output?)?;
        Some(output_file(&self.output_folder(), name))
    }

    pub fn open(&mut self, path: &Path) {
        if let Err(e) = spectrogram_generator::generation::output::open_path(path) {
            self.notify(NoticeKind::Error, "Open", format!("{e:#}"));
        }
    }

    // ---- Settings ----

    /// Re-resolve SoX after the override field changed.
    pub fn apply_sox_override(&mut self) {
        self.sox_path = effective_sox(&self.settings.full.sox_path);
    }

    pub fn save_settings(&mut self) {
        self.apply_sox_override();
        let folder = self.output_folder();
        if let Err(e) = std::fs::create_dir_all(&folder) {
            self.notify(
                NoticeKind::Error,
                "Save settings",
                format!("Cannot create output folder {}: {e}", folder.display()),
            );
            return;
        }
        self.refresh_outputs();

        let Some(path) = self.settings_path.clone() else {
            self.notify(NoticeKind::Warning, "Save settings", "No configuration directory available.");
            return;
        };
        match self.settings.save(&path) {
            Ok(()) => self.notify(NoticeKind::Info, "Save settings", "Settings saved."),
            Err(e) => self.notify(NoticeKind::Error, "Save settings", e.to_string()),
        }
    }

    pub fn reset_settings(&mut self) {
        self.settings.reset_presets();
        self.status_message = "Preset defaults restored (not saved yet)".to_string();
    }

    // ---- Generation ----

    /// Gate, validate and start a run from a snapshot of the current settings.
    pub fn start_generation(&mut self) {
        if matches!(self.run, RunState::Running { .. } | RunState::AwaitingConfirmation { .. }) {
            return;
        }

        let mut presets = Vec::new();
        if self.full_enabled {
            presets.push(self.settings.raw_preset(PresetKind::Full));
        }
        if self.zoom_enabled {
            presets.push(self.settings.raw_preset(PresetKind::Zoom));
        }
        let output_dir = self.output_folder();

        let request = RunRequest {
            files: self.selection.files(),
            sox: self.sox_path.clone(),
            output_dir: &output_dir,
            presets,
        };

        match workflow::prepare(request) {
            Ok(Prepared::Ready(job)) => self.launch(job),
            Ok(Prepared::NeedsConfirmation { job, report }) => {
                self.run = RunState::AwaitingConfirmation { job, report };
            }
            Err(e) => {
                log::warn!("Generation not started: {e}");
                self.run = RunState::Idle;
                self.notify(NoticeKind::Warning, "Cannot generate", e.to_string());
            }
        }
    }

    /// Answer the height confirmation prompt.
    pub fn confirm(&mut self, accept: bool) {
        match std::mem::take(&mut self.run) {
            RunState::AwaitingConfirmation { job, .. } if accept => self.launch(job),
            RunState::AwaitingConfirmation { .. } => {
                self.status_message = "Generation aborted".to_string();
            }
            other => self.run = other,
        }
    }

    fn launch(&mut self, job: GenerationJob) {
        if let Err(e) = job.create_output_dir() {
            self.run = RunState::Idle;
            self.notify(NoticeKind::Error, "Cannot generate", e.to_string());
            return;
        }
        let total = job.files.len();
        match workflow::spawn(job, ProcessRunner) {
            Ok(handle) => {
                self.failures.clear();
                self.handle = Some(handle);
                self.run = RunState::Running {
                    completed: 0,
                    total,
                    current: None,
                };
            }
            Err(e) => {
                self.run = RunState::Idle;
                self.notify(NoticeKind::Error, "Cannot generate", format!("Failed to start worker: {e}"));
            }
        }
    }

    pub fn cancel(&mut self) {
        if let Some(h) = &self.handle {
            h.cancel();
            self.status_message = "Cancelling after the current file…".to_string();
        }
    }

    /// Drain worker progress. Call once per frame.
    pub fn poll(&mut self) {
        let Some(handle) = &self.handle else {
            return;
        };
        let mut messages = Vec::new();
        let mut disconnected = false;
        loop {
            match handle.progress.try_recv() {
                Ok(msg) => messages.push(msg),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        for msg in messages {
            match msg {
                ProgressMsg::Started { total_files } => {
                    self.status_message = format!("Processing 0/{total_files}");
                }
                ProgressMsg::UnitStarted {
                    file_index,
                    file_name,
                    preset,
                } => {
                    if let RunState::Running { total, current, .. } = &mut self.run {
                        self.status_message =
                            format!("Processing {}/{}: {file_name} ({preset})", file_index + 1, total);
                        *current = Some((file_name, preset));
                    }
                }
                ProgressMsg::UnitFailed(failure) => self.failures.push(failure),
                ProgressMsg::FileDone { completed: done, .. } => {
                    if let RunState::Running { completed, .. } = &mut self.run {
                        *completed = done;
                    }
                }
                ProgressMsg::Finished(summary) => self.finish(summary),
            }
        }

        if disconnected && self.is_running() {
            self.worker_lost();
        }
    }

    /// The worker went away without a summary.
    fn worker_lost(&mut self) {
        if let Some(h) = self.handle.take() {
            h.join();
        }
        log::error!("Generation worker stopped without finishing");
        self.status_message = "Generation stopped unexpectedly".to_string();
        self.refresh_outputs();
        self.run = RunState::Idle;
        self.notify(
            NoticeKind::Error,
            "Generation failed",
            "The generation worker stopped unexpectedly. Images written so far are kept.",
        );
    }

    fn finish(&mut self, summary: RunSummary) {
        if let Some(h) = self.handle.take() {
            h.join();
        }
        self.status_message = summary.message();
        self.refresh_outputs();

        let mut text = summary.message();
        for f in &summary.failures {
            text.push_str(&format!("\n• {} [{}]: {}", f.file.display(), f.preset, f.error));
        }
        let kind = if summary.failures.is_empty() {
            NoticeKind::Info
        } else {
            NoticeKind::Warning
        };
        self.notify(kind, "Completed", text);
        self.run = RunState::Finished(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use spectrogram_generator::generation::command::Invocation;
    use spectrogram_generator::generation::params::validate_all;
    use spectrogram_generator::generation::runner::{InvocationError, ToolRunner};

    fn state_in(dir: &Path) -> AppState {
        let mut settings = Settings::default();
        settings.full.output_folder = dir.join("out").to_string_lossy().into_owned();
        let sox = dir.join("sox");
        std::fs::write(&sox, b"").unwrap();
        settings.full.sox_path = sox.to_string_lossy().into_owned();
        AppState::new(settings, Some(dir.join("config.toml")))
    }

    #[test]
    fn start_without_files_warns_and_stays_idle() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        state.start_generation();
        assert!(matches!(state.run, RunState::Idle));
        assert_eq!(state.notice.as_ref().unwrap().text, "No files selected.");
    }

    #[test]
    fn invalid_width_blocks_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        state.add_files(vec!["/m/a.flac".into()]);
        state.settings.full.width = "50".into();
        state.start_generation();
        assert!(matches!(state.run, RunState::Idle));
        assert!(state.notice.unwrap().text.contains("[full] width"));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn no_preset_enabled_blocks_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        state.add_files(vec!["/m/a.flac".into()]);
        state.full_enabled = false;
        state.start_generation();
        assert!(state.notice.unwrap().text.starts_with("Select at least one"));
    }

    #[test]
    fn declined_height_confirmation_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        state.add_files(vec!["/m/a.flac".into()]);
        state.settings.full.height = "600".into();
        state.start_generation();
        assert!(matches!(state.run, RunState::AwaitingConfirmation { .. }));
        state.confirm(false);
        assert!(matches!(state.run, RunState::Idle));
        assert!(state.handle.is_none());
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn blank_output_folder_blocks_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        state.add_files(vec!["/m/a.flac".into()]);
        state.settings.full.output_folder = "  ".into();
        state.start_generation();
        assert!(matches!(state.run, RunState::Idle));
        assert!(state.notice.unwrap().text.starts_with("No output folder"));
    }

    #[test]
    fn missing_configured_sox_is_reported_not_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        state.add_files(vec!["/m/a.flac".into()]);
        state.settings.full.sox_path = dir.path().join("gone").to_string_lossy().into_owned();
        state.apply_sox_override();
        assert_eq!(state.sox_path, Some(dir.path().join("gone")));
        state.start_generation();
        assert!(state.notice.unwrap().text.contains("does not exist"));
    }

    struct Crashing;

    impl ToolRunner for Crashing {
        fn run(&mut self, _program: &Path, _invocation: &Invocation) -> Result<(), InvocationError> {
            panic!("runner crashed");
        }
    }

    #[test]
    fn dead_worker_returns_to_idle_with_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        let (presets, _) = validate_all(&[Settings::default().raw_preset(PresetKind::Full)]).unwrap();
        let job = GenerationJob {
            files: vec!["/m/a.flac".into()],
            sox: dir.path().join("sox"),
            output_dir: dir.path().join("out"),
            presets,
        };

        state.handle = Some(workflow::spawn(job, Crashing).unwrap());
        state.run = RunState::Running {
            completed: 0,
            total: 1,
            current: None,
        };

        let deadline = Instant::now() + Duration::from_secs(10);
        while state.is_running() && Instant::now() < deadline {
            state.poll();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(matches!(state.run, RunState::Idle));
        assert!(state.handle.is_none());
        assert_eq!(state.notice.as_ref().unwrap().kind, NoticeKind::Error);
    }

    #[test]
    fn rescan_queues_previews_for_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        std::fs::write(out.join("a.flac_full.png"), b"").unwrap();
        state.refresh_outputs();
        assert_eq!(state.stale_previews, vec![file_uri(&out.join("a.flac_full.png"))]);
    }

    #[test]
    fn accepted_run_reports_launch_failures_and_finishes() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        // The stand-in sox is an empty, non-executable file: every launch fails.
        state.add_files(vec!["/m/a.flac".into(), "/m/b.flac".into()]);
        state.settings.full.height = "600".into();

        state.start_generation();
        state.confirm(true);
        assert!(state.is_running());

        let deadline = Instant::now() + Duration::from_secs(10);
        while state.is_running() && Instant::now() < deadline {
            state.poll();
            std::thread::sleep(Duration::from_millis(5));
        }
        match &state.run {
            RunState::Finished(summary) => {
                assert_eq!(summary.generated, 0);
                assert_eq!(summary.failures.len(), 2);
                assert_eq!(summary.files_done, 2);
            }
            other => panic!("run did not finish: {other:?}"),
        }
        assert_eq!(state.failures.len(), 2);
        assert_eq!(state.notice.as_ref().unwrap().kind, NoticeKind::Warning);
    }

    #[test]
    fn remove_highlighted_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        state.add_files(vec!["/a".into(), "/b".into(), "/c".into()]);
        state.toggle_highlight(0);
        state.toggle_highlight(2);
        state.toggle_highlight(2);
        state.remove_highlighted();
        assert_eq!(state.selection.files(), [PathBuf::from("/b"), PathBuf::from("/c")]);
    }

    #[test]
    fn save_creates_config_and_output_folder() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        state.save_settings();
        assert!(dir.path().join("config.toml").is_file());
        assert!(dir.path().join("out").is_dir());
        assert_eq!(state.notice.unwrap().kind, NoticeKind::Info);
    }
}
