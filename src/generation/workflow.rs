use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

use super::command::{build_invocation, display_name};
use super::params::{validate_all, PresetKind, PresetParams, RawPreset, ValidationReport};
use super::runner::ToolRunner;

// ---------------------------------------------------------------------------
// Gating
// ---------------------------------------------------------------------------

/// Reasons a run never starts.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("No files selected.")]
    NoFiles,

    #[error("SoX executable not found. Set its path in the settings.")]
    ToolNotFound,

    #[error("SoX path {0} does not exist. Check the settings.")]
    ToolMissing(PathBuf),

    #[error("Select at least one spectrogram type to generate.")]
    NoPresetEnabled,

    #[error("No output folder set. Choose one in the settings.")]
    NoOutputDir,

    #[error("Invalid parameters:\n{}", .0.describe())]
    Invalid(ValidationReport),

    #[error("Cannot create output folder {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything a run needs, captured before the worker starts. The worker
/// never reads live UI state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationJob {
    pub files: Vec<PathBuf>,
    pub sox: PathBuf,
    pub output_dir: PathBuf,
    /// Full before zoom, only the enabled ones.
    pub presets: Vec<PresetParams>,
}

impl GenerationJob {
    pub fn unit_count(&self) -> usize {
        self.files.len() * self.presets.len()
    }

    /// Create the output folder. Called right before the run starts, so a
    /// declined or dry run leaves the filesystem alone.
    pub fn create_output_dir(&self) -> Result<(), GateError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| GateError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })
    }
}

/// Inputs to [`prepare`], borrowed from whatever holds the current edits.
#[derive(Debug, Clone)]
pub struct RunRequest<'a> {
    pub files: &'a [PathBuf],
    pub sox: Option<PathBuf>,
    pub output_dir: &'a Path,
    /// Raw parameters of the enabled presets only.
    pub presets: Vec<RawPreset>,
}

#[derive(Debug)]
pub enum Prepared {
    Ready(GenerationJob),
    /// Valid, but some heights are outside the recommended set.
    NeedsConfirmation {
        job: GenerationJob,
        report: ValidationReport,
    },
}

/// Check the configuration and validate every enabled preset. Nothing is
/// executed and nothing is written.
pub fn prepare(request: RunRequest<'_>) -> Result<Prepared, GateError> {
    if request.files.is_empty() {
        return Err(GateError::NoFiles);
    }
    let sox = request.sox.ok_or(GateError::ToolNotFound)?;
    if !sox.is_file() {
        return Err(GateError::ToolMissing(sox));
    }
    if request.presets.is_empty() {
        return Err(GateError::NoPresetEnabled);
    }
    if request.output_dir.as_os_str().is_empty() {
        return Err(GateError::NoOutputDir);
    }

    let mut raws = request.presets;
    raws.sort_by_key(|r| r.kind);
    let (presets, report) = validate_all(&raws).map_err(GateError::Invalid)?;

    let job = GenerationJob {
        files: request.files.to_vec(),
        sox,
        output_dir: request.output_dir.to_path_buf(),
        presets,
    };

    if report.has_advisories() {
        Ok(Prepared::NeedsConfirmation { job, report })
    } else {
        Ok(Prepared::Ready(job))
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    pub file: PathBuf,
    pub preset: PresetKind,
    pub error: String,
}

/// Events sent from the worker, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressMsg {
    Started {
        total_files: usize,
    },
    UnitStarted {
        file_index: usize,
        file_name: String,
        preset: PresetKind,
    },
    UnitFailed(UnitFailure),
    /// One file finished all of its presets.
    FileDone {
        completed: usize,
        total: usize,
    },
    Finished(RunSummary),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub generated: usize,
    pub failures: Vec<UnitFailure>,
    pub files_done: usize,
    pub total_files: usize,
    pub cancelled: bool,
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

impl RunSummary {
    /// Status line shown when a run ends.
    pub fn message(&self) -> String {
        let mut msg = format!("Generated {}.", plural(self.generated, "spectrogram"));
        if !self.failures.is_empty() {
            msg = format!(
                "Generated {} ({} failed).",
                plural(self.generated, "spectrogram"),
                self.failures.len()
            );
        }
        if self.cancelled {
            msg = format!(
                "Cancelled after {} of {}. {msg}",
                self.files_done,
                plural(self.total_files, "file")
            );
        }
        msg
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Run every (file, preset) unit of `job` in order on the calling thread.
///
/// A failing unit is reported and skipped. `cancel` is checked before each
/// unit; a running SoX process is always allowed to finish.
pub fn execute<R, F>(job: &GenerationJob, runner: &mut R, cancel: &AtomicBool, mut emit: F) -> RunSummary
where
    R: ToolRunner + ?Sized,
    F: FnMut(ProgressMsg),
{
    let total = job.files.len();
    let mut summary = RunSummary {
        total_files: total,
        ..Default::default()
    };
    emit(ProgressMsg::Started { total_files: total });

    'files: for (file_index, file) in job.files.iter().enumerate() {
        let file_name = display_name(file);

        for params in &job.presets {
            if cancel.load(Ordering::Relaxed) {
                summary.cancelled = true;
                break 'files;
            }

            emit(ProgressMsg::UnitStarted {
                file_index,
                file_name: file_name.clone(),
                preset: params.kind,
            });

            let invocation = build_invocation(file, params, &job.output_dir);
            match runner.run(&job.sox, &invocation) {
                Ok(()) => {
                    log::info!("Wrote {}", invocation.output.display());
                    summary.generated += 1;
                }
                Err(e) => {
                    log::warn!("{} [{}] failed: {e}", file.display(), params.kind);
                    let failure = UnitFailure {
                        file: file.clone(),
                        preset: params.kind,
                        error: e.to_string(),
                    };
                    emit(ProgressMsg::UnitFailed(failure.clone()));
                    summary.failures.push(failure);
                }
            }
        }

        summary.files_done = file_index + 1;
        emit(ProgressMsg::FileDone {
            completed: summary.files_done,
            total,
        });
    }

    log::info!("{}", summary.message());
    emit(ProgressMsg::Finished(summary.clone()));
    summary
}

/// A run executing on its own worker thread.
pub struct RunHandle {
    pub progress: Receiver<ProgressMsg>,
    cancel: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl RunHandle {
    /// Ask the worker to stop before its next invocation.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Block until the worker exits.
    pub fn join(mut self) {
        if let Some(t) = self.thread.take() {
            if t.join().is_err() {
                log::error!("Generation worker panicked");
            }
        }
    }
}

/// Start `job` on a single background thread. Progress arrives on the
/// returned handle's channel and always ends with [`ProgressMsg::Finished`]
/// unless the worker panics.
pub fn spawn<R>(job: GenerationJob, mut runner: R) -> std::io::Result<RunHandle>
where
    R: ToolRunner + Send + 'static,
{
    let (tx, rx): (Sender<ProgressMsg>, Receiver<ProgressMsg>) = crossbeam_channel::unbounded();
    let cancel = Arc::new(AtomicBool::new(false));

    let thread = std::thread::Builder::new()
        .name("spectrogram-worker".into())
        .spawn({
            let cancel = cancel.clone();
            move || {
                execute(&job, &mut runner, &cancel, |msg| {
                    // The receiver may be gone if the UI closed; keep going.
                    tx.send(msg).ok();
                });
            }
        })?;

    Ok(RunHandle {
        progress: rx,
        cancel,
        thread: Some(thread),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::command::Invocation;
    use crate::generation::params::{WindowFunction, ZoomWindow};
    use crate::generation::runner::InvocationError;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Invocation>,
        fail_on: Vec<(String, PresetKind)>,
    }

    impl ToolRunner for Recorder {
        fn run(&mut self, _program: &Path, inv: &Invocation) -> Result<(), InvocationError> {
            self.calls.push(inv.clone());
            let name = display_name(&inv.input);
            if self.fail_on.contains(&(name, inv.preset)) {
                return Err(InvocationError::Failed {
                    code: Some(2),
                    stderr: "boom".into(),
                });
            }
            Ok(())
        }
    }

    fn params(kind: PresetKind) -> PresetParams {
        PresetParams {
            kind,
            width: 3000,
            height: 513,
            z_range: 120,
            window: WindowFunction::Kaiser,
            zoom: (kind == PresetKind::Zoom).then(|| ZoomWindow {
                start: "1:00".into(),
                duration: "0:02".into(),
            }),
        }
    }

    fn job(files: &[&str], presets: Vec<PresetParams>) -> GenerationJob {
        GenerationJob {
            files: files.iter().map(PathBuf::from).collect(),
            sox: "/usr/bin/sox".into(),
            output_dir: "/out".into(),
            presets,
        }
    }

    #[test]
    fn failures_do_not_stop_remaining_units() {
        let job = job(
            &["/m/a.flac", "/m/b.flac", "/m/c.flac"],
            vec![params(PresetKind::Full), params(PresetKind::Zoom)],
        );
        let mut runner = Recorder {
            fail_on: vec![("a.flac".into(), PresetKind::Full), ("b.flac".into(), PresetKind::Zoom)],
            ..Default::default()
        };
        let mut events = Vec::new();
        let summary = execute(&job, &mut runner, &AtomicBool::new(false), |m| events.push(m));

        assert_eq!(runner.calls.len(), 6);
        assert_eq!(summary.generated, 4);
        assert_eq!(summary.failures.len(), 2);
        assert_eq!(summary.files_done, 3);
        assert_eq!(summary.message(), "Generated 4 spectrograms (2 failed).");

        let file_done: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ProgressMsg::FileDone { completed, .. } => Some(*completed),
                _ => None,
            })
            .collect();
        assert_eq!(file_done, vec![1, 2, 3]);
        assert_eq!(events.first(), Some(&ProgressMsg::Started { total_files: 3 }));
        assert!(matches!(events.last(), Some(ProgressMsg::Finished(_))));
    }

    #[test]
    fn full_runs_before_zoom_for_each_file() {
        let job = job(&["/m/a.flac", "/m/b.flac"], vec![params(PresetKind::Full), params(PresetKind::Zoom)]);
        let mut runner = Recorder::default();
        execute(&job, &mut runner, &AtomicBool::new(false), |_| {});
        let order: Vec<_> = runner
            .calls
            .iter()
            .map(|c| c.output.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            order,
            ["a.flac_full.png", "a.flac_zoom.png", "b.flac_full.png", "b.flac_zoom.png"]
        );
    }

    #[test]
    fn cancelled_run_invokes_nothing() {
        let job = job(&["/m/a.flac"], vec![params(PresetKind::Full)]);
        let mut runner = Recorder::default();
        let summary = execute(&job, &mut runner, &AtomicBool::new(true), |_| {});
        assert!(runner.calls.is_empty());
        assert!(summary.cancelled);
        assert_eq!(summary.message(), "Cancelled after 0 of 1 file. Generated 0 spectrograms.");
    }

    #[test]
    fn summary_phrasing() {
        let one = RunSummary {
            generated: 1,
            ..Default::default()
        };
        assert_eq!(one.message(), "Generated 1 spectrogram.");
        let two = RunSummary {
            generated: 2,
            ..Default::default()
        };
        assert_eq!(two.message(), "Generated 2 spectrograms.");
        let cancelled = RunSummary {
            generated: 1,
            files_done: 1,
            total_files: 3,
            cancelled: true,
            ..Default::default()
        };
        assert_eq!(cancelled.message(), "Cancelled after 1 of 3 files. Generated 1 spectrogram.");
    }

    #[test]
    fn spawned_worker_streams_progress() {
        let handle = spawn(job(&["/m/a.flac", "/m/b.flac"], vec![params(PresetKind::Full)]), Recorder::default()).unwrap();
        let events: Vec<_> = handle.progress.iter().collect();
        match events.last() {
            Some(ProgressMsg::Finished(s)) => assert_eq!(s.generated, 2),
            other => panic!("unexpected last event {other:?}"),
        }
        handle.join();
    }
}
