//! Headless batch front-end: same settings file, same validation, same
//! SoX invocations as the desktop app.
//!
//! ```text
//! spectrogram-batch ~/Music/album --zoom --zoom-start 2:30 -o /tmp/spectra
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use spectrogram_generator::generation::command::build_invocation;
use spectrogram_generator::generation::params::PresetKind;
use spectrogram_generator::generation::runner::ProcessRunner;
use spectrogram_generator::generation::selection::FileSelection;
use spectrogram_generator::generation::tool::effective_sox;
use spectrogram_generator::generation::workflow::{self, Prepared, ProgressMsg, RunRequest};
use spectrogram_generator::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "spectrogram-batch", version, about = "Render FLAC spectrograms with SoX")]
struct Cli {
    /// FLAC files or folders containing them
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Settings file (defaults to the desktop app's)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output folder
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// SoX executable
    #[arg(long)]
    sox: Option<PathBuf>,

    /// Skip the full-length spectrogram
    #[arg(long)]
    no_full: bool,

    /// Also render the zoomed spectrogram
    #[arg(long)]
    zoom: bool,

    #[arg(long)]
    width: Option<String>,
    #[arg(long)]
    height: Option<String>,
    #[arg(long = "z-range")]
    z_range: Option<String>,
    #[arg(long)]
    window: Option<String>,

    #[arg(long)]
    zoom_width: Option<String>,
    #[arg(long)]
    zoom_height: Option<String>,
    #[arg(long = "zoom-z-range")]
    zoom_z_range: Option<String>,
    #[arg(long)]
    zoom_window: Option<String>,
    /// Zoom start offset, M:SS
    #[arg(long)]
    zoom_start: Option<String>,
    /// Zoom duration, M:SS
    #[arg(long)]
    zoom_duration: Option<String>,

    /// Accept heights outside the recommended set without asking
    #[arg(short, long)]
    yes: bool,

    /// Print the SoX command lines instead of running them
    #[arg(long)]
    dry_run: bool,
}

fn override_field(target: &mut String, value: Option<String>) {
    if let Some(v) = value {
        *target = v;
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => match Settings::default_path() {
            Ok(path) if path.exists() => Settings::load_or_default(&path),
            _ => Settings::default(),
        },
    };

    let full = &mut settings.full;
    override_field(&mut full.width, cli.width.clone());
    override_field(&mut full.height, cli.height.clone());
    override_field(&mut full.z_range, cli.z_range.clone());
    override_field(&mut full.window_type, cli.window.clone());
    if let Some(out) = &cli.output {
        full.output_folder = out.to_string_lossy().into_owned();
    }

    let zoom = &mut settings.zoom;
    override_field(&mut zoom.width, cli.zoom_width.clone());
    override_field(&mut zoom.height, cli.zoom_height.clone());
    override_field(&mut zoom.z_range, cli.zoom_z_range.clone());
    override_field(&mut zoom.window_type, cli.zoom_window.clone());
    override_field(&mut zoom.zoom_start, cli.zoom_start.clone());
    override_field(&mut zoom.zoom_duration, cli.zoom_duration.clone());

    Ok(settings)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;

    let mut selection = FileSelection::default();
    for input in &cli.inputs {
        if input.is_dir() {
            selection.add_folder(input)?;
        } else {
            selection.add_files([input.clone()]);
        }
    }

    let mut presets = Vec::new();
    if !cli.no_full {
        presets.push(settings.raw_preset(PresetKind::Full));
    }
    if cli.zoom {
        presets.push(settings.raw_preset(PresetKind::Zoom));
    }

    let sox = cli
        .sox
        .clone()
        .or_else(|| effective_sox(&settings.full.sox_path));
    let output_dir = settings.output_folder();

    let prepared = workflow::prepare(RunRequest {
        files: selection.files(),
        sox,
        output_dir: &output_dir,
        presets,
    })?;

    let job = match prepared {
        Prepared::Ready(job) => job,
        Prepared::NeedsConfirmation { job, report } => {
            for issue in report.advisories() {
                eprintln!("warning: {issue}");
            }
            if !cli.yes {
                bail!("non-standard height; re-run with --yes to continue");
            }
            job
        }
    };

    if cli.dry_run {
        for file in &job.files {
            for params in &job.presets {
                println!("{}", build_invocation(file, params, &job.output_dir).display_with(&job.sox));
            }
        }
        return Ok(());
    }

    job.create_output_dir()?;
    let handle = workflow::spawn(job, ProcessRunner).context("starting worker thread")?;
    let mut summary = None;
    for msg in handle.progress.iter() {
        match msg {
            ProgressMsg::Started { total_files } => println!("Processing {total_files} files"),
            ProgressMsg::UnitStarted {
                file_index,
                file_name,
                preset,
            } => println!("[{}] {file_name} ({preset})", file_index + 1),
            ProgressMsg::UnitFailed(f) => eprintln!("error: {} [{}]: {}", f.file.display(), f.preset, f.error),
            ProgressMsg::FileDone { .. } => {}
            ProgressMsg::Finished(s) => summary = Some(s),
        }
    }
    handle.join();

    let summary = summary.context("worker exited without a summary")?;
    println!("{}", summary.message());
    if !summary.failures.is_empty() {
        bail!("{} of {} spectrograms failed", summary.failures.len(), summary.generated + summary.failures.len());
    }
    Ok(())
}
