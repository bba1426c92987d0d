//! Runs shell-script stand-ins for SoX through the real process runner.
//! Everything lives in one test so no other test thread forks while the
//! scripts are being written.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use spectrogram_generator::generation::output::list_outputs;
use spectrogram_generator::generation::params::PresetKind;
use spectrogram_generator::generation::runner::ProcessRunner;
use spectrogram_generator::generation::workflow::{self, Prepared, ProgressMsg, RunRequest};
use spectrogram_generator::settings::Settings;

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn run_with(sox: PathBuf, inputs: &[PathBuf], out: &Path) -> (workflow::RunSummary, Vec<ProgressMsg>) {
    let settings = Settings::default();
    let Prepared::Ready(job) = workflow::prepare(RunRequest {
        files: inputs,
        sox: Some(sox),
        output_dir: out,
        presets: vec![settings.raw_preset(PresetKind::Full), settings.raw_preset(PresetKind::Zoom)],
    })
    .unwrap() else {
        panic!("defaults need no confirmation");
    };

    job.create_output_dir().unwrap();
    let handle = workflow::spawn(job, ProcessRunner).unwrap();
    let events: Vec<ProgressMsg> = handle.progress.iter().collect();
    handle.join();
    match events.last() {
        Some(ProgressMsg::Finished(summary)) => (summary.clone(), events),
        other => panic!("run ended with {other:?}"),
    }
}

#[test]
fn real_processes() {
    let dir = tempfile::tempdir().unwrap();
    // Touch the last argument (the -o target), like a successful render.
    let good = script(dir.path(), "good-sox", "for last; do :; done\n: > \"$last\"");
    // Fail only for the zoom preset of b.flac.
    let picky = script(
        dir.path(),
        "picky-sox",
        "for last; do :; done\ncase \"$last\" in\n  */b.flac_zoom.png) echo 'sox FAIL spectrogram: bad' >&2; exit 2 ;;\nesac\n: > \"$last\"",
    );

    let inputs = vec![dir.path().join("b.flac"), dir.path().join("a b.flac")];

    let out = dir.path().join("good");
    let (summary, events) = run_with(good, &inputs, &out);
    assert_eq!(summary.generated, 4);
    assert!(summary.failures.is_empty());
    assert_eq!(summary.message(), "Generated 4 spectrograms.");
    assert_eq!(
        list_outputs(&out),
        vec!["a b.flac_full.png", "a b.flac_zoom.png", "b.flac_full.png", "b.flac_zoom.png"]
    );
    let file_done = events
        .iter()
        .filter(|e| matches!(e, ProgressMsg::FileDone { .. }))
        .count();
    assert_eq!(file_done, 2);

    let out = dir.path().join("picky");
    let (summary, _) = run_with(picky, &inputs, &out);
    assert_eq!(summary.generated, 3);
    assert_eq!(summary.failures.len(), 1);
    let failure = &summary.failures[0];
    assert_eq!(failure.preset, PresetKind::Zoom);
    assert!(failure.error.contains("status 2"), "{}", failure.error);
    assert!(failure.error.contains("sox FAIL spectrogram: bad"), "{}", failure.error);
    assert_eq!(summary.message(), "Generated 3 spectrograms (1 failed).");
    assert_eq!(list_outputs(&out).len(), 3);
}
