use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::params::{PresetKind, PresetParams};

// ---------------------------------------------------------------------------
// Invocation – one fully assembled SoX call
// ---------------------------------------------------------------------------

/// Arguments for a single SoX run, kept as a discrete list so nothing ever
/// goes through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub input: PathBuf,
    pub preset: PresetKind,
    pub args: Vec<OsString>,
    pub output: PathBuf,
}

impl Invocation {
    /// Human-readable command line for logs and `--dry-run`.
    pub fn display_with(&self, program: &Path) -> String {
        std::iter::once(program.as_os_str())
            .chain(self.args.iter().map(|a| a.as_os_str()))
            .map(|a| quote(&a.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn quote(arg: &str) -> String {
    if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '"') {
        format!("\"{}\"", arg.replace('"', "\\\""))
    } else {
        arg.to_string()
    }
}

/// File name of `input` as displayed in titles and output names.
pub fn display_name(input: &Path) -> String {
    input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.to_string_lossy().into_owned())
}

/// `<dir>/<file name>_<suffix>.png`
pub fn output_path(input: &Path, preset: PresetKind, output_dir: &Path) -> PathBuf {
    output_dir.join(format!("{}_{}.png", display_name(input), preset.suffix()))
}

/// Title drawn above the spectrogram.
pub fn title(file_name: &str, params: &PresetParams) -> String {
    match &params.zoom {
        Some(zoom) => format!(
            "{file_name} [ZOOM {start} to {start}+{dur}]",
            start = zoom.start,
            dur = zoom.duration
        ),
        None => format!("{file_name} [FULL]"),
    }
}

/// Assemble the SoX arguments that render `input` with `params` into
/// `output_dir`. Pure: identical inputs always give identical output.
///
/// ```text
/// <input> -n remix 1 spectrogram -x W -y H -z Z -w WINDOW -t TITLE [-S START -d DUR] -o OUT
/// ```
pub fn build_invocation(input: &Path, params: &PresetParams, output_dir: &Path) -> Invocation {
    let name = display_name(input);
    let output = output_path(input, params.kind, output_dir);

    let mut args: Vec<OsString> = vec![input.as_os_str().to_owned()];
    args.extend(
        [
            "-n",
            "remix",
            "1",
            "spectrogram",
            "-x",
            &params.width.to_string(),
            "-y",
            &params.height.to_string(),
            "-z",
            &params.z_range.to_string(),
            "-w",
            params.window.as_str(),
            "-t",
            &title(&name, params),
        ]
        .into_iter()
        .map(OsString::from),
    );

    if let Some(zoom) = &params.zoom {
        args.extend(
            ["-S", zoom.start.as_str(), "-d", zoom.duration.as_str()]
                .into_iter()
                .map(OsString::from),
        );
    }

    args.push("-o".into());
    args.push(output.as_os_str().to_owned());

    Invocation {
        input: input.to_path_buf(),
        preset: params.kind,
        args,
        output,
    }
}
