use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

use super::command::Invocation;

/// Why a single SoX run did not produce its image.
#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("could not launch {program}: {source}")]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sox exited with {}{}", exit_label(.code), stderr_suffix(.stderr))]
    Failed { code: Option<i32>, stderr: String },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

/// Something that can execute an [`Invocation`].
///
/// The workflow only talks to this trait so tests can swap the real process
/// launch for a recorder.
pub trait ToolRunner {
    fn run(&mut self, program: &Path, invocation: &Invocation) -> Result<(), InvocationError>;
}

/// Launches the real executable and waits for it to exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&mut self, program: &Path, invocation: &Invocation) -> Result<(), InvocationError> {
        log::debug!("{}", invocation.display_with(program));

        let output = Command::new(program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| InvocationError::Launch {
                program: program.to_path_buf(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if output.status.success() {
            if !stderr.trim().is_empty() {
                log::debug!("sox stderr: {}", stderr.trim());
            }
            Ok(())
        } else {
            Err(InvocationError::Failed {
                code: output.status.code(),
                stderr: stderr.into_owned(),
            })
        }
    }
}
