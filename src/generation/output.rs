use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};

pub const IMAGE_EXTENSION: &str = "png";

/// File names of the images in `dir`, sorted. A missing folder lists as empty.
pub fn list_outputs(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| {
            Path::new(name)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(IMAGE_EXTENSION))
        })
        .collect();
    names.sort();
    names
}

fn opener() -> Command {
    #[cfg(target_os = "windows")]
    let cmd = Command::new("explorer");
    #[cfg(target_os = "macos")]
    let cmd = Command::new("open");
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let cmd = Command::new("xdg-open");
    cmd
}

/// Hand a file or folder to the desktop's default application.
pub fn open_path(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("{} does not exist", path.display());
    }
    let mut cmd = opener();
    log::debug!("Opening {} with {:?}", path.display(), cmd.get_program());
    // Not waited on.
    cmd.arg(path)
        .spawn()
        .with_context(|| format!("opening {}", path.display()))?;
    Ok(())
}

/// Full path of a listed output.
pub fn output_file(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}

/// `file://` URI the image loaders key a preview by.
pub fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}
