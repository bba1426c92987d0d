use std::ffi::OsString;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;

// ---------------------------------------------------------------------------
// Candidate resolvers
// ---------------------------------------------------------------------------

#[cfg(windows)]
pub const SOX_EXECUTABLE: &str = "sox.exe";
#[cfg(not(windows))]
pub const SOX_EXECUTABLE: &str = "sox";

/// One place the SoX executable might live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCandidate {
    /// An exact file path.
    Fixed(PathBuf),
    /// `name` inside the directory holding the running executable.
    Bundled(String),
    /// `name` looked up through the directories of a `PATH`-style list.
    SearchPath { name: String, path: Option<OsString> },
}

impl ToolCandidate {
    /// The path this candidate points at, if it exists as a file.
    pub fn locate(&self) -> Option<PathBuf> {
        match self {
            ToolCandidate::Fixed(p) => p.is_file().then(|| p.clone()),
            ToolCandidate::Bundled(name) => {
                let exe = std::env::current_exe().ok()?;
                let p = exe.parent()?.join(name);
                p.is_file().then_some(p)
            }
            ToolCandidate::SearchPath { name, path } => {
                let path = path.clone().or_else(|| std::env::var_os("PATH"))?;
                search_path(name, &path)
            }
        }
    }
}

fn search_path(name: &str, path: &OsString) -> Option<PathBuf> {
    std::env::split_paths(path)
        .map(|dir| dir.join(name))
        .find(|p| p.is_file())
}

/// Ordered list of candidates; the first one that exists wins.
#[derive(Debug, Clone, Default)]
pub struct ToolLocator {
    pub candidates: Vec<ToolCandidate>,
}

impl ToolLocator {
    pub fn new(candidates: Vec<ToolCandidate>) -> Self {
        Self { candidates }
    }

    /// Bundled copy, then the usual install locations, then `PATH`.
    pub fn platform_default() -> Self {
        let mut candidates = vec![ToolCandidate::Bundled(SOX_EXECUTABLE.to_string())];

        #[cfg(windows)]
        let fixed = [
            r"C:\Program Files\sox-14-4-2\sox.exe",
            r"C:\Program Files (x86)\sox-14-4-2\sox.exe",
            r"C:\sox-14-4-2\sox.exe",
        ];
        #[cfg(not(windows))]
        let fixed = ["/usr/bin/sox", "/usr/local/bin/sox", "/opt/homebrew/bin/sox"];

        candidates.extend(fixed.iter().map(|p| ToolCandidate::Fixed(PathBuf::from(p))));
        candidates.push(ToolCandidate::SearchPath {
            name: SOX_EXECUTABLE.to_string(),
            path: None,
        });
        Self { candidates }
    }

    pub fn resolve(&self) -> Option<PathBuf> {
        let found = self.candidates.iter().find_map(ToolCandidate::locate);
        match &found {
            Some(p) => log::info!("Using SoX at {}", p.display()),
            None => log::warn!("SoX executable not found in any of {} locations", self.candidates.len()),
        }
        found
    }
}

static DISCOVERED: OnceCell<Option<PathBuf>> = OnceCell::new();

/// Result of searching the platform defaults, computed once per process.
pub fn discovered_sox() -> Option<&'static Path> {
    DISCOVERED
        .get_or_init(|| ToolLocator::platform_default().resolve())
        .as_deref()
}

/// The user override as given, or the cached discovery result when no
/// override is set. A bad override is not replaced; the run gate rejects it.
pub fn effective_sox(override_path: &str) -> Option<PathBuf> {
    let trimmed = override_path.trim();
    if trimmed.is_empty() {
        return discovered_sox().map(Path::to_path_buf);
    }
    let p = PathBuf::from(trimmed);
    if !p.is_file() {
        log::warn!("Configured SoX path {trimmed} does not exist");
    }
    Some(p)
}
