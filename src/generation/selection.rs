use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Extension accepted when adding a whole folder.
pub const AUDIO_EXTENSION: &str = "flac";

// ---------------------------------------------------------------------------
// FileSelection – the list of inputs for the next run
// ---------------------------------------------------------------------------

/// Input files in insertion order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelection {
    files: Vec<PathBuf>,
}

impl FileSelection {
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Append paths not already present. Returns how many were added.
    pub fn add_files<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let before = self.files.len();
        for path in paths {
            let path = path.into();
            if !self.files.contains(&path) {
                self.files.push(path);
            }
        }
        self.files.len() - before
    }

    /// Add every `.flac` file directly inside `dir`, sorted by name.
    pub fn add_folder(&mut self, dir: &Path) -> Result<usize> {
        let found = scan_folder(dir)?;
        Ok(self.add_files(found))
    }

    /// Remove the entries at `indices`; out-of-range indices are ignored.
    pub fn remove_indices(&mut self, indices: &BTreeSet<usize>) {
        for &i in indices.iter().rev() {
            if i < self.files.len() {
                self.files.remove(i);
            }
        }
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }
}

/// True for files ending in `.flac`, any case.
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(AUDIO_EXTENSION))
        .unwrap_or(false)
}

/// Non-recursive scan of `dir` for audio files.
pub fn scan_folder(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading folder {}", dir.display()))?;

    let mut found: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_audio_file(p))
        .collect();
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_deduplicates_and_keeps_order() {
        let mut sel = FileSelection::default();
        assert_eq!(sel.add_files(["/b.flac", "/a.flac", "/b.flac"]), 2);
        assert_eq!(sel.add_files(["/a.flac", "/c.flac"]), 1);
        assert_eq!(
            sel.files(),
            [PathBuf::from("/b.flac"), PathBuf::from("/a.flac"), PathBuf::from("/c.flac")]
        );
    }

    #[test]
    fn remove_by_indices() {
        let mut sel = FileSelection::default();
        sel.add_files(["/0", "/1", "/2", "/3"]);
        sel.remove_indices(&BTreeSet::from([0, 2, 9]));
        assert_eq!(sel.files(), [PathBuf::from("/1"), PathBuf::from("/3")]);
        sel.clear();
        assert!(sel.is_empty());
    }

    #[test]
    fn folder_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.flac", "A.FLAC", "notes.txt", "c.mp3"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.flac")).unwrap();

        let mut sel = FileSelection::default();
        assert_eq!(sel.add_folder(dir.path()).unwrap(), 2);
        assert_eq!(sel.files(), [dir.path().join("A.FLAC"), dir.path().join("b.flac")]);
        assert_eq!(sel.add_folder(dir.path()).unwrap(), 0);
    }

    #[test]
    fn missing_folder_is_an_error() {
        let mut sel = FileSelection::default();
        assert!(sel.add_folder(Path::new("/no/such/folder/here")).is_err());
    }
}
