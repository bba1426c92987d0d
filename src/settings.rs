//! Persisted generation settings.
//!
//! Stored as TOML with two sections: `[DEFAULT]` holds the full-length preset
//! plus the general paths, `[ZOOM]` the zoomed preset. Values are kept as the
//! text the user typed and only validated when a run starts, so a half-edited
//! field survives a save/load cycle unchanged.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generation::params::{PresetKind, RawPreset};

pub const APP_DIR: &str = "spectrogram-generator";
pub const CONFIG_FILE: &str = "spectrogram_config.toml";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("could not determine the configuration directory")]
    NoConfigDir,
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> SettingsError + '_ {
    move |source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// `[DEFAULT]`: full spectrogram preset and general paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultSection {
    pub width: String,
    pub height: String,
    pub z_range: String,
    pub window_type: String,
    pub output_folder: String,
    /// Empty means "discover automatically".
    pub sox_path: String,
}

/// `[ZOOM]`: zoomed spectrogram preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomSection {
    pub width: String,
    pub height: String,
    pub z_range: String,
    pub window_type: String,
    pub zoom_start: String,
    pub zoom_duration: String,
}

impl Default for DefaultSection {
    fn default() -> Self {
        Self {
            width: "3000".into(),
            height: "513".into(),
            z_range: "120".into(),
            window_type: "Kaiser".into(),
            output_folder: default_output_folder().to_string_lossy().into_owned(),
            sox_path: String::new(),
        }
    }
}

impl Default for ZoomSection {
    fn default() -> Self {
        Self {
            width: "500".into(),
            height: "1025".into(),
            z_range: "120".into(),
            window_type: "Kaiser".into(),
            zoom_start: "1:00".into(),
            zoom_duration: "0:02".into(),
        }
    }
}

/// `Spectrograms` under the user's pictures folder (or home, or cwd).
pub fn default_output_folder() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Spectrograms")
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "DEFAULT", default)]
    pub full: DefaultSection,
    #[serde(rename = "ZOOM", default)]
    pub zoom: ZoomSection,
}

impl Settings {
    /// `<config dir>/spectrogram-generator/spectrogram_config.toml`
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        Ok(dirs::config_dir()
            .ok_or(SettingsError::NoConfigDir)?
            .join(APP_DIR)
            .join(CONFIG_FILE))
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(io_err(path))?;
        Ok(toml::from_str(&content)?)
    }

    /// Load `path`, writing the defaults there first if it does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            return Self::load(path);
        }
        let settings = Self::default();
        settings.save(path)?;
        log::info!("Created default settings at {}", path.display());
        Ok(settings)
    }

    /// Like [`Settings::load_or_create`] but never fails: problems are logged
    /// and the defaults are used.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load_or_create(path).unwrap_or_else(|e| {
            log::warn!("{e}; using default settings");
            Self::default()
        })
    }

    /// Overwrite `path` with the current settings.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(io_err(path))?;
        log::debug!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Restore both presets to their defaults; the paths are kept.
    pub fn reset_presets(&mut self) {
        let output_folder = std::mem::take(&mut self.full.output_folder);
        let sox_path = std::mem::take(&mut self.full.sox_path);
        self.full = DefaultSection {
            output_folder,
            sox_path,
            ..DefaultSection::default()
        };
        self.zoom = ZoomSection::default();
    }

    pub fn output_folder(&self) -> PathBuf {
        PathBuf::from(self.full.output_folder.trim())
    }

    pub fn raw_preset(&self, kind: PresetKind) -> RawPreset {
        match kind {
            PresetKind::Full => RawPreset {
                kind,
                width: self.full.width.clone(),
                height: self.full.height.clone(),
                z_range: self.full.z_range.clone(),
                window: self.full.window_type.clone(),
                zoom_start: String::new(),
                zoom_duration: String::new(),
            },
            PresetKind::Zoom => RawPreset {
                kind,
                width: self.zoom.width.clone(),
                height: self.zoom.height.clone(),
                z_range: self.zoom.z_range.clone(),
                window: self.zoom.window_type.clone(),
                zoom_start: self.zoom.zoom_start.clone(),
                zoom_duration: self.zoom.zoom_duration.clone(),
            },
        }
    }
}
