//! Spectrogram rendering front-end for SoX.
//!
//! The library holds everything that does not draw pixels: persisted
//! settings, parameter validation, SoX command assembly and the batch run.
//! Both the desktop app and `spectrogram-batch` are thin layers over it.

pub mod generation;
pub mod settings;
