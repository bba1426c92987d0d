//! Generation layer: parameters, SoX command assembly and the batch run.
//!
//! Architecture:
//! ```text
//!   RawPreset (text fields)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  params   │  validate → PresetParams + advisories
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ workflow  │  gate + snapshot → GenerationJob → worker thread
//!   └──────────┘
//!        │  per (file, preset)
//!        ▼
//!   ┌──────────┐      ┌──────────┐
//!   │ command   │ ───▶ │  runner   │  sox <args…>
//!   └──────────┘      └──────────┘
//! ```

pub mod command;
pub mod output;
pub mod params;
pub mod runner;
pub mod selection;
pub mod tool;
pub mod workflow;
