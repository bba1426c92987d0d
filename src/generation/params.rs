use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const WIDTH_RANGE: std::ops::RangeInclusive<u32> = 100..=5000;
pub const Z_RANGE: std::ops::RangeInclusive<u32> = 20..=180;

/// Heights SoX renders without resampling the frequency axis (2^n + 1 bins).
pub const RECOMMENDED_HEIGHTS: [u32; 7] = [65, 129, 257, 513, 1025, 2049, 4097];

static TIME_FORMAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+:\d{2}$").unwrap());

/// `M:SS` check used for the zoom start offset and duration.
pub fn is_valid_time(s: &str) -> bool {
    TIME_FORMAT.is_match(s)
}

// ---------------------------------------------------------------------------
// WindowFunction
// ---------------------------------------------------------------------------

/// Windowing kernels offered for the `-w` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindowFunction {
    #[default]
    Kaiser,
    Hamming,
    Hann,
    Bartlett,
    Rectangular,
}

impl WindowFunction {
    pub const ALL: [WindowFunction; 5] = [
        WindowFunction::Kaiser,
        WindowFunction::Hamming,
        WindowFunction::Hann,
        WindowFunction::Bartlett,
        WindowFunction::Rectangular,
    ];

    /// Name as SoX expects it on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowFunction::Kaiser => "Kaiser",
            WindowFunction::Hamming => "Hamming",
            WindowFunction::Hann => "Hann",
            WindowFunction::Bartlett => "Bartlett",
            WindowFunction::Rectangular => "Rectangular",
        }
    }
}

impl fmt::Display for WindowFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowFunction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        WindowFunction::ALL
            .into_iter()
            .find(|w| w.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown window function '{wanted}'"))
    }
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

/// Which of the two spectrogram flavours a unit of work renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PresetKind {
    Full,
    Zoom,
}

impl PresetKind {
    /// Suffix appended to the input file name for the output image.
    pub fn suffix(&self) -> &'static str {
        match self {
            PresetKind::Full => "full",
            PresetKind::Zoom => "zoom",
        }
    }
}

impl fmt::Display for PresetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Time window rendered by the zoom preset, both fields in `M:SS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoomWindow {
    pub start: String,
    pub duration: String,
}

/// Validated parameters for one preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetParams {
    pub kind: PresetKind,
    pub width: u32,
    pub height: u32,
    pub z_range: u32,
    pub window: WindowFunction,
    /// Present exactly when `kind` is [`PresetKind::Zoom`].
    pub zoom: Option<ZoomWindow>,
}

/// Preset parameters as typed by the user, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPreset {
    pub kind: PresetKind,
    pub width: String,
    pub height: String,
    pub z_range: String,
    pub window: String,
    pub zoom_start: String,
    pub zoom_duration: String,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Hard errors block the run; advisories only need the user's confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Advisory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub preset: PresetKind,
    pub field: &'static str,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.preset, self.field, self.message)
    }
}

/// Every issue found across the validated presets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn advisories(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Advisory)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn has_advisories(&self) -> bool {
        self.advisories().next().is_some()
    }

    /// One issue per line, errors first.
    pub fn describe(&self) -> String {
        self.errors()
            .chain(self.advisories())
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

struct Checker<'a> {
    preset: PresetKind,
    report: &'a mut ValidationReport,
}

impl Checker<'_> {
    fn push(&mut self, field: &'static str, severity: Severity, message: String) {
        self.report.issues.push(ValidationIssue {
            preset: self.preset,
            field,
            severity,
            message,
        });
    }

    fn integer_in(
        &mut self,
        field: &'static str,
        raw: &str,
        range: std::ops::RangeInclusive<u32>,
    ) -> Option<u32> {
        match raw.trim().parse::<u32>() {
            Ok(v) if range.contains(&v) => Some(v),
            Ok(v) => {
                self.push(
                    field,
                    Severity::Error,
                    format!("{v} is outside {}–{}", range.start(), range.end()),
                );
                None
            }
            Err(_) => {
                self.push(field, Severity::Error, format!("'{}' is not an integer", raw.trim()));
                None
            }
        }
    }

    fn time(&mut self, field: &'static str, raw: &str) -> Option<String> {
        if is_valid_time(raw) {
            Some(raw.to_string())
        } else {
            self.push(field, Severity::Error, format!("'{raw}' is not in M:SS format"));
            None
        }
    }
}

/// Validate one raw preset, appending every issue to `report`.
///
/// Returns the parsed parameters only when no hard error was found for this
/// preset. Height advisories still yield parameters.
pub fn validate_preset(raw: &RawPreset, report: &mut ValidationReport) -> Option<PresetParams> {
    let mut check = Checker {
        preset: raw.kind,
        report,
    };

    let width = check.integer_in("width", &raw.width, WIDTH_RANGE);

    let height = match raw.height.trim().parse::<u32>() {
        Ok(h) if h > 0 => {
            if !RECOMMENDED_HEIGHTS.contains(&h) {
                check.push(
                    "height",
                    Severity::Advisory,
                    format!("{h} is not one of the recommended values {RECOMMENDED_HEIGHTS:?}"),
                );
            }
            Some(h)
        }
        _ => {
            check.push(
                "height",
                Severity::Error,
                format!("'{}' is not a positive integer", raw.height.trim()),
            );
            None
        }
    };

    let z_range = check.integer_in("dynamic range", &raw.z_range, Z_RANGE);

    let window = match raw.window.parse::<WindowFunction>() {
        Ok(w) => Some(w),
        Err(msg) => {
            check.push("window", Severity::Error, msg);
            None
        }
    };

    let zoom = match raw.kind {
        PresetKind::Full => Some(None),
        PresetKind::Zoom => {
            let start = check.time("zoom start", &raw.zoom_start);
            let duration = check.time("zoom duration", &raw.zoom_duration);
            match (start, duration) {
                (Some(start), Some(duration)) => Some(Some(ZoomWindow { start, duration })),
                _ => None,
            }
        }
    };

    Some(PresetParams {
        kind: raw.kind,
        width: width?,
        height: height?,
        z_range: z_range?,
        window: window?,
        zoom: zoom?,
    })
}

/// Validate every preset in `raws` without stopping at the first failure.
///
/// `Ok` carries the parsed presets plus the report (which may hold
/// advisories); `Err` carries a report with at least one hard error.
pub fn validate_all(
    raws: &[RawPreset],
) -> Result<(Vec<PresetParams>, ValidationReport), ValidationReport> {
    let mut report = ValidationReport::default();
    let parsed: Vec<Option<PresetParams>> = raws
        .iter()
        .map(|raw| validate_preset(raw, &mut report))
        .collect();

    if report.has_errors() {
        return Err(report);
    }
    Ok((parsed.into_iter().flatten().collect(), report))
}
