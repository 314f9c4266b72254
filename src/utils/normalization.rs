//! Normalization Utilities
//!
//! Min-max scaling between physical readings and the [0, 1] space the
//! regression models were trained in.
//!
//! Input ranges are held per scalar kind (pH, temperature). Output ranges are
//! held per domain (nutrients, irrigation). When no persisted calibration is
//! available a deterministic default is synthesized from fixed constants.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};

// ============================================================================
// Default Calibration Constants
// ============================================================================

/// Calibration points the default input scaler is fit on (pH and temperature
/// share one scaler in the trained models).
const DEFAULT_INPUT_POINTS: [f64; 4] = [3.0, 10.0, 15.0, 40.0];

/// Unified output table: columns 0-1 irrigation (rainfall, efficiency),
/// columns 2-8 nutrients (OM, EC, N, P, K, Mg, Fe).
const DEFAULT_OUTPUT_MIN: [f64; 9] = [50.0, 0.2, 1.0, 0.1, 10.0, 5.0, 40.0, 2.0, 1.0];
const DEFAULT_OUTPUT_MAX: [f64; 9] = [500.0, 0.9, 10.0, 2.0, 80.0, 60.0, 300.0, 50.0, 30.0];

pub const IRRIGATION_OUTPUTS: usize = 2;
pub const NUTRIENT_OUTPUTS: usize = 7;

// ============================================================================
// Scalar Readings
// ============================================================================

/// Kind of scalar a user submits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Ph,
    Temperature,
}

impl ScalarKind {
    /// Valid physical range; readings are clamped into it before use
    pub fn valid_range(self) -> (f64, f64) {
        match self {
            ScalarKind::Ph => (0.0, 14.0),
            ScalarKind::Temperature => (10.0, 40.0),
        }
    }

    /// Substitute for non-finite input (matches the form defaults)
    pub fn default_value(self) -> f64 {
        match self {
            ScalarKind::Ph => 7.0,
            ScalarKind::Temperature => 25.0,
        }
    }
}

/// A clamped physical measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarReading {
    value: f64,
}

impl ScalarReading {
    pub fn new(kind: ScalarKind, raw: f64) -> Self {
        let (lo, hi) = kind.valid_range();
        let value = if raw.is_finite() {
            raw.clamp(lo, hi)
        } else {
            tracing::warn!("Non-finite {:?} reading, using default {}", kind, kind.default_value());
            kind.default_value()
        };
        Self { value }
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

// ============================================================================
// Ranges
// ============================================================================

/// Min/max pair for linear scaling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationRange {
    pub min: f64,
    pub max: f64,
}

impl NormalizationRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Fit a range to observed points (min-max scaler `fit`)
    pub fn fit(points: &[f64]) -> Self {
        let min = points.iter().copied().fold(f64::INFINITY, f64::min);
        let max = points.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self { min, max }
    }

    /// Zero-width ranges scale with span 1, as sklearn's MinMaxScaler does
    fn span(&self) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 { 1.0 } else { span }
    }

    /// Physical → [0, 1]. Values outside the range extrapolate linearly.
    pub fn scale(&self, value: f64) -> f64 {
        (value - self.min) / self.span()
    }

    /// [0, 1] → physical
    pub fn unscale(&self, scaled: f64) -> f64 {
        self.min + scaled * self.span()
    }
}

/// Which model domain an output vector belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputDomain {
    Nutrients,
    Irrigation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRanges {
    pub ph: NormalizationRange,
    pub temperature: NormalizationRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRanges {
    pub irrigation: [NormalizationRange; IRRIGATION_OUTPUTS],
    pub nutrients: [NormalizationRange; NUTRIENT_OUTPUTS],
}

// ============================================================================
// Calibration
// ============================================================================

/// Scaling parameters for both model inputs and outputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub input: InputRanges,
    pub output: OutputRanges,
}

impl Default for Calibration {
    fn default() -> Self {
        let input_range = NormalizationRange::fit(&DEFAULT_INPUT_POINTS);
        let unified: [NormalizationRange; 9] = std::array::from_fn(|i| {
            NormalizationRange::new(DEFAULT_OUTPUT_MIN[i], DEFAULT_OUTPUT_MAX[i])
        });
        Self::from_unified_output(
            InputRanges { ph: input_range, temperature: input_range },
            unified,
        )
    }
}

impl Calibration {
    /// Split a single 9-column output table into per-domain ranges
    pub fn from_unified_output(input: InputRanges, unified: [NormalizationRange; 9]) -> Self {
        let irrigation = [unified[0], unified[1]];
        let nutrients = std::array::from_fn(|i| unified[IRRIGATION_OUTPUTS + i]);
        Self {
            input,
            output: OutputRanges { irrigation, nutrients },
        }
    }

    /// Load calibration from JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read calibration file: {:?}", path))?;

        serde_json::from_str(&contents)
            .with_context(|| "Failed to parse calibration JSON")
    }

    /// Load calibration, synthesizing the default when the file is unusable
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(cal) => {
                tracing::info!("Loaded calibration from {:?}", path);
                cal
            }
            Err(e) => {
                tracing::warn!("Calibration unavailable ({:#}), using default ranges", e);
                Self::default()
            }
        }
    }

    fn input_range(&self, kind: ScalarKind) -> &NormalizationRange {
        match kind {
            ScalarKind::Ph => &self.input.ph,
            ScalarKind::Temperature => &self.input.temperature,
        }
    }

    fn output_ranges(&self, domain: OutputDomain) -> &[NormalizationRange] {
        match domain {
            OutputDomain::Nutrients => &self.output.nutrients,
            OutputDomain::Irrigation => &self.output.irrigation,
        }
    }

    /// Scale a physical reading into model input space
    pub fn scale_in(&self, value: f64, kind: ScalarKind) -> f64 {
        self.input_range(kind).scale(value)
    }

    /// Inverse-scale a model output vector into physical units.
    ///
    /// Always yields the full domain width: missing trailing entries are read
    /// as 0 (the column minimum), extra entries are ignored.
    pub fn scale_out(&self, scaled: &[f64], domain: OutputDomain) -> Vec<f64> {
        self.output_ranges(domain)
            .iter()
            .enumerate()
            .map(|(i, range)| range.unscale(scaled.get(i).copied().unwrap_or(0.0)))
            .collect()
    }
}
