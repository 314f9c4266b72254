//! Soil Nutrient Estimation
//!
//! pH → seven nutrient readings, each classified against rice-specific
//! thresholds. Falls back to a deterministic pH-adjusted placeholder whenever
//! the model fails or returns the wrong kind of output.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::{self, ModelOutput, RegressionModel};
use crate::utils::normalization::{Calibration, OutputDomain, ScalarKind, ScalarReading};

// ============================================================================
// Nutrients and Thresholds
// ============================================================================

/// The fixed nutrient set, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Nutrient {
    #[serde(rename = "OM")]
    OrganicMatter,
    #[serde(rename = "EC")]
    ElectricalConductivity,
    #[serde(rename = "N")]
    Nitrogen,
    #[serde(rename = "P")]
    Phosphorus,
    #[serde(rename = "K")]
    Potassium,
    #[serde(rename = "Mg")]
    Magnesium,
    #[serde(rename = "Fe")]
    Iron,
}

impl Nutrient {
    pub const ALL: [Nutrient; 7] = [
        Nutrient::OrganicMatter,
        Nutrient::ElectricalConductivity,
        Nutrient::Nitrogen,
        Nutrient::Phosphorus,
        Nutrient::Potassium,
        Nutrient::Magnesium,
        Nutrient::Iron,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Nutrient::OrganicMatter => "OM",
            Nutrient::ElectricalConductivity => "EC",
            Nutrient::Nitrogen => "N",
            Nutrient::Phosphorus => "P",
            Nutrient::Potassium => "K",
            Nutrient::Magnesium => "Mg",
            Nutrient::Iron => "Fe",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Nutrient::OrganicMatter => "%",
            Nutrient::ElectricalConductivity => "dS/m",
            _ => "mg/kg",
        }
    }

    /// Thresholds hand-tuned for rice
    pub fn range(self) -> NutrientRange {
        match self {
            Nutrient::OrganicMatter => NutrientRange::new(1.5, 3.0, 5.0),
            Nutrient::ElectricalConductivity => NutrientRange::new(0.2, 0.5, 1.5),
            Nutrient::Nitrogen => NutrientRange::new(20.0, 40.0, 60.0),
            Nutrient::Phosphorus => NutrientRange::new(10.0, 25.0, 50.0),
            Nutrient::Potassium => NutrientRange::new(80.0, 150.0, 250.0),
            Nutrient::Magnesium => NutrientRange::new(50.0, 120.0, 200.0),
            Nutrient::Iron => NutrientRange::new(5.0, 15.0, 30.0),
        }
    }

    pub fn is_macronutrient(self) -> bool {
        matches!(self, Nutrient::Nitrogen | Nutrient::Phosphorus | Nutrient::Potassium)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientRange {
    pub low: f64,
    pub optimal: f64,
    pub high: f64,
}

impl NutrientRange {
    pub const fn new(low: f64, optimal: f64, high: f64) -> Self {
        Self { low, optimal, high }
    }

    /// The optimal band is inclusive at both ends
    pub fn classify(&self, value: f64) -> NutrientStatus {
        if value < self.low {
            NutrientStatus::Deficient
        } else if value < self.optimal {
            NutrientStatus::Low
        } else if value <= self.high {
            NutrientStatus::Optimal
        } else {
            NutrientStatus::Excessive
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NutrientStatus {
    Deficient,
    Low,
    Optimal,
    Excessive,
}

impl NutrientStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            NutrientStatus::Deficient => "deficient",
            NutrientStatus::Low => "low",
            NutrientStatus::Optimal => "optimal",
            NutrientStatus::Excessive => "excessive",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NutrientStatus::Deficient => "Deficient",
            NutrientStatus::Low => "Low",
            NutrientStatus::Optimal => "Optimal",
            NutrientStatus::Excessive => "Excessive",
        }
    }
}

// ============================================================================
// Readings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientReading {
    pub name: Nutrient,
    pub value: f64,
    pub unit: &'static str,
    pub status: NutrientStatus,
    pub status_label: &'static str,
    pub ranges: NutrientRange,
}

impl NutrientReading {
    pub fn classify(name: Nutrient, value: f64) -> Self {
        let ranges = name.range();
        let status = ranges.classify(value);
        Self {
            name,
            value,
            unit: name.unit(),
            status,
            status_label: status.label(),
            ranges,
        }
    }
}

/// Nutrient estimate for one pH reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilNutrientReport {
    pub ph: f64,
    pub nutrients: Vec<NutrientReading>,
}

impl SoilNutrientReport {
    pub fn reading(&self, nutrient: Nutrient) -> Option<&NutrientReading> {
        self.nutrients.iter().find(|r| r.name == nutrient)
    }
}

// ============================================================================
// Placeholder Generator
// ============================================================================

/// Deterministic nutrient values from pH alone.
///
/// Acidic soils lose P, K and Mg availability and gain Fe; alkaline soils the
/// reverse.
pub fn placeholder_nutrients(ph: f64) -> [f64; 7] {
    let (om, ec, n) = (3.0, 0.5, 40.0);
    let (mut p, mut k, mut mg, mut fe) = (25.0, 150.0, 80.0, 15.0);

    if ph < 5.5 {
        p *= 0.8;
        k *= 0.9;
        mg *= 0.8;
        fe *= 1.3;
    } else if ph > 7.5 {
        p *= 1.1;
        k *= 1.1;
        mg *= 1.2;
        fe *= 0.7;
    }

    [om, ec, n, p, k, mg, fe]
}

// ============================================================================
// Estimator
// ============================================================================

pub struct NutrientEstimator {
    model: Arc<dyn RegressionModel>,
    calibration: Arc<Calibration>,
}

impl NutrientEstimator {
    pub fn new(model: Arc<dyn RegressionModel>, calibration: Arc<Calibration>) -> Self {
        Self { model, calibration }
    }

    /// Estimate nutrient levels for a soil pH. Never fails.
    pub fn estimate_nutrients(&self, ph: f64) -> SoilNutrientReport {
        let ph = ScalarReading::new(ScalarKind::Ph, ph).value();
        let values = self.predict_values(ph);

        let nutrients = Nutrient::ALL
            .iter()
            .zip(values)
            .map(|(&name, value)| NutrientReading::classify(name, value))
            .collect();

        SoilNutrientReport { ph, nutrients }
    }

    fn predict_values(&self, ph: f64) -> Vec<f64> {
        let scaled = self.calibration.scale_in(ph, ScalarKind::Ph);

        match models::invoke(self.model.as_ref(), scaled) {
            Ok(ModelOutput::Nutrients(values)) => {
                self.calibration.scale_out(&values, OutputDomain::Nutrients)
            }
            Ok(ModelOutput::Irrigation(_)) => {
                tracing::warn!(
                    "Model '{}' returned irrigation output for nutrient prediction, using placeholder values",
                    self.model.name()
                );
                placeholder_nutrients(ph).to_vec()
            }
            Ok(ModelOutput::Malformed(reason)) => {
                tracing::warn!("Malformed nutrient prediction ({}), using placeholder values", reason);
                placeholder_nutrients(ph).to_vec()
            }
            Err(e) => {
                tracing::warn!("Error making nutrient prediction: {}", e);
                placeholder_nutrients(ph).to_vec()
            }
        }
    }
}
