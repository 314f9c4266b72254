//! Irrigation Estimation
//!
//! Temperature → rainfall and water-use efficiency (model or formula), then a
//! seasonal water balance for rice.

use serde::Serialize;
use std::sync::Arc;

use crate::models::{self, ModelOutput, RegressionModel};
use crate::utils::normalization::{Calibration, OutputDomain, ScalarKind, ScalarReading};

pub const RAINFALL_RANGE_MM: (f64, f64) = (50.0, 500.0);
pub const EFFICIENCY_RANGE: (f64, f64) = (0.2, 0.95);

/// Average seasonal water need for rice (mm)
pub const BASE_WATER_NEED_MM: f64 = 1200.0;

/// Efficiency floor used when converting required to applied water
const MIN_APPLICATION_EFFICIENCY: f64 = 0.5;

// ============================================================================
// Temperature Status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureStatus {
    Cold,
    Cool,
    Optimal,
    Hot,
    Extreme,
}

impl TemperatureStatus {
    /// Upper bounds are exclusive: 35.0 is already extreme
    pub fn from_celsius(t: f64) -> Self {
        match t {
            t if t < 20.0 => TemperatureStatus::Cold,
            t if t < 25.0 => TemperatureStatus::Cool,
            t if t < 30.0 => TemperatureStatus::Optimal,
            t if t < 35.0 => TemperatureStatus::Hot,
            _ => TemperatureStatus::Extreme,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TemperatureStatus::Cold => "cold",
            TemperatureStatus::Cool => "cool",
            TemperatureStatus::Optimal => "optimal",
            TemperatureStatus::Hot => "hot",
            TemperatureStatus::Extreme => "extreme",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TemperatureStatus::Cold => "Cold",
            TemperatureStatus::Cool => "Moderate",
            TemperatureStatus::Optimal => "Optimal",
            TemperatureStatus::Hot => "High",
            TemperatureStatus::Extreme => "Extreme",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            TemperatureStatus::Cold => "Below optimal - growth may be inhibited",
            TemperatureStatus::Cool => "Acceptable for most rice varieties",
            TemperatureStatus::Optimal => "Ideal range for rice growth",
            TemperatureStatus::Hot => "Watch for heat stress",
            TemperatureStatus::Extreme => "High risk of heat damage",
        }
    }

    pub fn is_heat_stress(self) -> bool {
        matches!(self, TemperatureStatus::Hot | TemperatureStatus::Extreme)
    }
}

/// Display form of a temperature status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureAssessment {
    pub status: TemperatureStatus,
    pub label: &'static str,
    pub description: &'static str,
}

impl From<TemperatureStatus> for TemperatureAssessment {
    fn from(status: TemperatureStatus) -> Self {
        Self {
            status,
            label: status.label(),
            description: status.description(),
        }
    }
}

// ============================================================================
// Estimate
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrrigationEstimate {
    pub temperature: f64,
    pub rainfall: f64,
    pub water_efficiency: f64,
    pub temperature_status: TemperatureAssessment,
    pub total_water_need: f64,
    pub irrigation_required: f64,
    pub irrigation_applied: f64,
}

/// Seasonal water need adjusted for temperature
pub fn adjusted_water_need(temperature: f64) -> f64 {
    if temperature < 22.0 {
        BASE_WATER_NEED_MM * 0.9
    } else if temperature > 30.0 {
        BASE_WATER_NEED_MM * 1.15
    } else {
        BASE_WATER_NEED_MM
    }
}

/// Rainfall and efficiency from temperature alone
pub fn fallback_rainfall_efficiency(temperature: f64) -> (f64, f64) {
    let rainfall = 100.0 + (25.0 - temperature) * 10.0;
    let efficiency = 0.4 + (temperature - 15.0) * 0.02;
    clamp_estimates(rainfall, efficiency)
}

fn clamp_estimates(rainfall: f64, efficiency: f64) -> (f64, f64) {
    (
        rainfall.clamp(RAINFALL_RANGE_MM.0, RAINFALL_RANGE_MM.1),
        efficiency.clamp(EFFICIENCY_RANGE.0, EFFICIENCY_RANGE.1),
    )
}

impl IrrigationEstimate {
    /// Assemble an estimate and run the water balance
    pub fn from_parts(temperature: f64, rainfall: f64, water_efficiency: f64) -> Self {
        let total_water_need = adjusted_water_need(temperature);
        let irrigation_required = (total_water_need - rainfall).max(0.0);
        let irrigation_applied =
            irrigation_required / water_efficiency.max(MIN_APPLICATION_EFFICIENCY);

        Self {
            temperature,
            rainfall,
            water_efficiency,
            temperature_status: TemperatureStatus::from_celsius(temperature).into(),
            total_water_need,
            irrigation_required,
            irrigation_applied,
        }
    }
}

// ============================================================================
// Estimator
// ============================================================================

pub struct IrrigationEstimator {
    model: Arc<dyn RegressionModel>,
    calibration: Arc<Calibration>,
}

impl IrrigationEstimator {
    pub fn new(model: Arc<dyn RegressionModel>, calibration: Arc<Calibration>) -> Self {
        Self { model, calibration }
    }

    /// Estimate irrigation needs for an ambient temperature. Never fails.
    pub fn estimate_irrigation(&self, temperature: f64) -> IrrigationEstimate {
        let temperature = ScalarReading::new(ScalarKind::Temperature, temperature).value();
        let (rainfall, efficiency) = self.predict_rainfall_efficiency(temperature);
        IrrigationEstimate::from_parts(temperature, rainfall, efficiency)
    }

    fn predict_rainfall_efficiency(&self, temperature: f64) -> (f64, f64) {
        let scaled = self.calibration.scale_in(temperature, ScalarKind::Temperature);

        let pair: Vec<f64> = match models::invoke(self.model.as_ref(), scaled) {
            Ok(ModelOutput::Irrigation(pair)) => pair.to_vec(),
            Ok(ModelOutput::Nutrients(values)) if values.len() >= 2 => {
                tracing::warn!(
                    "Model '{}' returned {} outputs for irrigation prediction, using the first two",
                    self.model.name(),
                    values.len()
                );
                values[..2].to_vec()
            }
            Ok(other) => {
                tracing::warn!(
                    "Unusable irrigation prediction ({} outputs), using temperature formula",
                    other.width()
                );
                return fallback_rainfall_efficiency(temperature);
            }
            Err(e) => {
                tracing::warn!("Error making irrigation prediction: {}", e);
                return fallback_rainfall_efficiency(temperature);
            }
        };

        let physical = self.calibration.scale_out(&pair, OutputDomain::Irrigation);
        clamp_estimates(physical[0], physical[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModelError, UnavailableModel};
    use approx::assert_relative_eq;

    fn estimator(model: Arc<dyn RegressionModel>) -> IrrigationEstimator {
        IrrigationEstimator::new(model, Arc::new(Calibration::default()))
    }

    fn failing() -> IrrigationEstimator {
        estimator(Arc::new(UnavailableModel::new("irrigation")))
    }

    #[test]
    fn test_fallback_at_28_degrees() {
        let est = failing().estimate_irrigation(28.0);
        assert_relative_eq!(est.temperature, 28.0);
        assert_relative_eq!(est.rainfall, 70.0, epsilon = 1e-9);
        assert_relative_eq!(est.water_efficiency, 0.66, epsilon = 1e-9);
        assert_relative_eq!(est.total_water_need, 1200.0);
        assert_relative_eq!(est.irrigation_required, 1130.0, epsilon = 1e-9);
        assert_relative_eq!(est.irrigation_applied, 1130.0 / 0.66, epsilon = 1e-6);
        assert_relative_eq!(est.irrigation_applied, 1712.12, epsilon = 0.01);
        assert_eq!(est.temperature_status.status, TemperatureStatus::Optimal);
    }

    #[test]
    fn test_temperature_status_thresholds() {
        assert_eq!(TemperatureStatus::from_celsius(19.9), TemperatureStatus::Cold);
        assert_eq!(TemperatureStatus::from_celsius(20.0), TemperatureStatus::Cool);
        assert_eq!(TemperatureStatus::from_celsius(25.0), TemperatureStatus::Optimal);
        assert_eq!(TemperatureStatus::from_celsius(34.9), TemperatureStatus::Hot);
        assert_eq!(TemperatureStatus::from_celsius(35.0), TemperatureStatus::Extreme);
        assert_eq!(TemperatureStatus::from_celsius(36.0), TemperatureStatus::Extreme);
        assert_eq!(TemperatureStatus::Cool.label(), "Moderate");
    }

    #[test]
    fn test_outputs_stay_in_canonical_ranges() {
        let est = failing();
        let mut t = -20.0;
        while t <= 70.0 {
            let e = est.estimate_irrigation(t);
            assert!((10.0..=40.0).contains(&e.temperature));
            assert!((50.0..=500.0).contains(&e.rainfall));
            assert!((0.2..=0.95).contains(&e.water_efficiency));
            assert!(e.irrigation_required >= 0.0);
            t += 2.5;
        }
    }

    #[test]
    fn test_cold_input_is_clamped_before_formula() {
        let e = failing().estimate_irrigation(0.0);
        assert_relative_eq!(e.temperature, 10.0);
        // 100 + 15*10
        assert_relative_eq!(e.rainfall, 250.0);
        // 0.4 - 0.1 = 0.3, floored to 0.5 for application
        assert_relative_eq!(e.water_efficiency, 0.3, epsilon = 1e-9);
        assert_relative_eq!(e.total_water_need, 1080.0, epsilon = 1e-9);
        assert_relative_eq!(e.irrigation_applied, (1080.0 - 250.0) / 0.5, epsilon = 1e-9);
        assert_eq!(e.temperature_status.status, TemperatureStatus::Cold);
    }

    #[test]
    fn test_hot_water_need_adjustment() {
        assert_relative_eq!(adjusted_water_need(21.9), 1080.0, epsilon = 1e-9);
        assert_relative_eq!(adjusted_water_need(22.0), 1200.0);
        assert_relative_eq!(adjusted_water_need(30.0), 1200.0);
        assert_relative_eq!(adjusted_water_need(30.5), 1380.0, epsilon = 1e-9);
    }

    #[test]
    fn test_model_output_denormalized_and_clamped() {
        let model = |_x: f64| -> Result<Vec<f64>, ModelError> { Ok(vec![0.5, 1.2]) };
        let e = estimator(Arc::new(model)).estimate_irrigation(25.0);
        // 50 + 0.5*450
        assert_relative_eq!(e.rainfall, 275.0);
        // 0.2 + 1.2*0.7 = 1.04 → 0.95
        assert_relative_eq!(e.water_efficiency, 0.95);
    }

    #[test]
    fn test_nutrient_shaped_output_uses_first_two() {
        let model = |_x: f64| -> Result<Vec<f64>, ModelError> { Ok(vec![0.0, 0.0, 0.9, 0.9, 0.9, 0.9, 0.9]) };
        let e = estimator(Arc::new(model)).estimate_irrigation(25.0);
        assert_relative_eq!(e.rainfall, 50.0);
        assert_relative_eq!(e.water_efficiency, 0.2);
    }

    #[test]
    fn test_single_output_falls_back_to_formula() {
        let model = |_x: f64| -> Result<Vec<f64>, ModelError> { Ok(vec![0.4]) };
        let e = estimator(Arc::new(model)).estimate_irrigation(28.0);
        assert_relative_eq!(e.rainfall, 70.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_requirement_when_rain_exceeds_need() {
        let e = IrrigationEstimate::from_parts(25.0, 1500.0, 0.8);
        assert_relative_eq!(e.irrigation_required, 0.0);
        assert_relative_eq!(e.irrigation_applied, 0.0);
    }
}
