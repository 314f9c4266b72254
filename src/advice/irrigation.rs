//! Irrigation advice: temperature, rainfall bucket, efficiency, schedule.

use serde::Serialize;

use crate::irrigation::{IrrigationEstimate, TemperatureStatus};

/// How much irrigation the season calls for, by rainfall bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IrrigationStatus {
    High,
    Medium,
    Moderate,
    Low,
    Minimal,
}

impl IrrigationStatus {
    pub fn from_rainfall(rainfall: f64) -> Self {
        match rainfall {
            r if r < 100.0 => IrrigationStatus::High,
            r if r < 200.0 => IrrigationStatus::Medium,
            r if r < 300.0 => IrrigationStatus::Moderate,
            r if r < 400.0 => IrrigationStatus::Low,
            _ => IrrigationStatus::Minimal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IrrigationStatus::High => "high",
            IrrigationStatus::Medium => "medium",
            IrrigationStatus::Moderate => "moderate",
            IrrigationStatus::Low => "low",
            IrrigationStatus::Minimal => "minimal",
        }
    }

    pub fn advice(self) -> &'static str {
        match self {
            IrrigationStatus::High => "Implement full irrigation system. Maintain 5-7cm standing water in paddies.",
            IrrigationStatus::Medium => "Supplement with irrigation. Ensure field is flooded during critical stages.",
            IrrigationStatus::Moderate => "Implement moderate irrigation. Monitor water levels regularly.",
            IrrigationStatus::Low => "Minimal irrigation needed. Focus on drainage during heavy rainfall.",
            IrrigationStatus::Minimal => "Focus on drainage and flood prevention. No additional irrigation required.",
        }
    }

    pub fn schedule(self) -> &'static str {
        match self {
            IrrigationStatus::High => "Maintain 5-7cm standing water throughout the growing season. Irrigate every 3-4 days.",
            IrrigationStatus::Medium => "Maintain 3-5cm standing water. Implement Alternate Wetting and Drying with 7-day cycles.",
            IrrigationStatus::Moderate => "Use Alternate Wetting and Drying with 10-day cycles. Ensure soil is moist during critical stages.",
            IrrigationStatus::Low => "Supplement only during dry spells. Focus on maintaining moist soil during critical growth stages.",
            IrrigationStatus::Minimal => "Focus on drainage rather than irrigation. Monitor for waterlogging.",
        }
    }
}

pub const COLD_ADVICE: &str = "Consider delaying planting or using cold-tolerant varieties.";
pub const HEAT_ADVICE: &str = "Increase irrigation frequency to reduce heat stress.";
pub const INFRASTRUCTURE_ADVICE: &str =
    "Improve irrigation infrastructure. Consider laser land leveling for even water distribution.";
pub const AWD_ADVICE: &str =
    "Implement water conservation practices such as alternate wetting and drying (AWD).";
pub const CONSERVATION_TIP: &str =
    "Water Conservation: Implement water-saving technologies such as drip irrigation or moisture sensors.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrrigationAdvice {
    pub recommendations: Vec<String>,
    pub irrigation_status: IrrigationStatus,
    pub schedule: &'static str,
}

/// Ordered irrigation recommendations for an estimate
pub fn irrigation_recommendations(estimate: &IrrigationEstimate) -> IrrigationAdvice {
    let efficiency = estimate.water_efficiency;
    let mut recommendations = Vec::new();

    match estimate.temperature_status.status {
        TemperatureStatus::Cold => recommendations.push(COLD_ADVICE.to_string()),
        status if status.is_heat_stress() => recommendations.push(HEAT_ADVICE.to_string()),
        _ => {}
    }

    let irrigation_status = IrrigationStatus::from_rainfall(estimate.rainfall);
    recommendations.push(irrigation_status.advice().to_string());

    if efficiency < 0.4 {
        recommendations.push(INFRASTRUCTURE_ADVICE.to_string());
    } else if efficiency < 0.6 {
        recommendations.push(AWD_ADVICE.to_string());
    }

    let schedule = irrigation_status.schedule();
    recommendations.push(format!("Irrigation Schedule: {}", schedule));

    if efficiency < 0.6 {
        recommendations.push(CONSERVATION_TIP.to_string());
    }

    IrrigationAdvice {
        recommendations,
        irrigation_status,
        schedule,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimal_dry_season() {
        // 28°C fallback: 70mm rain, 0.66 efficiency
        let est = IrrigationEstimate::from_parts(28.0, 70.0, 0.66);
        let advice = irrigation_recommendations(&est);

        assert_eq!(advice.irrigation_status, IrrigationStatus::High);
        assert_eq!(advice.recommendations, vec![
            IrrigationStatus::High.advice().to_string(),
            format!("Irrigation Schedule: {}", IrrigationStatus::High.schedule()),
        ]);
    }

    #[test]
    fn test_cold_inefficient_season_ordering() {
        let est = IrrigationEstimate::from_parts(12.0, 230.0, 0.3);
        let advice = irrigation_recommendations(&est);

        assert_eq!(advice.irrigation_status, IrrigationStatus::Moderate);
        assert_eq!(advice.recommendations.len(), 5);
        assert_eq!(advice.recommendations[0], COLD_ADVICE);
        assert_eq!(advice.recommendations[1], IrrigationStatus::Moderate.advice());
        assert_eq!(advice.recommendations[2], INFRASTRUCTURE_ADVICE);
        assert!(advice.recommendations[3].starts_with("Irrigation Schedule: Use Alternate Wetting"));
        assert_eq!(advice.recommendations[4], CONSERVATION_TIP);
    }

    #[test]
    fn test_hot_awd_season() {
        let est = IrrigationEstimate::from_parts(36.0, 450.0, 0.5);
        let advice = irrigation_recommendations(&est);

        assert_eq!(advice.irrigation_status, IrrigationStatus::Minimal);
        assert_eq!(advice.recommendations[0], HEAT_ADVICE);
        assert_eq!(advice.recommendations[2], AWD_ADVICE);
        assert_eq!(advice.recommendations.last().map(String::as_str), Some(CONSERVATION_TIP));
        assert_eq!(advice.schedule, IrrigationStatus::Minimal.schedule());
    }

    #[test]
    fn test_rainfall_buckets() {
        assert_eq!(IrrigationStatus::from_rainfall(99.9), IrrigationStatus::High);
        assert_eq!(IrrigationStatus::from_rainfall(100.0), IrrigationStatus::Medium);
        assert_eq!(IrrigationStatus::from_rainfall(299.9), IrrigationStatus::Moderate);
        assert_eq!(IrrigationStatus::from_rainfall(300.0), IrrigationStatus::Low);
        assert_eq!(IrrigationStatus::from_rainfall(400.0), IrrigationStatus::Minimal);
    }

    #[test]
    fn test_deterministic() {
        let est = IrrigationEstimate::from_parts(31.0, 180.0, 0.45);
        assert_eq!(irrigation_recommendations(&est), irrigation_recommendations(&est));
    }
}
