//! Request Orchestration
//!
//! Runs every estimator and advice generator for one set of field readings and
//! assembles the combined report the web layer renders.

use rand::Rng;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::advice::{fertilizer_recommendations, irrigation_recommendations, FertilizerAdvice, IrrigationAdvice};
use crate::disease::{DiseaseKnowledgeBase, DiseasePrediction, DiseaseRecord};
use crate::irrigation::{IrrigationEstimate, IrrigationEstimator};
use crate::models::{self, RegressionModel};
use crate::nutrients::{NutrientEstimator, SoilNutrientReport};
use crate::utils::normalization::Calibration;

pub const CALIBRATION_FILE: &str = "scalers.json";

/// One analysis request
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub ph: f64,
    pub temperature: f64,
    /// Public URL of the uploaded leaf image, if any
    pub image_path: Option<String>,
    pub is_demo: bool,
}

impl AnalysisRequest {
    pub fn new(ph: f64, temperature: f64) -> Self {
        Self {
            ph,
            temperature,
            image_path: None,
            is_demo: false,
        }
    }

    /// Fixed readings used by the demo page
    pub fn demo(image_path: Option<String>) -> Self {
        Self {
            ph: 6.5,
            temperature: 28.0,
            image_path,
            is_demo: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub soil_nutrients: SoilNutrientReport,
    pub irrigation_data: IrrigationEstimate,
    pub fertilizer_recommendations: FertilizerAdvice,
    pub irrigation_recommendations: IrrigationAdvice,
    pub disease_results: DiseasePrediction,
    pub disease_info: DiseaseRecord,
    pub image_path: Option<String>,
    pub is_demo: bool,
}

pub struct Advisor {
    nutrients: NutrientEstimator,
    irrigation: IrrigationEstimator,
    diseases: DiseaseKnowledgeBase,
}

impl Advisor {
    pub fn new(
        nutrient_model: Arc<dyn RegressionModel>,
        irrigation_model: Arc<dyn RegressionModel>,
        calibration: Calibration,
        diseases: DiseaseKnowledgeBase,
    ) -> Self {
        let calibration = Arc::new(calibration);
        Self {
            nutrients: NutrientEstimator::new(nutrient_model, Arc::clone(&calibration)),
            irrigation: IrrigationEstimator::new(irrigation_model, calibration),
            diseases,
        }
    }

    /// Load models and calibration from `models_dir`; missing pieces fall back
    /// to their deterministic defaults
    pub fn from_dir(models_dir: &Path, diseases: DiseaseKnowledgeBase) -> Self {
        let loaded = models::load_models(models_dir);
        let calibration = Calibration::load_or_default(&models_dir.join(CALIBRATION_FILE));
        Self::new(loaded.nutrient, loaded.irrigation, calibration, diseases)
    }

    pub fn diseases(&self) -> &DiseaseKnowledgeBase {
        &self.diseases
    }

    pub fn analyze<R: Rng + ?Sized>(&self, request: AnalysisRequest, rng: &mut R) -> AnalysisReport {
        tracing::debug!(
            "Analyzing pH {} at {}°C (demo: {})",
            request.ph, request.temperature, request.is_demo
        );

        let soil_nutrients = self.nutrients.estimate_nutrients(request.ph);
        let irrigation_data = self.irrigation.estimate_irrigation(request.temperature);

        let fertilizer_recommendations = fertilizer_recommendations(&soil_nutrients);
        let irrigation_recommendations = irrigation_recommendations(&irrigation_data);

        let disease_results = self.diseases.predict(request.is_demo, rng);
        let disease_info = self.diseases.info(disease_results.disease.id());

        AnalysisReport {
            soil_nutrients,
            irrigation_data,
            fertilizer_recommendations,
            irrigation_recommendations,
            disease_results,
            disease_info,
            image_path: request.image_path,
            is_demo: request.is_demo,
        }
    }
}
