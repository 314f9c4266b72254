//! Soil Health Advisor
//!
//! Field readings in, agronomic advice out, for paddy rice.
//!
//! - `utils/`: input clamping and min-max calibration
//! - `models`: regression model seam (JSON dense networks, fallbacks)
//! - `nutrients`, `irrigation`: estimators with deterministic fallbacks
//! - `advice/`: fertilizer and irrigation recommendation rules
//! - `disease`: knowledge base and the stand-in leaf classifier
//! - `advisor`: per-request orchestration
//!
//! The HTTP surface (`api_server`, `web`) is behind the `api` feature.

pub mod utils;
pub mod models;
pub mod nutrients;
pub mod irrigation;
pub mod advice;
pub mod disease;
pub mod advisor;
pub mod config;
pub mod uploads;

#[cfg(feature = "api")]
pub mod api_server;

#[cfg(feature = "api")]
pub mod web;

// Re-export commonly used types
pub use utils::{Calibration, ScalarKind, ScalarReading};
pub use models::{load_models, DenseRegressor, ModelError, ModelOutput, RegressionModel, UnavailableModel};
pub use nutrients::{Nutrient, NutrientEstimator, NutrientStatus, SoilNutrientReport};
pub use irrigation::{IrrigationEstimate, IrrigationEstimator, TemperatureStatus};
pub use advice::{fertilizer_recommendations, irrigation_recommendations};
pub use disease::{Disease, DiseaseKnowledgeBase, DiseasePrediction, DiseaseRecord};
pub use advisor::{Advisor, AnalysisReport, AnalysisRequest};
pub use config::ServerConfig;

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
