//! Regression Model Layer
//!
//! The nutrient and irrigation predictors are black boxes: one normalized
//! scalar in, a short normalized vector out. Estimators receive a model by
//! injection and dispatch on the tagged [`ModelOutput`] instead of guessing
//! from vector width.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::utils::normalization::{IRRIGATION_OUTPUTS, NUTRIENT_OUTPUTS};

pub const NUTRIENT_MODEL_FILE: &str = "nutrient_model.json";
pub const IRRIGATION_MODEL_FILE: &str = "irrigation_model.json";

/// Errors raised by model loading or inference
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read model file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse model file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid model shape: {0}")]
    Shape(String),

    #[error("Model '{0}' is unavailable")]
    Unavailable(String),

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// A supplied regression model
pub trait RegressionModel: Send + Sync {
    fn name(&self) -> &str;

    /// Predict from a single normalized input
    fn predict(&self, input: f64) -> Result<Vec<f64>, ModelError>;
}

impl<F> RegressionModel for F
where
    F: Fn(f64) -> Result<Vec<f64>, ModelError> + Send + Sync,
{
    fn name(&self) -> &str {
        "closure"
    }

    fn predict(&self, input: f64) -> Result<Vec<f64>, ModelError> {
        self(input)
    }
}

// ============================================================================
// Tagged Output
// ============================================================================

/// Model output, classified by shape
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    /// 1-7 normalized nutrient values (extra values are dropped)
    Nutrients(Vec<f64>),
    /// Normalized rainfall and water-use efficiency
    Irrigation([f64; IRRIGATION_OUTPUTS]),
    Malformed(String),
}

impl ModelOutput {
    pub fn from_raw(mut raw: Vec<f64>) -> Self {
        if raw.is_empty() {
            return ModelOutput::Malformed("empty output".to_string());
        }
        if raw.iter().any(|v| !v.is_finite()) {
            return ModelOutput::Malformed(format!("non-finite values in {:?}", raw));
        }
        if raw.len() == IRRIGATION_OUTPUTS {
            return ModelOutput::Irrigation([raw[0], raw[1]]);
        }
        raw.truncate(NUTRIENT_OUTPUTS);
        ModelOutput::Nutrients(raw)
    }

    pub fn width(&self) -> usize {
        match self {
            ModelOutput::Nutrients(v) => v.len(),
            ModelOutput::Irrigation(_) => IRRIGATION_OUTPUTS,
            ModelOutput::Malformed(_) => 0,
        }
    }
}

/// Run a model and classify its output
pub fn invoke(model: &dyn RegressionModel, input: f64) -> Result<ModelOutput, ModelError> {
    let raw = model.predict(input)?;
    Ok(ModelOutput::from_raw(raw))
}

// ============================================================================
// Dense Network Model
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Relu,
    Linear,
}

/// Fully connected layer; `weights[out][in]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    pub activation: Activation,
}

impl DenseLayer {
    fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| {
                let z = row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + b;
                match self.activation {
                    Activation::Relu => z.max(0.0),
                    Activation::Linear => z,
                }
            })
            .collect()
    }
}

/// Feed-forward regressor persisted as JSON weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseRegressor {
    pub name: String,
    pub layers: Vec<DenseLayer>,
}

impl DenseRegressor {
    pub fn new(name: impl Into<String>, layers: Vec<DenseLayer>) -> Result<Self, ModelError> {
        let model = Self { name: name.into(), layers };
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let display = path.display().to_string();
        let contents = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: display.clone(),
            source,
        })?;
        let model: DenseRegressor = serde_json::from_str(&contents)
            .map_err(|source| ModelError::Parse { path: display, source })?;
        model.validate()?;
        Ok(model)
    }

    /// Every layer must consume the previous layer's width; input width is 1
    fn validate(&self) -> Result<(), ModelError> {
        if self.layers.is_empty() {
            return Err(ModelError::Shape(format!("{} has no layers", self.name)));
        }
        let mut width = 1;
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.weights.len() != layer.bias.len() {
                return Err(ModelError::Shape(format!(
                    "layer {}: {} weight rows but {} biases",
                    i, layer.weights.len(), layer.bias.len()
                )));
            }
            if let Some(row) = layer.weights.iter().find(|row| row.len() != width) {
                return Err(ModelError::Shape(format!(
                    "layer {}: expected {} inputs, found row of {}",
                    i, width, row.len()
                )));
            }
            width = layer.bias.len();
        }
        Ok(())
    }

    pub fn output_width(&self) -> usize {
        self.layers.last().map(|l| l.bias.len()).unwrap_or(0)
    }
}

impl RegressionModel for DenseRegressor {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, input: f64) -> Result<Vec<f64>, ModelError> {
        let out = self
            .layers
            .iter()
            .fold(vec![input], |acc, layer| layer.forward(&acc));
        if out.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::Inference(format!("{} produced non-finite output", self.name)));
        }
        Ok(out)
    }
}

/// Placeholder for a model that could not be loaded; always fails
#[derive(Debug, Clone)]
pub struct UnavailableModel {
    name: String,
}

impl UnavailableModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl RegressionModel for UnavailableModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, _input: f64) -> Result<Vec<f64>, ModelError> {
        Err(ModelError::Unavailable(self.name.clone()))
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Nutrient and irrigation models
pub struct LoadedModels {
    pub nutrient: Arc<dyn RegressionModel>,
    pub irrigation: Arc<dyn RegressionModel>,
}

fn load_or_unavailable(dir: &Path, file: &str, name: &str) -> Arc<dyn RegressionModel> {
    let path = dir.join(file);
    match DenseRegressor::load(&path) {
        Ok(model) => {
            tracing::info!("{} model loaded ({} outputs)", name, model.output_width());
            Arc::new(model)
        }
        Err(e) => {
            tracing::warn!("Failed to load {} model: {}; predictions will use fallbacks", name, e);
            Arc::new(UnavailableModel::new(name))
        }
    }
}

/// Load both models from `dir`, substituting [`UnavailableModel`] on failure
pub fn load_models(dir: &Path) -> LoadedModels {
    tracing::info!("Loading soil nutrient model...");
    let nutrient = load_or_unavailable(dir, NUTRIENT_MODEL_FILE, "nutrient");
    tracing::info!("Loading irrigation model...");
    let irrigation = load_or_unavailable(dir, IRRIGATION_MODEL_FILE, "irrigation");
    LoadedModels { nutrient, irrigation }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn linear(weights: Vec<Vec<f64>>, bias: Vec<f64>) -> DenseLayer {
        DenseLayer { weights, bias, activation: Activation::Linear }
    }

    #[test]
    fn test_output_classified_by_shape() {
        assert_eq!(ModelOutput::from_raw(vec![0.1, 0.2]), ModelOutput::Irrigation([0.1, 0.2]));
        assert_eq!(ModelOutput::from_raw(vec![0.5; 7]), ModelOutput::Nutrients(vec![0.5; 7]));
        assert_eq!(ModelOutput::from_raw(vec![0.5; 3]).width(), 3);
        assert_eq!(ModelOutput::from_raw(vec![0.5; 9]).width(), 7);
        assert!(matches!(ModelOutput::from_raw(vec![]), ModelOutput::Malformed(_)));
        assert!(matches!(ModelOutput::from_raw(vec![0.1, f64::NAN, 0.3]), ModelOutput::Malformed(_)));
    }

    #[test]
    fn test_dense_forward_pass() {
        let model = DenseRegressor::new(
            "test",
            vec![
                DenseLayer {
                    weights: vec![vec![1.0], vec![-1.0]],
                    bias: vec![0.0, 0.0],
                    activation: Activation::Relu,
                },
                linear(vec![vec![2.0, 3.0]], vec![0.5]),
            ],
        )
        .unwrap();

        // relu(0.4)=0.4, relu(-0.4)=0 → 2*0.4 + 0.5
        let out = model.predict(0.4).unwrap();
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0], 1.3, epsilon = 1e-12);
        assert_eq!(model.output_width(), 1);
    }

    #[test]
    fn test_dense_shape_validation() {
        let err = DenseRegressor::new("bad", vec![linear(vec![vec![1.0, 2.0]], vec![0.0])]);
        assert!(matches!(err, Err(ModelError::Shape(_))));

        let err = DenseRegressor::new("bad", vec![linear(vec![vec![1.0]], vec![0.0, 1.0])]);
        assert!(matches!(err, Err(ModelError::Shape(_))));

        assert!(matches!(DenseRegressor::new("empty", vec![]), Err(ModelError::Shape(_))));
    }

    #[test]
    fn test_dense_model_from_json() {
        let json = r#"{
            "name": "irrigation",
            "layers": [
                {"weights": [[1.0]], "bias": [0.0], "activation": "relu"},
                {"weights": [[0.5], [0.25]], "bias": [0.1, 0.2], "activation": "linear"}
            ]
        }"#;
        let model: DenseRegressor = serde_json::from_str(json).unwrap();
        let output = invoke(&model, 1.0).unwrap();
        match output {
            ModelOutput::Irrigation([a, b]) => {
                assert_relative_eq!(a, 0.6);
                assert_relative_eq!(b, 0.45);
            }
            other => panic!("expected irrigation output, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_models_become_unavailable() {
        let models = load_models(Path::new("/nonexistent/models"));
        assert_eq!(models.nutrient.name(), "nutrient");
        assert!(matches!(models.irrigation.predict(0.5), Err(ModelError::Unavailable(_))));
    }

    #[test]
    fn test_closure_models() {
        let model = |x: f64| -> Result<Vec<f64>, ModelError> { Ok(vec![x, x]) };
        assert_eq!(invoke(&model, 0.3).unwrap(), ModelOutput::Irrigation([0.3, 0.3]));
    }
}
