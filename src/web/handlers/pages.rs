// Page handlers for HTML rendering with Askama

use askama::Template;
use axum::response::{Html, IntoResponse};

use crate::advisor::AnalysisReport;

// ============================================================================
// View Model
// ============================================================================

/// Display-ready strings for one nutrient row
pub struct NutrientRow {
    pub symbol: &'static str,
    pub value: String,
    pub unit: &'static str,
    pub status: &'static str,
    pub label: &'static str,
    pub optimal_range: String,
}

pub struct ProbabilityRow {
    pub name: String,
    pub percent: String,
}

/// Flattened analysis report for the index template
pub struct ReportView {
    pub is_demo: bool,
    pub image_path: Option<String>,

    pub ph: String,
    pub nutrients: Vec<NutrientRow>,
    pub fertilizer: Vec<String>,

    pub temperature: String,
    pub temperature_status: &'static str,
    pub temperature_label: &'static str,
    pub temperature_description: &'static str,
    pub rainfall: String,
    pub efficiency: String,
    pub total_water_need: String,
    pub irrigation_required: String,
    pub irrigation_applied: String,
    pub irrigation_status: &'static str,
    pub irrigation_schedule: &'static str,
    pub irrigation: Vec<String>,

    pub disease_name: String,
    pub disease_confidence: String,
    pub severity: &'static str,
    pub scientific_name: String,
    pub symptoms: String,
    pub causes: String,
    pub management: String,
    pub probabilities: Vec<ProbabilityRow>,
}

impl From<&AnalysisReport> for ReportView {
    fn from(report: &AnalysisReport) -> Self {
        let soil = &report.soil_nutrients;
        let water = &report.irrigation_data;
        let disease = &report.disease_results;
        let info = &report.disease_info;

        let nutrients = soil
            .nutrients
            .iter()
            .map(|n| NutrientRow {
                symbol: n.name.symbol(),
                value: format!("{:.2}", n.value),
                unit: n.unit,
                status: n.status.as_str(),
                label: n.status_label,
                optimal_range: format!("{} - {}", n.ranges.optimal, n.ranges.high),
            })
            .collect();

        let probabilities = disease
            .probabilities
            .iter()
            .map(|p| ProbabilityRow {
                name: p.disease.display_name(),
                percent: format!("{:.0}%", p.probability * 100.0),
            })
            .collect();

        Self {
            is_demo: report.is_demo,
            image_path: report.image_path.clone(),

            ph: format!("{:.1}", soil.ph),
            nutrients,
            fertilizer: report.fertilizer_recommendations.recommendations.clone(),

            temperature: format!("{:.1}", water.temperature),
            temperature_status: water.temperature_status.status.as_str(),
            temperature_label: water.temperature_status.label,
            temperature_description: water.temperature_status.description,
            rainfall: format!("{:.1}", water.rainfall),
            efficiency: format!("{:.0}%", water.water_efficiency * 100.0),
            total_water_need: format!("{:.1}", water.total_water_need),
            irrigation_required: format!("{:.1}", water.irrigation_required),
            irrigation_applied: format!("{:.1}", water.irrigation_applied),
            irrigation_status: report.irrigation_recommendations.irrigation_status.as_str(),
            irrigation_schedule: report.irrigation_recommendations.schedule,
            irrigation: report.irrigation_recommendations.recommendations.clone(),

            disease_name: disease.disease.display_name(),
            disease_confidence: format!("{:.0}%", disease.confidence * 100.0),
            severity: disease.severity.as_str(),
            scientific_name: info.scientific_name.clone(),
            symptoms: info.symptoms.clone(),
            causes: info.causes.clone(),
            management: info.management.clone(),
            probabilities,
        }
    }
}

// ============================================================================
// Index Page
// ============================================================================

#[derive(Template)]
#[template(path = "pages/index.html")]
pub struct IndexTemplate {
    pub title: String,
    pub results: Option<ReportView>,
    pub error: Option<String>,
}

/// Render the form page, optionally with results or an error banner
pub fn render_index(results: Option<AnalysisReport>, error: Option<String>) -> Html<String> {
    let template = IndexTemplate {
        title: "Rice Soil Health Advisor".to_string(),
        results: results.as_ref().map(ReportView::from),
        error,
    };
    Html(template.render().unwrap_or_else(|e| {
        format!("Template error: {}", e)
    }))
}

pub async fn index_page() -> impl IntoResponse {
    render_index(None, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::{Advisor, AnalysisRequest};
    use crate::disease::DiseaseKnowledgeBase;
    use crate::models::UnavailableModel;
    use crate::utils::Calibration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn demo_report() -> AnalysisReport {
        let advisor = Advisor::new(
            Arc::new(UnavailableModel::new("nutrient")),
            Arc::new(UnavailableModel::new("irrigation")),
            Calibration::default(),
            DiseaseKnowledgeBase::builtin(),
        );
        advisor.analyze(AnalysisRequest::demo(None), &mut StdRng::seed_from_u64(5))
    }

    #[test]
    fn test_report_view_formatting() {
        let view = ReportView::from(&demo_report());

        assert_eq!(view.ph, "6.5");
        assert_eq!(view.nutrients.len(), 7);
        assert_eq!(view.nutrients[0].symbol, "OM");
        assert_eq!(view.rainfall, "70.0");
        assert_eq!(view.efficiency, "66%");
        assert_eq!(view.irrigation_status, "high");
        assert_eq!(view.disease_name, "Blast");
        assert_eq!(view.probabilities.len(), 6);
    }

    #[test]
    fn test_render_index_with_results() {
        let Html(page) = render_index(Some(demo_report()), None);
        assert!(page.contains("Blast"));
        assert!(page.contains("Magnaporthe oryzae"));
        assert!(page.contains("Demo"));
    }

    #[test]
    fn test_render_index_with_error() {
        let Html(page) = render_index(None, Some("Invalid ph value".to_string()));
        assert!(page.contains("Invalid ph value"));
        assert!(!page.contains("Soil Nutrients"));
    }
}
