//! Fertilizer advice from classified nutrient readings and soil pH.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::nutrients::{Nutrient, NutrientStatus, SoilNutrientReport};

pub const BALANCED_NPK_ADVICE: &str = "Apply balanced NPK fertilizer in split doses - 50% at planting, 25% during tillering, and 25% at panicle initiation.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FertilizerAdvice {
    pub recommendations: Vec<String>,
    /// Keyed in the fixed nutrient order
    pub nutrient_status: BTreeMap<Nutrient, NutrientStatus>,
}

fn deficiency_advice(nutrient: Nutrient) -> String {
    match nutrient {
        Nutrient::Nitrogen => "Nitrogen is deficient. Apply nitrogen fertilizer (urea or ammonium sulfate) at 100-120 kg/ha.".to_string(),
        Nutrient::Phosphorus => "Phosphorus is deficient. Apply phosphate fertilizer (DAP or SSP) at 60-80 kg/ha.".to_string(),
        Nutrient::Potassium => "Potassium is deficient. Apply potassium fertilizer (KCl or K2SO4) at 60-80 kg/ha.".to_string(),
        Nutrient::OrganicMatter => "Organic Matter is low. Add compost or well-rotted manure at 5-10 tons/ha.".to_string(),
        other => format!("{} is deficient. Consider applying appropriate supplements.", other.symbol()),
    }
}

fn ph_advice(ph: f64) -> String {
    if ph < 5.5 {
        format!("Soil is acidic (pH {:?}). Consider applying agricultural lime to raise pH.", ph)
    } else if ph > 7.5 {
        format!("Soil is alkaline (pH {:?}). For rice, consider acidifying amendments if available.", ph)
    } else {
        format!("Soil pH ({:?}) is in good range for rice cultivation.", ph)
    }
}

/// Ordered fertilizer recommendations for a nutrient report
pub fn fertilizer_recommendations(soil: &SoilNutrientReport) -> FertilizerAdvice {
    let mut recommendations = Vec::new();
    let mut nutrient_status = BTreeMap::new();

    for reading in &soil.nutrients {
        let name = reading.name;
        nutrient_status.insert(name, reading.status);

        match reading.status {
            NutrientStatus::Deficient => recommendations.push(deficiency_advice(name)),
            NutrientStatus::Low if name.is_macronutrient() => recommendations.push(format!(
                "{} is somewhat low. Apply moderate amounts of fertilizer.",
                name.symbol()
            )),
            NutrientStatus::Excessive if name.is_macronutrient() => recommendations.push(format!(
                "{} is excessive. Reduce or avoid further application.",
                name.symbol()
            )),
            _ => {}
        }
    }

    recommendations.push(ph_advice(soil.ph));

    let npk_deficient = [Nutrient::Nitrogen, Nutrient::Phosphorus, Nutrient::Potassium]
        .iter()
        .all(|&n| soil.reading(n).map(|r| r.status) == Some(NutrientStatus::Deficient));
    if npk_deficient {
        recommendations.push(BALANCED_NPK_ADVICE.to_string());
    }

    FertilizerAdvice {
        recommendations,
        nutrient_status,
    }
}
