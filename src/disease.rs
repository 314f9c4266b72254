//! Rice Disease Advisory
//!
//! Static knowledge base of rice diseases plus a stand-in classifier. There is
//! no image model: demo requests always report blast, other requests draw a
//! weighted-random disease with 70% of the mass on the five diseases and 30%
//! on healthy.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use anyhow::{bail, Context, Result};

/// Aggregate probability of drawing any non-healthy disease
pub const DISEASE_MASS: f64 = 0.7;
/// Probability of drawing healthy
pub const HEALTHY_MASS: f64 = 0.3;

/// Confidence range assigned to diseases that were not selected
const OTHER_CONFIDENCE: std::ops::RangeInclusive<f64> = 0.01..=0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disease {
    BacterialLeafBlight,
    BacterialLeafStreak,
    BrownSpot,
    Blast,
    Tungro,
    Healthy,
}

impl Disease {
    pub const ALL: [Disease; 6] = [
        Disease::BacterialLeafBlight,
        Disease::BacterialLeafStreak,
        Disease::BrownSpot,
        Disease::Blast,
        Disease::Tungro,
        Disease::Healthy,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Disease::BacterialLeafBlight => "bacterial_leaf_blight",
            Disease::BacterialLeafStreak => "bacterial_leaf_streak",
            Disease::BrownSpot => "brown_spot",
            Disease::Blast => "blast",
            Disease::Tungro => "tungro",
            Disease::Healthy => "healthy",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.id() == id)
    }

    /// "bacterial_leaf_blight" → "Bacterial Leaf Blight"
    pub fn display_name(self) -> String {
        self.id()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    None => String::new(),
                    Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    None,
    Medium,
    High,
    /// Only used by the fallback record
    Unknown,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseRecord {
    pub scientific_name: String,
    pub symptoms: String,
    pub causes: String,
    pub management: String,
    pub severity: Severity,
    pub confidence: f64,
}

impl DiseaseRecord {
    /// Confidence must be a probability in (0, 1]; `unknown` severity is
    /// reserved for the fallback record
    pub fn validate(&self) -> Result<()> {
        if !(self.confidence > 0.0 && self.confidence <= 1.0) {
            bail!("confidence {} is outside (0, 1]", self.confidence);
        }
        if self.severity == Severity::Unknown {
            bail!("severity 'unknown' is reserved for unrecognized diseases");
        }
        Ok(())
    }

    /// Returned for identifiers the knowledge base does not know
    pub fn unknown() -> Self {
        Self {
            scientific_name: "Unknown".to_string(),
            symptoms: "Information not available".to_string(),
            causes: "Information not available".to_string(),
            management: "Please consult an agricultural expert".to_string(),
            severity: Severity::Unknown,
            confidence: 0.5,
        }
    }
}

// ============================================================================
// Built-in Knowledge Base
// ============================================================================

struct BuiltinEntry {
    disease: Disease,
    scientific_name: &'static str,
    symptoms: &'static str,
    causes: &'static str,
    management: &'static str,
    severity: Severity,
    confidence: f64,
}

static RICE_DISEASES: &[BuiltinEntry] = &[
    BuiltinEntry {
        disease: Disease::BacterialLeafBlight,
        scientific_name: "Xanthomonas oryzae pv. oryzae",
        symptoms: "Water-soaked lesions on leaf margins that turn yellow and then white/gray as they enlarge.",
        causes: "Bacterial pathogen that enters through wounds or natural openings, favored by warm, humid conditions.",
        management: "Use resistant varieties, practice field sanitation, avoid excessive nitrogen fertilization, treat seeds with hot water or antibiotics.",
        severity: Severity::High,
        confidence: 0.92,
    },
    BuiltinEntry {
        disease: Disease::BacterialLeafStreak,
        scientific_name: "Xanthomonas oryzae pv. oryzicola",
        symptoms: "Narrow, dark brown streaks between leaf veins that may later turn yellowish at margins.",
        causes: "Bacterial pathogen that enters through stomata and wounds, spreads via rain splash and irrigation.",
        management: "Use resistant varieties, practice crop rotation, maintain field hygiene, avoid overhead irrigation.",
        severity: Severity::Medium,
        confidence: 0.87,
    },
    BuiltinEntry {
        disease: Disease::BrownSpot,
        scientific_name: "Cochliobolus miyabeanus (Bipolaris oryzae)",
        symptoms: "Oval brown spots on leaves, often with yellow halos; affected seeds may have discolored husks.",
        causes: "Fungal infection, often associated with nutrient deficiency especially potassium.",
        management: "Balanced fertilization, particularly potassium; fungicide treatment; proper spacing; resistant varieties.",
        severity: Severity::Medium,
        confidence: 0.90,
    },
    BuiltinEntry {
        disease: Disease::Blast,
        scientific_name: "Magnaporthe oryzae",
        symptoms: "Diamond-shaped lesions on leaves with dark borders and gray/white centers, can affect stems and panicles.",
        causes: "Fungal pathogen that spreads via spores, favored by high humidity and moderate temperatures.",
        management: "Use resistant varieties, fungicide application, balanced fertilization, proper water management.",
        severity: Severity::High,
        confidence: 0.95,
    },
    BuiltinEntry {
        disease: Disease::Tungro,
        scientific_name: "Rice tungro bacilliform virus (RTBV) and Rice tungro spherical virus (RTSV)",
        symptoms: "Yellow to orange discoloration of leaves, stunted growth, reduced tillering.",
        causes: "Viral disease transmitted by green leafhoppers (Nephotettix virescens).",
        management: "Vector control with insecticides, resistant varieties, adjusting planting time, removing infected plants.",
        severity: Severity::High,
        confidence: 0.88,
    },
    BuiltinEntry {
        disease: Disease::Healthy,
        scientific_name: "N/A",
        symptoms: "No disease symptoms, normal green coloration, vigorous growth.",
        causes: "N/A",
        management: "Maintain balanced nutrition, proper water management, regular monitoring for early disease detection.",
        severity: Severity::None,
        confidence: 0.93,
    },
];

/// Read-only map of disease → record, built once at startup
#[derive(Debug, Clone)]
pub struct DiseaseKnowledgeBase {
    records: FxHashMap<Disease, DiseaseRecord>,
}

impl Default for DiseaseKnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DiseaseKnowledgeBase {
    pub fn builtin() -> Self {
        let records = RICE_DISEASES
            .iter()
            .map(|e| {
                (e.disease, DiseaseRecord {
                    scientific_name: e.scientific_name.to_string(),
                    symptoms: e.symptoms.to_string(),
                    causes: e.causes.to_string(),
                    management: e.management.to_string(),
                    severity: e.severity,
                    confidence: e.confidence,
                })
            })
            .collect();
        Self { records }
    }

    /// Load from a JSON object keyed by disease id. Diseases the file omits
    /// keep their built-in record.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read disease knowledge base: {:?}", path))?;
        let overrides: FxHashMap<Disease, DiseaseRecord> = serde_json::from_str(&contents)
            .with_context(|| "Failed to parse disease knowledge base JSON")?;

        for (disease, record) in &overrides {
            record
                .validate()
                .with_context(|| format!("Invalid record for '{}' in {:?}", disease.id(), path))?;
        }

        let mut kb = Self::builtin();
        kb.records.extend(overrides);
        Ok(kb)
    }

    pub fn record(&self, disease: Disease) -> Option<&DiseaseRecord> {
        self.records.get(&disease)
    }

    /// Look up a disease by id, falling back to the "unknown" record
    pub fn info(&self, disease_id: &str) -> DiseaseRecord {
        Disease::from_id(disease_id)
            .and_then(|d| self.record(d))
            .cloned()
            .unwrap_or_else(DiseaseRecord::unknown)
    }

    fn confidence(&self, disease: Disease) -> f64 {
        self.record(disease)
            .map(|r| r.confidence)
            .unwrap_or_else(|| DiseaseRecord::unknown().confidence)
    }

    fn severity(&self, disease: Disease) -> Severity {
        self.record(disease).map(|r| r.severity).unwrap_or(Severity::Unknown)
    }
}

// ============================================================================
// Stand-in Classifier
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseProbability {
    pub disease: Disease,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseasePrediction {
    pub disease: Disease,
    pub confidence: f64,
    pub severity: Severity,
    /// One entry per known disease, in table order; sums to 1
    pub probabilities: Vec<DiseaseProbability>,
}

impl DiseasePrediction {
    pub fn probability(&self, disease: Disease) -> Option<f64> {
        self.probabilities
            .iter()
            .find(|p| p.disease == disease)
            .map(|p| p.probability)
    }
}

fn selection_weights() -> Vec<f64> {
    let diseased = (Disease::ALL.len() - 1) as f64;
    Disease::ALL
        .iter()
        .map(|d| match d {
            Disease::Healthy => HEALTHY_MASS,
            _ => DISEASE_MASS / diseased,
        })
        .collect()
}

/// Pick a disease without looking at any image
pub fn select_disease<R: Rng + ?Sized>(is_demo: bool, rng: &mut R) -> Disease {
    if is_demo {
        return Disease::Blast;
    }
    match WeightedIndex::new(selection_weights()) {
        Ok(dist) => Disease::ALL[dist.sample(rng)],
        // Weights are constant and positive
        Err(_) => Disease::Blast,
    }
}

impl DiseaseKnowledgeBase {
    /// Produce a disease prediction with a normalized probability table
    pub fn predict<R: Rng + ?Sized>(&self, is_demo: bool, rng: &mut R) -> DiseasePrediction {
        let disease = select_disease(is_demo, rng);
        let confidence = self.confidence(disease);

        let raw: Vec<(Disease, f64)> = Disease::ALL
            .iter()
            .map(|&d| {
                let p = if d == disease {
                    confidence
                } else {
                    (rng.gen_range(OTHER_CONFIDENCE) * 100.0).round() / 100.0
                };
                (d, p)
            })
            .collect();

        let total: f64 = raw.iter().map(|(_, p)| p).sum();
        let probabilities = raw
            .into_iter()
            .map(|(disease, p)| DiseaseProbability { disease, probability: p / total })
            .collect();

        tracing::debug!("Disease prediction: {} (demo: {})", disease.id(), is_demo);

        DiseasePrediction {
            disease,
            confidence,
            severity: self.severity(disease),
            probabilities,
        }
    }
}
