use crate::{analysis::BlendMetrics, pathway::PathwayRequirements, scoring::ScoreBreakdown};
use peptoforge_schemas::{peptone::PeptoneProduct, strain::StrainProfile};
use serde::Serialize;
use std::collections::BTreeSet;

const STRENGTH_THRESHOLD: f64 = 0.7;
const PATHWAY_STRENGTH_THRESHOLD: f64 = 0.5;
const MAX_LISTED_REQUIREMENTS: usize = 3;

/// One ranked recommendation: a single peptone or a blend for one strain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitnessResult {
    pub strain: StrainProfile,
    pub peptones: Vec<PeptoneProduct>,
    pub ratios: Vec<f64>,
    pub overall_score: f64,
    pub breakdown: ScoreBreakdown,
    pub rationale: String,
    /// Raw composition of the product or blend behind the score.
    pub metrics: BlendMetrics,
}

impl FitnessResult {
    pub fn is_blend(&self) -> bool {
        self.peptones.len() > 1
    }

    /// The peptone name for a single product, `"A 60% + B 40%"` for a blend.
    pub fn description(&self) -> String {
        if let [single] = self.peptones.as_slice() {
            return single.name.clone();
        }
        self.peptones
            .iter()
            .zip(&self.ratios)
            .map(|(peptone, ratio)| format!("{} {:.0}%", peptone.name, ratio * 100.0))
            .collect::<Vec<_>>()
            .join(" + ")
    }

    pub fn to_record(&self, rank: usize) -> RecommendationRecord {
        let join = |values: Vec<String>| values.join("; ");
        RecommendationRecord {
            rank,
            strain_id: self.strain.strain_id.clone(),
            strain_name: self.strain.full_name(),
            category: self.strain.category().as_str().to_string(),
            description: self.description(),
            peptones: join(self.peptones.iter().map(|p| p.name.clone()).collect()),
            ratios: join(self.ratios.iter().map(|r| format!("{r:.4}")).collect()),
            raw_materials: join(self.peptones.iter().map(|p| p.raw_material.clone()).collect()),
            manufacturers: join(self.peptones.iter().map(|p| p.manufacturer.clone()).collect()),
            overall_score: self.overall_score,
            quality_score: self.metrics.quality_score,
            total_nitrogen: self.metrics.total_nitrogen,
            amino_nitrogen: self.metrics.amino_nitrogen,
            nutritional_match: self.breakdown.nutritional_match,
            amino_acid_match: self.breakdown.amino_acid_match,
            growth_factor_match: self.breakdown.growth_factor_match,
            mw_distribution_match: self.breakdown.mw_distribution_match,
            pathway_match: self.breakdown.pathway_match,
            rationale: self.rationale.clone(),
        }
    }
}

/// Flat row for tabular reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationRecord {
    pub rank: usize,
    pub strain_id: String,
    pub strain_name: String,
    pub category: String,
    pub description: String,
    pub peptones: String,
    pub ratios: String,
    pub raw_materials: String,
    pub manufacturers: String,
    pub overall_score: f64,
    pub quality_score: f64,
    pub total_nitrogen: f64,
    pub amino_nitrogen: f64,
    pub nutritional_match: f64,
    pub amino_acid_match: f64,
    pub growth_factor_match: f64,
    pub mw_distribution_match: f64,
    pub pathway_match: Option<f64>,
    pub rationale: String,
}

/// Explains a score in a sentence or two.
pub(crate) fn rationale(
    peptones: &[&PeptoneProduct],
    breakdown: &ScoreBreakdown,
    requirements: Option<&PathwayRequirements>,
) -> String {
    let mut parts = Vec::new();

    let mut strengths = Vec::new();
    if breakdown.amino_acid_match > STRENGTH_THRESHOLD {
        strengths.push("excellent amino acid profile");
    }
    if breakdown.growth_factor_match > STRENGTH_THRESHOLD {
        strengths.push("rich in growth factors");
    }
    if breakdown.nutritional_match > STRENGTH_THRESHOLD {
        strengths.push("optimal nitrogen content");
    }
    if breakdown.mw_distribution_match > STRENGTH_THRESHOLD {
        strengths.push("suitable peptide size distribution");
    }
    if breakdown.pathway_match.is_some_and(|m| m > PATHWAY_STRENGTH_THRESHOLD) {
        strengths.push("matches metabolic pathway requirements");
    }
    if !strengths.is_empty() {
        parts.push(format!("Strengths: {}", strengths.join(", ")));
    }

    if peptones.len() > 1 {
        let materials: BTreeSet<&str> = peptones.iter().map(|p| p.raw_material.as_str()).collect();
        if materials.len() > 1 {
            let materials: Vec<&str> = materials.into_iter().collect();
            parts.push(format!("Complementary sources: {}", materials.join(", ")));
        }
    }

    if let Some(requirements) = requirements {
        let high: Vec<&str> = requirements.high_requirements().take(MAX_LISTED_REQUIREMENTS).collect();
        if !high.is_empty() {
            parts.push(format!("Addresses requirements: {}", high.join(", ")));
        }
    }

    if parts.is_empty() {
        "Good overall match".to_string()
    } else {
        parts.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{blend_metrics, quality_score};
    use crate::pathway::RequirementLevel;
    use crate::test_support::{lab_strain, peptone};

    fn result(peptones: Vec<PeptoneProduct>, ratios: Vec<f64>) -> FitnessResult {
        let refs: Vec<&PeptoneProduct> = peptones.iter().collect();
        let metrics = blend_metrics(&refs, &ratios, None).unwrap();
        FitnessResult {
            strain: lab_strain(),
            peptones,
            ratios,
            overall_score: 0.5,
            breakdown: ScoreBreakdown::default(),
            rationale: String::new(),
            metrics,
        }
    }

    #[test]
    fn describes_singles_and_blends() {
        let single = result(vec![peptone("SP-100", "Soy", 80.0, 10.0)], vec![1.0]);
        assert_eq!(single.description(), "SP-100");
        assert!(!single.is_blend());

        let blend = result(
            vec![peptone("SP-100", "Soy", 80.0, 10.0), peptone("YE-A", "Yeast", 60.0, 8.0)],
            vec![0.6, 0.4],
        );
        assert_eq!(blend.description(), "SP-100 60% + YE-A 40%");

        let record = blend.to_record(1);
        assert_eq!(record.peptones, "SP-100; YE-A");
        assert_eq!(record.ratios, "0.6000; 0.4000");
        assert_eq!(record.category, "LAB");
        assert_eq!(record.strain_name, "Lactobacillus plantarum KCCM 12116");
        assert!((record.total_nitrogen - 72.0).abs() < 1e-12);
        assert_eq!(record.quality_score, blend.metrics.quality_score);

        let single_record = single.to_record(1);
        assert_eq!(single_record.quality_score, quality_score(&single.peptones[0].profile));
    }

    #[test]
    fn rationale_defaults_to_good_overall_match() {
        let a = peptone("A", "Soy", 80.0, 10.0);
        assert_eq!(rationale(&[&a], &ScoreBreakdown::default(), None), "Good overall match");
    }

    #[test]
    fn rationale_lists_strengths_sources_and_requirements() {
        let a = peptone("A", "Yeast", 80.0, 10.0);
        let b = peptone("B", "Soy", 80.0, 10.0);
        let breakdown = ScoreBreakdown {
            nutritional_match: 0.9,
            amino_acid_match: 0.8,
            growth_factor_match: 0.2,
            mw_distribution_match: 0.71,
            pathway_match: Some(0.6),
        };
        let mut requirements = PathwayRequirements::new();
        for nutrient in ["Lysine", "Histidine", "Arginine", "Valine"] {
            requirements.insert(nutrient, RequirementLevel::High);
        }
        requirements.insert("vitamin", RequirementLevel::Low);

        let text = rationale(&[&a, &b], &breakdown, Some(&requirements));
        assert_eq!(
            text,
            "Strengths: excellent amino acid profile, optimal nitrogen content, \
             suitable peptide size distribution, matches metabolic pathway requirements; \
             Complementary sources: Soy, Yeast; \
             Addresses requirements: Arginine, Histidine, Lysine"
        );
    }
}
