//! Fitness scoring between one strain and one peptone.
//!
//! The overall score is a weighted sum of four independent subscores, each
//! clamped to `[0, 1]` before it is combined:
//!
//! - **nutritional match**: total and amino nitrogen against targets that
//!   depend on how demanding the strain category is,
//! - **amino-acid match**: essential, free and branched-chain ratios,
//! - **growth-factor match**: nucleotides and vitamins,
//! - **molecular-weight match**: distance from the category's ideal
//!   peptide-size distribution.

use crate::{config::ScoringConfig, error::PeptoforgeError};
use peptoforge_schemas::{
    peptone::PeptoneProduct,
    profile::{Composition, NutritionalProfile},
    strain::{NutritionalType, StrainProfile},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Clamps a score into `[0, 1]`.
///
/// Several formulas legitimately leave the unit interval before clamping
/// (the pathway multiplier can lift a score to 1.15), so the clamp is silent.
/// Excursions larger than that are logged at debug level. NaN maps to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        debug!("NaN score clamped to 0");
        return 0.0;
    }
    if value < -0.25 || value > 1.25 {
        debug!(value, "score far outside [0, 1] clamped");
    }
    value.clamp(0.0, 1.0)
}

/// Mean relative deviation of `actual` from `target` over the target's keys.
///
/// A key present in the target but absent from `actual` counts as zero.
/// Zero-valued targets use the absolute deviation instead.
pub fn relative_deviation(target: &Composition, actual: &Composition) -> f64 {
    if target.is_empty() {
        return 0.0;
    }
    let total: f64 = target
        .iter()
        .map(|(key, target_value)| {
            let actual_value = actual.get(key).copied().unwrap_or(0.0);
            if *target_value > 0.0 {
                (actual_value - target_value).abs() / target_value
            } else {
                (actual_value - target_value).abs()
            }
        })
        .sum();
    total / target.len() as f64
}

/// Named subscores behind an overall fitness score.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub nutritional_match: f64,
    pub amino_acid_match: f64,
    pub growth_factor_match: f64,
    pub mw_distribution_match: f64,
    /// Present only when pathway requirement data was available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pathway_match: Option<f64>,
}

impl ScoreBreakdown {
    pub fn weighted_total(&self, config: &ScoringConfig) -> f64 {
        let w = &config.weights;
        self.nutritional_match * w.nutritional_match
            + self.amino_acid_match * w.amino_acid_match
            + self.growth_factor_match * w.growth_factor_match
            + self.mw_distribution_match * w.mw_distribution_match
    }

    /// Adds `other` scaled by `ratio` to the four core subscores.
    pub fn accumulate(&mut self, other: &ScoreBreakdown, ratio: f64) {
        self.nutritional_match += other.nutritional_match * ratio;
        self.amino_acid_match += other.amino_acid_match * ratio;
        self.growth_factor_match += other.growth_factor_match * ratio;
        self.mw_distribution_match += other.mw_distribution_match * ratio;
    }

    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        let mut entries = vec![
            ("nutritional_match", self.nutritional_match),
            ("amino_acid_match", self.amino_acid_match),
            ("growth_factor_match", self.growth_factor_match),
            ("mw_distribution_match", self.mw_distribution_match),
        ];
        if let Some(pathway) = self.pathway_match {
            entries.push(("pathway_match", pathway));
        }
        entries
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessScore {
    pub overall: f64,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, Default)]
pub struct FitnessScorer {
    config: ScoringConfig,
}

impl FitnessScorer {
    pub fn new(config: ScoringConfig) -> Result<Self, PeptoforgeError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, strain: &StrainProfile, peptone: &PeptoneProduct) -> FitnessScore {
        let profile = &peptone.profile;
        let breakdown = ScoreBreakdown {
            nutritional_match: self.nutritional_match(strain, profile),
            amino_acid_match: self.amino_acid_match(profile),
            growth_factor_match: self.growth_factor_match(strain, profile),
            mw_distribution_match: self.mw_distribution_match(strain, profile),
            pathway_match: None,
        };
        FitnessScore {
            overall: breakdown.weighted_total(&self.config),
            breakdown,
        }
    }

    pub fn nutritional_match(&self, strain: &StrainProfile, profile: &NutritionalProfile) -> f64 {
        let tn = profile.total_nitrogen();
        let an = profile.amino_nitrogen();
        let score = match strain.nutritional_type() {
            NutritionalType::Fastidious => {
                (an / 15.0).min(1.0) * 0.6 + (tn / 80.0).min(1.0) * 0.4
            }
            NutritionalType::Minimal => {
                (tn / 60.0).min(1.0) * 0.7 + (an / 8.0).min(1.0) * 0.3
            }
            NutritionalType::Moderate | NutritionalType::Complex | NutritionalType::Variable => {
                ((tn / 70.0).min(1.0) + (an / 12.0).min(1.0)) / 2.0
            }
        };
        clamp_unit(score)
    }

    pub fn amino_acid_match(&self, profile: &NutritionalProfile) -> f64 {
        clamp_unit(
            profile.essential_aa_ratio() * 0.4 + profile.free_aa_ratio() * 0.3 + profile.bcaa_ratio() * 0.3,
        )
    }

    pub fn growth_factor_match(&self, strain: &StrainProfile, profile: &NutritionalProfile) -> f64 {
        let nucleotides = profile.nucleotide_total();
        let vitamins = profile.vitamin_total();
        let requirements = strain.key_requirements();
        let score = if requirements.contains(&"nucleotides") || requirements.contains(&"B_vitamins") {
            (nucleotides / 20.0).min(1.0) * 0.5 + (vitamins / 10.0).min(1.0) * 0.5
        } else {
            ((nucleotides + vitamins) / 30.0).min(1.0)
        };
        clamp_unit(score)
    }

    pub fn mw_distribution_match(&self, strain: &StrainProfile, profile: &NutritionalProfile) -> f64 {
        let deviation = self
            .config
            .mw_optimum(strain.category())
            .map_or(0.0, |optimum| relative_deviation(optimum, &profile.molecular_weight));
        clamp_unit(1.0 - deviation.min(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{lab_strain, peptone, strain};

    #[test]
    fn lab_nutritional_example() {
        let product = peptone("SP-75", "Soy", 75.0, 14.0);
        let score = FitnessScorer::default().nutritional_match(&lab_strain(), &product.profile);
        let expected = (14.0_f64 / 15.0) * 0.6 + (75.0 / 80.0) * 0.4;
        assert!((score - expected).abs() < 1e-12);
        assert!((score - 0.935).abs() < 1e-3);
    }

    #[test]
    fn minimal_and_moderate_rules() {
        let scorer = FitnessScorer::default();
        let product = peptone("P", "Casein", 30.0, 4.0);

        let bacillus = strain("Bacillus", "subtilis");
        let expected_minimal = 0.5 * 0.7 + 0.5 * 0.3;
        assert!((scorer.nutritional_match(&bacillus, &product.profile) - expected_minimal).abs() < 1e-12);

        let yeast = strain("Saccharomyces", "cerevisiae");
        let expected_moderate = (30.0 / 70.0 + 4.0 / 12.0) / 2.0;
        assert!((scorer.nutritional_match(&yeast, &product.profile) - expected_moderate).abs() < 1e-12);
    }

    #[test]
    fn overall_is_weighted_sum_within_unit_interval() {
        let scorer = FitnessScorer::default();
        for product in [
            peptone("A", "Soy", 95.0, 18.0),
            peptone("B", "Yeast", 10.0, 1.0),
            peptone("C", "Casein", 0.0, 0.0),
        ] {
            for target in [lab_strain(), strain("Bacillus", "subtilis"), strain("Unknown", "sp.")] {
                let score = scorer.score(&target, &product);
                let b = score.breakdown;
                let expected = b.nutritional_match * 0.40
                    + b.amino_acid_match * 0.25
                    + b.growth_factor_match * 0.20
                    + b.mw_distribution_match * 0.15;
                assert!((score.overall - expected).abs() < 1e-12);
                assert!((0.0..=1.0).contains(&score.overall));
                assert!(b.pathway_match.is_none());
            }
        }
    }

    #[test]
    fn scoring_is_bit_identical_on_repeat() {
        let scorer = FitnessScorer::default();
        let product = peptone("A", "Soy", 81.3, 12.7);
        let first = scorer.score(&lab_strain(), &product);
        let second = scorer.score(&lab_strain(), &product);
        assert_eq!(first.overall.to_bits(), second.overall.to_bits());
        assert_eq!(first.breakdown, second.breakdown);
    }

    #[test]
    fn growth_factor_branches_on_key_requirements() {
        let scorer = FitnessScorer::default();
        let mut product = peptone("A", "Yeast", 70.0, 10.0);
        product.profile.nucleotides = [("AMP".to_string(), 10.0)].into_iter().collect();
        product.profile.vitamins = [("B1".to_string(), 5.0)].into_iter().collect();

        // LAB lists nucleotides and B vitamins as key requirements.
        assert!((scorer.growth_factor_match(&lab_strain(), &product.profile) - 0.5).abs() < 1e-12);
        // Yeast only lists generic vitamins, so the combined normalization applies.
        let yeast = strain("Pichia", "pastoris");
        assert!((scorer.growth_factor_match(&yeast, &product.profile) - 0.5).abs() < 1e-12);

        product.profile.nucleotides.insert("GMP".to_string(), 30.0);
        assert!((scorer.growth_factor_match(&lab_strain(), &product.profile) - 0.75).abs() < 1e-12);
        assert!((scorer.growth_factor_match(&yeast, &product.profile) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn molecular_weight_deviation() {
        let scorer = FitnessScorer::default();
        let mut product = peptone("A", "Soy", 70.0, 10.0);
        product.profile.molecular_weight = [
            ("lt250Da".to_string(), 0.25),
            ("250_500Da".to_string(), 0.30),
            ("gt1000Da".to_string(), 0.20),
        ]
        .into_iter()
        .collect();
        assert!((scorer.mw_distribution_match(&lab_strain(), &product.profile) - 1.0).abs() < 1e-12);

        // Missing bands count as zero: deviation of 1 on each LAB band.
        product.profile.molecular_weight.clear();
        assert_eq!(scorer.mw_distribution_match(&lab_strain(), &product.profile), 0.0);
    }

    #[test]
    fn relative_deviation_handles_zero_targets() {
        let target: Composition = [("a".to_string(), 0.0), ("b".to_string(), 0.5)].into_iter().collect();
        let actual: Composition = [("a".to_string(), 0.2), ("b".to_string(), 0.25)].into_iter().collect();
        assert!((relative_deviation(&target, &actual) - (0.2 + 0.5) / 2.0).abs() < 1e-12);
        assert_eq!(relative_deviation(&Composition::new(), &actual), 0.0);
    }

    #[test]
    fn clamp_unit_handles_nan_and_excursions() {
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_unit(1.15), 1.0);
        assert_eq!(clamp_unit(-3.0), 0.0);
        assert_eq!(clamp_unit(0.42), 0.42);
    }
}
