//! Scoring of multi-peptone blends.
//!
//! A blend's score interpolates the single-peptone scores by ratio and is
//! then lifted by up to 10% for complementary components. Raw compositions
//! are never mixed here; see [`crate::analysis::blend_metrics`] for that.

use crate::{
    config::OptimizerConfig,
    error::PeptoforgeError,
    features::euclidean,
    scoring::{clamp_unit, FitnessScore, FitnessScorer, ScoreBreakdown},
};
use peptoforge_schemas::{
    peptone::PeptoneProduct,
    profile::{ProfileCategory, ESSENTIAL_AMINO_ACIDS},
    strain::StrainProfile,
};
use std::collections::BTreeSet;

const MAX_SYNERGY_UPLIFT: f64 = 0.1;
const MATERIAL_DIVERSITY_WEIGHT: f64 = 0.6;
const AMINO_ACID_DIVERSITY_WEIGHT: f64 = 0.4;
const AMINO_ACID_DISTANCE_SCALE: f64 = 10.0;

#[derive(Debug, Clone, Default)]
pub struct BlendEvaluator {
    scorer: FitnessScorer,
}

impl BlendEvaluator {
    pub fn new(scorer: FitnessScorer) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &FitnessScorer {
        &self.scorer
    }

    /// Scores `peptones` mixed at `ratios` for `strain`.
    ///
    /// A single peptone at ratio 1.0 scores exactly as [`FitnessScorer::score`].
    pub fn evaluate(
        &self,
        strain: &StrainProfile,
        peptones: &[&PeptoneProduct],
        ratios: &[f64],
    ) -> Result<FitnessScore, PeptoforgeError> {
        if peptones.is_empty() || peptones.len() > OptimizerConfig::MAX_COMPONENTS {
            return Err(PeptoforgeError::InvalidBlendSize {
                got: peptones.len(),
                min: 1,
                max: OptimizerConfig::MAX_COMPONENTS,
            });
        }
        if peptones.len() != ratios.len() {
            return Err(PeptoforgeError::RatioLengthMismatch {
                peptones: peptones.len(),
                ratios: ratios.len(),
            });
        }

        let mut breakdown = ScoreBreakdown::default();
        let mut overall = 0.0;
        for (peptone, ratio) in peptones.iter().zip(ratios) {
            let single = self.scorer.score(strain, peptone);
            breakdown.accumulate(&single.breakdown, *ratio);
            overall += single.overall * ratio;
        }

        let synergy = synergy(peptones);
        Ok(FitnessScore {
            overall: clamp_unit(overall * (1.0 + synergy * MAX_SYNERGY_UPLIFT)),
            breakdown,
        })
    }
}

/// Complementarity of a blend's components in `[0, 1]`; 0 for one component.
///
/// Mixes raw-material diversity with the mean pairwise distance between the
/// components' free essential amino acid vectors.
pub fn synergy(peptones: &[&PeptoneProduct]) -> f64 {
    if peptones.len() < 2 {
        return 0.0;
    }

    let materials: BTreeSet<&str> = peptones.iter().map(|p| p.raw_material.as_str()).collect();
    let material_diversity = materials.len() as f64 / peptones.len() as f64;

    let profiles: Vec<Vec<f64>> = peptones
        .iter()
        .map(|p| {
            ESSENTIAL_AMINO_ACIDS
                .iter()
                .map(|aa| p.profile.value(ProfileCategory::FreeAminoAcids, aa))
                .collect()
        })
        .collect();

    let mut distances = Vec::new();
    for (i, a) in profiles.iter().enumerate() {
        for b in &profiles[i + 1..] {
            distances.push(euclidean(a, b));
        }
    }
    let mean_distance = distances.iter().sum::<f64>() / distances.len() as f64;
    let amino_acid_diversity = (mean_distance / AMINO_ACID_DISTANCE_SCALE).min(1.0);

    clamp_unit(material_diversity * MATERIAL_DIVERSITY_WEIGHT + amino_acid_diversity * AMINO_ACID_DIVERSITY_WEIGHT)
}
