//! Immutable configuration passed to the scorer and the optimizer at construction.

use crate::error::PeptoforgeError;
use peptoforge_schemas::strain::StrainCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Relative weight of each subscore in the overall fitness score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub nutritional_match: f64,
    pub amino_acid_match: f64,
    pub growth_factor_match: f64,
    pub mw_distribution_match: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            nutritional_match: 0.40,
            amino_acid_match: 0.25,
            growth_factor_match: 0.20,
            mw_distribution_match: 0.15,
        }
    }
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.nutritional_match + self.amino_acid_match + self.growth_factor_match + self.mw_distribution_match
    }
}

/// Target molecular-weight band fractions for one strain category.
pub type MwOptimum = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    pub mw_optima: BTreeMap<StrainCategory, MwOptimum>,
}

fn optimum(bands: &[(&str, f64)]) -> MwOptimum {
    bands.iter().map(|(band, fraction)| (band.to_string(), *fraction)).collect()
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let mut mw_optima = BTreeMap::new();
        // LAB prefer small peptides: at least 25% below 250 Da, at most 20% above 1000 Da.
        mw_optima.insert(
            StrainCategory::Lab,
            optimum(&[("lt250Da", 0.25), ("250_500Da", 0.30), ("gt1000Da", 0.20)]),
        );
        mw_optima.insert(
            StrainCategory::Bacillus,
            optimum(&[("lt250Da", 0.15), ("gt1000Da", 0.40)]),
        );
        mw_optima.insert(
            StrainCategory::EColi,
            optimum(&[("lt250Da", 0.20), ("250_500Da", 0.35), ("gt1000Da", 0.25)]),
        );
        mw_optima.insert(
            StrainCategory::Yeast,
            optimum(&[("lt250Da", 0.20), ("250_500Da", 0.30), ("500_750Da", 0.20), ("gt1000Da", 0.30)]),
        );
        mw_optima.insert(
            StrainCategory::Actinomycetes,
            optimum(&[("250_500Da", 0.25), ("500_750Da", 0.25), ("gt1000Da", 0.35)]),
        );
        mw_optima.insert(
            StrainCategory::Other,
            optimum(&[("250_500Da", 0.30), ("500_750Da", 0.25), ("gt1000Da", 0.30)]),
        );
        Self {
            weights: ScoringWeights::default(),
            mw_optima,
        }
    }
}

impl ScoringConfig {
    /// The optimum for a category, or the `Other` table when none is configured.
    pub fn mw_optimum(&self, category: StrainCategory) -> Option<&MwOptimum> {
        self.mw_optima
            .get(&category)
            .or_else(|| self.mw_optima.get(&StrainCategory::Other))
    }

    pub fn validate(&self) -> Result<(), PeptoforgeError> {
        let weights = [
            self.weights.nutritional_match,
            self.weights.amino_acid_match,
            self.weights.growth_factor_match,
            self.weights.mw_distribution_match,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(PeptoforgeError::ConfigError("scoring weights must be non-negative".to_string()));
        }
        if (self.weights.total() - 1.0).abs() > 1e-9 {
            return Err(PeptoforgeError::ConfigError(format!(
                "scoring weights must sum to 1.0, got {}",
                self.weights.total()
            )));
        }
        if !self.mw_optima.contains_key(&StrainCategory::Other) {
            return Err(PeptoforgeError::ConfigError(
                "a molecular-weight optimum for 'Other' is required".to_string(),
            ));
        }
        for (category, bands) in &self.mw_optima {
            if bands.values().any(|f| !(0.0..=1.0).contains(f)) {
                return Err(PeptoforgeError::ConfigError(format!(
                    "molecular-weight optimum for '{}' must hold fractions in [0, 1]",
                    category.as_str()
                )));
            }
        }
        Ok(())
    }
}

/// Bounds and solver parameters shared by every optimization call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub min_ratio: f64,
    pub max_ratio: f64,
    /// Iteration cap of the local solver.
    pub max_iterations: usize,
    /// Convergence threshold on the change of the objective between iterations.
    pub function_tolerance: f64,
    /// Population size per decision variable for differential evolution.
    pub population_size: usize,
    pub max_generations: usize,
    pub population_tolerance: f64,
    pub seed: u64,
    /// Penalty applied per unit of `|sum(ratios) - 1|` in the global solver.
    pub sum_penalty: f64,
    pub mutation: (f64, f64),
    pub recombination: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            min_ratio: 0.10,
            max_ratio: 0.80,
            max_iterations: 1000,
            function_tolerance: 1e-6,
            population_size: 15,
            max_generations: 500,
            population_tolerance: 1e-6,
            seed: 42,
            sum_penalty: 1000.0,
            mutation: (0.5, 1.0),
            recombination: 0.7,
        }
    }
}

impl OptimizerConfig {
    pub const MIN_COMPONENTS: usize = 2;
    pub const MAX_COMPONENTS: usize = 5;

    /// Checks that `components` ratios can satisfy both the box and the sum constraint.
    pub fn check_bounds(&self, components: usize) -> Result<(), PeptoforgeError> {
        let n = components as f64;
        let feasible = self.min_ratio >= 0.0
            && self.min_ratio <= self.max_ratio
            && self.max_ratio <= 1.0
            && n * self.min_ratio <= 1.0 + 1e-12
            && n * self.max_ratio >= 1.0 - 1e-12;
        if feasible {
            Ok(())
        } else {
            Err(PeptoforgeError::InvalidRatioBounds {
                min: self.min_ratio,
                max: self.max_ratio,
                components,
            })
        }
    }

    pub fn validate(&self) -> Result<(), PeptoforgeError> {
        self.check_bounds(Self::MIN_COMPONENTS)?;
        if self.max_iterations == 0 || self.max_generations == 0 || self.population_size == 0 {
            return Err(PeptoforgeError::ConfigError(
                "iteration caps and population size must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.recombination) || self.mutation.0 > self.mutation.1 {
            return Err(PeptoforgeError::ConfigError("invalid differential evolution parameters".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let config = ScoringConfig::default();
        assert!((config.weights.total() - 1.0).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_category_table_falls_back_to_other() {
        let mut config = ScoringConfig::default();
        config.mw_optima.remove(&StrainCategory::Yeast);
        assert_eq!(
            config.mw_optimum(StrainCategory::Yeast),
            config.mw_optima.get(&StrainCategory::Other)
        );
    }

    #[test]
    fn rejects_unbalanced_weights() {
        let mut config = ScoringConfig::default();
        config.weights.nutritional_match = 0.9;
        assert!(matches!(config.validate(), Err(PeptoforgeError::ConfigError(_))));
    }

    #[test]
    fn bounds_must_admit_a_feasible_blend() {
        let config = OptimizerConfig::default();
        assert!(config.check_bounds(2).is_ok());
        assert!(config.check_bounds(5).is_ok());
        // Eleven components at 10% each cannot sum to one.
        assert!(config.check_bounds(11).is_err());

        let tight = OptimizerConfig { max_ratio: 0.3, ..OptimizerConfig::default() };
        assert!(tight.check_bounds(2).is_err());
        assert!(tight.check_bounds(4).is_ok());
    }
}
