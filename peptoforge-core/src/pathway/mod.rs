//! Pathway-aware score adjustment.
//!
//! Requirement levels come from an external pathway lookup. They are folded
//! into scores as a bounded multiplicative bonus; when no data is available the
//! scores pass through unchanged.

pub mod cache;
pub mod inference;

use crate::{error::PeptoforgeError, scoring::clamp_unit};
use peptoforge_schemas::{
    peptone::PeptoneProduct,
    profile::ProfileCategory,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Amino acids whose supply is checked against pathway requirements.
pub const BONUS_AMINO_ACIDS: [&str; 4] = ["Threonine", "Methionine", "Lysine", "Tryptophan"];
pub const VITAMIN: &str = "vitamin";
pub const NUCLEOTIDE: &str = "nucleotide";
const REQUIREMENT_SUFFIX: &str = "_requirement";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementLevel {
    High,
    Medium,
    Low,
}

impl FromStr for RequirementLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(RequirementLevel::High),
            "medium" => Ok(RequirementLevel::Medium),
            "low" => Ok(RequirementLevel::Low),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for RequirementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RequirementLevel::High => "high",
            RequirementLevel::Medium => "medium",
            RequirementLevel::Low => "low",
        };
        f.write_str(label)
    }
}

/// Nutrient name (`Lysine`, `vitamin`, `nucleotide`, ...) to requirement level.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathwayRequirements {
    levels: BTreeMap<String, RequirementLevel>,
}

impl PathwayRequirements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the lookup service's `"<Nutrient>_requirement" -> "high|medium|low"` map.
    ///
    /// Keys without the `_requirement` suffix are ignored; an unknown level is
    /// a domain error.
    pub fn from_raw<'a, I>(raw: I) -> Result<Self, PeptoforgeError>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut requirements = Self::new();
        for (key, level) in raw {
            let Some(nutrient) = key.strip_suffix(REQUIREMENT_SUFFIX) else {
                continue;
            };
            let level = level
                .parse::<RequirementLevel>()
                .map_err(|level| PeptoforgeError::InvalidRequirementLevel { key: key.clone(), level })?;
            requirements.insert(nutrient, level);
        }
        Ok(requirements)
    }

    pub fn insert(&mut self, nutrient: impl Into<String>, level: RequirementLevel) {
        self.levels.insert(nutrient.into(), level);
    }

    pub fn level(&self, nutrient: &str) -> Option<RequirementLevel> {
        self.levels.get(nutrient).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, RequirementLevel)> {
        self.levels.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn high_requirements(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, level)| *level == RequirementLevel::High)
            .map(|(nutrient, _)| nutrient)
    }
}

/// Converts requirement levels into a score uplift of at most `max_uplift`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathwayBonus {
    pub max_uplift: f64,
}

impl Default for PathwayBonus {
    fn default() -> Self {
        Self { max_uplift: 0.15 }
    }
}

impl PathwayBonus {
    /// Mean partial credit, in `[0, 1]`, over every requirement checked.
    pub fn bonus(&self, peptone: &PeptoneProduct, requirements: &PathwayRequirements) -> f64 {
        let profile = &peptone.profile;
        let mut credit = 0.0;
        let mut checked = 0usize;

        for amino_acid in BONUS_AMINO_ACIDS {
            let Some(level) = requirements.level(amino_acid) else {
                continue;
            };
            let free = profile.value(ProfileCategory::FreeAminoAcids, amino_acid);
            let total = profile.value(ProfileCategory::TotalAminoAcids, amino_acid);
            credit += amino_acid_credit(level, free, total);
            checked += 1;
        }

        if let Some(level) = requirements.level(VITAMIN) {
            let vitamins = profile.vitamin_total();
            credit += match level {
                RequirementLevel::High if vitamins > 5.0 => 1.0,
                RequirementLevel::Medium if vitamins > 2.0 => 0.5,
                _ => 0.0,
            };
            checked += 1;
        }

        if checked == 0 {
            0.0
        } else {
            credit / checked as f64
        }
    }

    /// Ratio-weighted bonus of a blend.
    pub fn blend_bonus(&self, peptones: &[&PeptoneProduct], ratios: &[f64], requirements: &PathwayRequirements) -> f64 {
        peptones
            .iter()
            .zip(ratios)
            .map(|(peptone, ratio)| self.bonus(peptone, requirements) * ratio)
            .sum()
    }

    pub fn apply(&self, score: f64, bonus: f64) -> f64 {
        clamp_unit(score * (1.0 + bonus * self.max_uplift))
    }
}

fn amino_acid_credit(level: RequirementLevel, free: f64, total: f64) -> f64 {
    match level {
        RequirementLevel::High if free > 0.5 || total > 2.0 => 1.0,
        RequirementLevel::High if free > 0.2 || total > 1.0 => 0.5,
        RequirementLevel::Medium if free > 0.2 || total > 1.0 => 0.7,
        RequirementLevel::Medium if free > 0.1 || total > 0.5 => 0.3,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{composition, peptone};

    fn raw(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn parses_lookup_keys() {
        let requirements = PathwayRequirements::from_raw(&raw(&[
            ("Lysine_requirement", "high"),
            ("vitamin_requirement", "Medium"),
            ("organism_code", "lpl"),
        ]))
        .unwrap();
        assert_eq!(requirements.len(), 2);
        assert_eq!(requirements.level("Lysine"), Some(RequirementLevel::High));
        assert_eq!(requirements.level(VITAMIN), Some(RequirementLevel::Medium));
    }

    #[test]
    fn rejects_unknown_levels() {
        let err = PathwayRequirements::from_raw(&raw(&[("Lysine_requirement", "extreme")])).unwrap_err();
        assert!(matches!(err, PeptoforgeError::InvalidRequirementLevel { .. }));
    }

    #[test]
    fn partial_credit_bands() {
        assert_eq!(amino_acid_credit(RequirementLevel::High, 0.6, 0.0), 1.0);
        assert_eq!(amino_acid_credit(RequirementLevel::High, 0.3, 0.0), 0.5);
        assert_eq!(amino_acid_credit(RequirementLevel::High, 0.0, 0.9), 0.0);
        assert_eq!(amino_acid_credit(RequirementLevel::Medium, 0.0, 1.5), 0.7);
        assert_eq!(amino_acid_credit(RequirementLevel::Medium, 0.15, 0.0), 0.3);
        assert_eq!(amino_acid_credit(RequirementLevel::Low, 9.0, 9.0), 0.0);
    }

    #[test]
    fn bonus_is_mean_over_checked_requirements() {
        let mut product = peptone("A", "Soy", 80.0, 10.0);
        product.profile.vitamins = composition(&[("B1", 6.0)]);

        let mut requirements = PathwayRequirements::new();
        // Lysine total 5.0 clears the high band, vitamins 6.0 clear the high band,
        // Tryptophan total 1.0 misses the medium band edge, Threonine is low.
        requirements.insert("Lysine", RequirementLevel::High);
        requirements.insert(VITAMIN, RequirementLevel::High);
        requirements.insert("Tryptophan", RequirementLevel::Medium);
        requirements.insert("Threonine", RequirementLevel::Low);
        requirements.insert(NUCLEOTIDE, RequirementLevel::High);

        let bonus = PathwayBonus::default().bonus(&product, &requirements);
        assert!((bonus - (1.0 + 1.0 + 0.3 + 0.0) / 4.0).abs() < 1e-12);
    }

    #[test]
    fn no_requirements_is_a_no_op() {
        let product = peptone("A", "Soy", 80.0, 10.0);
        let adapter = PathwayBonus::default();
        let bonus = adapter.bonus(&product, &PathwayRequirements::new());
        assert_eq!(bonus, 0.0);
        assert_eq!(adapter.apply(0.61, bonus), 0.61);
    }

    #[test]
    fn uplift_is_capped_at_fifteen_percent() {
        let adapter = PathwayBonus::default();
        assert!((adapter.apply(0.5, 1.0) - 0.575).abs() < 1e-12);
        assert_eq!(adapter.apply(0.95, 1.0), 1.0);
    }
}
