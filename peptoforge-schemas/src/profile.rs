//! Defines the measured composition of a peptone product.
//! A profile is partitioned into nine categories of named, non-negative
//! measurements, plus a handful of derived amino-acid ratios.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The nine amino acids an organism cannot synthesise itself.
pub const ESSENTIAL_AMINO_ACIDS: [&str; 9] = [
    "Threonine",
    "Valine",
    "Methionine",
    "Isoleucine",
    "Leucine",
    "Phenylalanine",
    "Tryptophan",
    "Lysine",
    "Histidine",
];

/// Branched-chain amino acids.
pub const BRANCHED_CHAIN_AMINO_ACIDS: [&str; 3] = ["Valine", "Leucine", "Isoleucine"];

/// Molecular-weight bands stored as fractions of the total in `[0, 1]`.
pub const MW_FRACTION_BANDS: [&str; 5] =
    ["lt250Da", "250_500Da", "500_750Da", "750_1000Da", "gt1000Da"];

pub const TOTAL_NITROGEN: &str = "TN";
pub const AMINO_NITROGEN: &str = "AN";

/// A single category of measurements: component name to measured amount.
pub type Composition = BTreeMap<String, f64>;

/// Enumerates the measurement categories a profile is partitioned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileCategory {
    General,
    Sugars,
    Minerals,
    Nucleotides,
    OrganicAcids,
    Vitamins,
    MolecularWeight,
    TotalAminoAcids,
    FreeAminoAcids,
}

impl ProfileCategory {
    pub const ALL: [ProfileCategory; 9] = [
        ProfileCategory::General,
        ProfileCategory::Sugars,
        ProfileCategory::Minerals,
        ProfileCategory::Nucleotides,
        ProfileCategory::OrganicAcids,
        ProfileCategory::Vitamins,
        ProfileCategory::MolecularWeight,
        ProfileCategory::TotalAminoAcids,
        ProfileCategory::FreeAminoAcids,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileCategory::General => "general",
            ProfileCategory::Sugars => "sugars",
            ProfileCategory::Minerals => "minerals",
            ProfileCategory::Nucleotides => "nucleotides",
            ProfileCategory::OrganicAcids => "organic_acids",
            ProfileCategory::Vitamins => "vitamins",
            ProfileCategory::MolecularWeight => "molecular_weight",
            ProfileCategory::TotalAminoAcids => "total_amino_acids",
            ProfileCategory::FreeAminoAcids => "free_amino_acids",
        }
    }
}

/// The nutritional composition of one peptone product.
///
/// Profiles are built once by the data-loading boundary and treated as
/// immutable afterwards. Every value is expected to be non-negative and the
/// molecular-weight bands are fractions, i.e. percentages already divided by 100.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionalProfile {
    pub general: Composition,
    pub sugars: Composition,
    pub minerals: Composition,
    pub nucleotides: Composition,
    pub organic_acids: Composition,
    pub vitamins: Composition,
    pub molecular_weight: Composition,
    pub total_amino_acids: Composition,
    pub free_amino_acids: Composition,
}

impl NutritionalProfile {
    pub fn category(&self, category: ProfileCategory) -> &Composition {
        match category {
            ProfileCategory::General => &self.general,
            ProfileCategory::Sugars => &self.sugars,
            ProfileCategory::Minerals => &self.minerals,
            ProfileCategory::Nucleotides => &self.nucleotides,
            ProfileCategory::OrganicAcids => &self.organic_acids,
            ProfileCategory::Vitamins => &self.vitamins,
            ProfileCategory::MolecularWeight => &self.molecular_weight,
            ProfileCategory::TotalAminoAcids => &self.total_amino_acids,
            ProfileCategory::FreeAminoAcids => &self.free_amino_acids,
        }
    }

    pub fn category_mut(&mut self, category: ProfileCategory) -> &mut Composition {
        match category {
            ProfileCategory::General => &mut self.general,
            ProfileCategory::Sugars => &mut self.sugars,
            ProfileCategory::Minerals => &mut self.minerals,
            ProfileCategory::Nucleotides => &mut self.nucleotides,
            ProfileCategory::OrganicAcids => &mut self.organic_acids,
            ProfileCategory::Vitamins => &mut self.vitamins,
            ProfileCategory::MolecularWeight => &mut self.molecular_weight,
            ProfileCategory::TotalAminoAcids => &mut self.total_amino_acids,
            ProfileCategory::FreeAminoAcids => &mut self.free_amino_acids,
        }
    }

    /// Looks up a value in a category, treating absent components as zero.
    pub fn value(&self, category: ProfileCategory, key: &str) -> f64 {
        self.category(category).get(key).copied().unwrap_or(0.0)
    }

    pub fn total_nitrogen(&self) -> f64 {
        self.value(ProfileCategory::General, TOTAL_NITROGEN)
    }

    pub fn amino_nitrogen(&self) -> f64 {
        self.value(ProfileCategory::General, AMINO_NITROGEN)
    }

    pub fn nucleotide_total(&self) -> f64 {
        self.nucleotides.values().sum()
    }

    pub fn vitamin_total(&self) -> f64 {
        self.vitamins.values().sum()
    }

    pub fn total_amino_acid_sum(&self) -> f64 {
        self.total_amino_acids.values().sum()
    }

    /// Share of essential amino acids in the total amino-acid content.
    pub fn essential_aa_ratio(&self) -> f64 {
        let essential = ESSENTIAL_AMINO_ACIDS
            .iter()
            .map(|aa| self.value(ProfileCategory::TotalAminoAcids, aa))
            .sum();
        self.ratio_to_total_amino_acids(essential)
    }

    /// Share of branched-chain amino acids in the total amino-acid content.
    pub fn bcaa_ratio(&self) -> f64 {
        let bcaa = BRANCHED_CHAIN_AMINO_ACIDS
            .iter()
            .map(|aa| self.value(ProfileCategory::TotalAminoAcids, aa))
            .sum();
        self.ratio_to_total_amino_acids(bcaa)
    }

    /// Free amino acids relative to the total amino-acid content.
    pub fn free_aa_ratio(&self) -> f64 {
        let free = self.free_amino_acids.values().sum();
        self.ratio_to_total_amino_acids(free)
    }

    // An empty amino-acid panel divides by one, so 0/0 reads as 0.
    fn ratio_to_total_amino_acids(&self, subset: f64) -> f64 {
        let total = self.total_amino_acid_sum();
        if total == 0.0 {
            subset
        } else {
            subset / total
        }
    }

    /// Mixes several profiles linearly by ratio, category by category.
    ///
    /// Each category is blended over the union of the component keys; a key
    /// missing from one component contributes zero for that component.
    pub fn blend(components: &[(&NutritionalProfile, f64)]) -> NutritionalProfile {
        let mut blended = NutritionalProfile::default();
        for category in ProfileCategory::ALL {
            let target = blended.category_mut(category);
            for (profile, ratio) in components {
                for (key, value) in profile.category(category) {
                    *target.entry(key.clone()).or_insert(0.0) += value * ratio;
                }
            }
        }
        blended
    }

    /// Iterates every measurement as `(category, key, value)`.
    pub fn measurements(&self) -> impl Iterator<Item = (ProfileCategory, &str, f64)> + '_ {
        ProfileCategory::ALL.into_iter().flat_map(move |category| {
            self.category(category)
                .iter()
                .map(move |(key, value)| (category, key.as_str(), *value))
        })
    }
}
