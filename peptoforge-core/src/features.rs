use peptoforge_schemas::{peptone::PeptoneProduct, profile::NutritionalProfile};
use serde::{Deserialize, Serialize};

pub const FEATURE_COUNT: usize = 7;

/// The normalized seven-dimensional view of a profile used for
/// complementarity search and target matching.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureVector {
    pub total_nitrogen: f64,
    pub amino_nitrogen: f64,
    pub essential_aa: f64,
    pub free_aa: f64,
    pub bcaa: f64,
    pub nucleotides: f64,
    pub vitamins: f64,
}

impl FeatureVector {
    pub const NAMES: [&'static str; FEATURE_COUNT] = [
        "total_nitrogen",
        "amino_nitrogen",
        "essential_aa",
        "free_aa",
        "bcaa",
        "nucleotides",
        "vitamins",
    ];

    pub fn from_profile(profile: &NutritionalProfile) -> Self {
        Self {
            total_nitrogen: profile.total_nitrogen() / 100.0,
            amino_nitrogen: profile.amino_nitrogen() / 20.0,
            essential_aa: profile.essential_aa_ratio(),
            free_aa: profile.free_aa_ratio(),
            bcaa: profile.bcaa_ratio(),
            nucleotides: profile.nucleotide_total() / 30.0,
            vitamins: profile.vitamin_total() / 15.0,
        }
    }

    pub fn from_peptone(peptone: &PeptoneProduct) -> Self {
        Self::from_profile(&peptone.profile)
    }

    /// Uniform weights for target matching.
    pub fn ones() -> Self {
        Self::from_array([1.0; FEATURE_COUNT])
    }

    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.total_nitrogen,
            self.amino_nitrogen,
            self.essential_aa,
            self.free_aa,
            self.bcaa,
            self.nucleotides,
            self.vitamins,
        ]
    }

    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        let [total_nitrogen, amino_nitrogen, essential_aa, free_aa, bcaa, nucleotides, vitamins] = values;
        Self {
            total_nitrogen,
            amino_nitrogen,
            essential_aa,
            free_aa,
            bcaa,
            nucleotides,
            vitamins,
        }
    }

    pub fn distance(&self, other: &FeatureVector) -> f64 {
        euclidean(&self.to_array(), &other.to_array())
    }

    /// Ratio-weighted linear combination of several vectors.
    pub fn combine(vectors: &[FeatureVector], ratios: &[f64]) -> FeatureVector {
        let mut combined = [0.0; FEATURE_COUNT];
        for (vector, ratio) in vectors.iter().zip(ratios) {
            for (slot, value) in combined.iter_mut().zip(vector.to_array()) {
                *slot += ratio * value;
            }
        }
        FeatureVector::from_array(combined)
    }
}

/// Per-feature weights for target matching. Dimensions left out when
/// deserializing keep a weight of 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureWeights {
    pub total_nitrogen: f64,
    pub amino_nitrogen: f64,
    pub essential_aa: f64,
    pub free_aa: f64,
    pub bcaa: f64,
    pub nucleotides: f64,
    pub vitamins: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self::from(FeatureVector::ones())
    }
}

impl From<FeatureVector> for FeatureWeights {
    fn from(v: FeatureVector) -> Self {
        Self {
            total_nitrogen: v.total_nitrogen,
            amino_nitrogen: v.amino_nitrogen,
            essential_aa: v.essential_aa,
            free_aa: v.free_aa,
            bcaa: v.bcaa,
            nucleotides: v.nucleotides,
            vitamins: v.vitamins,
        }
    }
}

impl From<FeatureWeights> for FeatureVector {
    fn from(w: FeatureWeights) -> Self {
        FeatureVector::from_array([
            w.total_nitrogen,
            w.amino_nitrogen,
            w.essential_aa,
            w.free_aa,
            w.bcaa,
            w.nucleotides,
            w.vitamins,
        ])
    }
}

pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_is_ratio_weighted() {
        let a = FeatureVector::from_array([1.0, 0.0, 0.5, 0.5, 0.2, 0.0, 0.0]);
        let b = FeatureVector::from_array([0.0, 1.0, 0.5, 0.1, 0.2, 0.3, 0.6]);
        let blend = FeatureVector::combine(&[a, b], &[0.75, 0.25]);
        assert!((blend.total_nitrogen - 0.75).abs() < 1e-12);
        assert!((blend.amino_nitrogen - 0.25).abs() < 1e-12);
        assert!((blend.free_aa - 0.4).abs() < 1e-12);
        assert!((blend.vitamins - 0.15).abs() < 1e-12);
    }

    #[test]
    fn default_weights_are_uniform() {
        assert_eq!(FeatureVector::from(FeatureWeights::default()), FeatureVector::ones());
    }

    #[test]
    fn array_round_trip_keeps_field_order() {
        let vector = FeatureVector { bcaa: 0.4, vitamins: 0.9, ..Default::default() };
        assert_eq!(vector.to_array()[4], 0.4);
        assert_eq!(vector.to_array()[6], 0.9);
        assert_eq!(FeatureVector::from_array(vector.to_array()), vector);
    }
}
