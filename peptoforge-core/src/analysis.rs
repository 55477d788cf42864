use crate::{error::PeptoforgeError, features::FeatureVector};
use peptoforge_schemas::{
    peptone::PeptoneProduct,
    profile::{NutritionalProfile, ProfileCategory},
};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BTreeMap, str::FromStr};

/// Standalone quality indicator of a product, independent of any strain.
///
/// Protein quality (AN/TN against 80% as excellent) weighs 30%, the amino
/// acid profile 40%, growth factors 20% and the share of peptides below
/// 500 Da 10%.
pub fn quality_score(profile: &NutritionalProfile) -> f64 {
    let tn = profile.total_nitrogen();
    let an = profile.amino_nitrogen();
    let an_percent = if tn > 0.0 { an / tn * 100.0 } else { 0.0 };
    let protein = (an_percent / 80.0).min(1.0);

    let amino_acids = profile.essential_aa_ratio() * 0.5 + profile.free_aa_ratio() * 0.5;
    let growth = ((profile.nucleotide_total() + profile.vitamin_total()) / 50.0).min(1.0);
    let small_peptides = profile.value(ProfileCategory::MolecularWeight, "lt250Da")
        + profile.value(ProfileCategory::MolecularWeight, "250_500Da");

    protein * 0.3 + amino_acids * 0.4 + growth * 0.2 + small_peptides * 0.1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMethod {
    #[default]
    Cosine,
    Euclidean,
}

impl FromStr for SimilarityMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cosine" => Ok(SimilarityMethod::Cosine),
            "euclidean" => Ok(SimilarityMethod::Euclidean),
            other => Err(format!("unknown similarity method: {other}")),
        }
    }
}

/// Aligns two profiles on the union of their `(category, key)` measurements.
fn aligned_vectors(a: &NutritionalProfile, b: &NutritionalProfile) -> (Vec<f64>, Vec<f64>) {
    let mut slots: BTreeMap<(ProfileCategory, &str), (f64, f64)> = BTreeMap::new();
    for (category, key, value) in a.measurements() {
        slots.entry((category, key)).or_default().0 = value;
    }
    for (category, key, value) in b.measurements() {
        slots.entry((category, key)).or_default().1 = value;
    }
    slots.into_values().unzip()
}

/// Similarity of two complete profiles; higher means more alike.
///
/// Cosine similarity is 0 when either profile is empty. Euclidean similarity
/// is `1 / (1 + distance)`.
pub fn profile_similarity(a: &NutritionalProfile, b: &NutritionalProfile, method: SimilarityMethod) -> f64 {
    let (va, vb) = aligned_vectors(a, b);
    match method {
        SimilarityMethod::Cosine => {
            let dot: f64 = va.iter().zip(&vb).map(|(x, y)| x * y).sum();
            let norm_a = va.iter().map(|x| x * x).sum::<f64>().sqrt();
            let norm_b = vb.iter().map(|x| x * x).sum::<f64>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                0.0
            } else {
                dot / (norm_a * norm_b)
            }
        }
        SimilarityMethod::Euclidean => 1.0 / (1.0 + crate::features::euclidean(&va, &vb)),
    }
}

/// The `top_n` candidates most similar to `reference`, excluding products
/// with the reference's name. Ties keep their input order.
pub fn find_similar<'a, I>(
    reference: &PeptoneProduct,
    candidates: I,
    top_n: usize,
    method: SimilarityMethod,
) -> Vec<(&'a PeptoneProduct, f64)>
where
    I: IntoIterator<Item = &'a PeptoneProduct>,
{
    let mut ranked: Vec<(&PeptoneProduct, f64)> = candidates
        .into_iter()
        .filter(|candidate| candidate.name != reference.name)
        .map(|candidate| (candidate, profile_similarity(&reference.profile, &candidate.profile, method)))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked.truncate(top_n);
    ranked
}

/// Composition-level view of a blend, for reporting next to its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendMetrics {
    /// `quality_score` of the blended composition.
    pub quality_score: f64,
    pub total_nitrogen: f64,
    pub amino_nitrogen: f64,
    pub essential_aa_ratio: f64,
    pub free_aa_ratio: f64,
    pub bcaa_ratio: f64,
    pub nucleotide_total: f64,
    pub vitamin_total: f64,
    /// Euclidean distance of the blended feature vector from a target, when one is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_deviation: Option<f64>,
}

pub fn blend_metrics(
    peptones: &[&PeptoneProduct],
    ratios: &[f64],
    target: Option<&FeatureVector>,
) -> Result<BlendMetrics, PeptoforgeError> {
    if peptones.len() != ratios.len() {
        return Err(PeptoforgeError::RatioLengthMismatch {
            peptones: peptones.len(),
            ratios: ratios.len(),
        });
    }
    let components: Vec<(&NutritionalProfile, f64)> =
        peptones.iter().zip(ratios).map(|(p, r)| (&p.profile, *r)).collect();
    let blended = NutritionalProfile::blend(&components);

    Ok(BlendMetrics {
        quality_score: quality_score(&blended),
        total_nitrogen: blended.total_nitrogen(),
        amino_nitrogen: blended.amino_nitrogen(),
        essential_aa_ratio: blended.essential_aa_ratio(),
        free_aa_ratio: blended.free_aa_ratio(),
        bcaa_ratio: blended.bcaa_ratio(),
        nucleotide_total: blended.nucleotide_total(),
        vitamin_total: blended.vitamin_total(),
        target_deviation: target.map(|t| FeatureVector::from_profile(&blended).distance(t)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{composition, peptone};

    #[test]
    fn quality_score_components() {
        let profile = NutritionalProfile {
            general: composition(&[("TN", 10.0), ("AN", 4.0)]),
            nucleotides: composition(&[("AMP", 25.0)]),
            molecular_weight: composition(&[("lt250Da", 0.4), ("250_500Da", 0.2)]),
            ..Default::default()
        };
        // 40% AN/TN -> 0.5 protein; no amino acid panel; 25/50 growth.
        let expected = 0.5 * 0.3 + 0.0 + 0.5 * 0.2 + 0.6 * 0.1;
        assert!((quality_score(&profile) - expected).abs() < 1e-12);
        assert_eq!(quality_score(&NutritionalProfile::default()), 0.0);
    }

    #[test]
    fn identical_profiles_are_maximally_similar() {
        let a = peptone("A", "Soy", 80.0, 10.0);
        assert!((profile_similarity(&a.profile, &a.profile, SimilarityMethod::Cosine) - 1.0).abs() < 1e-12);
        assert_eq!(profile_similarity(&a.profile, &a.profile, SimilarityMethod::Euclidean), 1.0);
        assert_eq!(
            profile_similarity(&a.profile, &NutritionalProfile::default(), SimilarityMethod::Cosine),
            0.0
        );
    }

    #[test]
    fn disjoint_keys_are_orthogonal() {
        let a = NutritionalProfile { sugars: composition(&[("Glucose", 3.0)]), ..Default::default() };
        let b = NutritionalProfile { minerals: composition(&[("Na", 4.0)]), ..Default::default() };
        assert_eq!(profile_similarity(&a, &b, SimilarityMethod::Cosine), 0.0);
        assert!((profile_similarity(&a, &b, SimilarityMethod::Euclidean) - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn find_similar_ranks_closest_first() {
        let reference = peptone("Ref", "Soy", 80.0, 10.0);
        let candidates = vec![
            peptone("Ref", "Soy", 80.0, 10.0),
            peptone("Far", "Casein", 10.0, 1.0),
            peptone("Near", "Soy", 79.0, 10.0),
        ];
        let similar = find_similar(&reference, &candidates, 5, SimilarityMethod::Euclidean);
        let names: Vec<&str> = similar.iter().map(|(p, _)| p.name.as_str()).collect();
        assert_eq!(names, vec!["Near", "Far"]);
    }

    #[test]
    fn blend_metrics_mix_raw_compositions() {
        let a = peptone("A", "Soy", 80.0, 10.0);
        let b = peptone("B", "Yeast", 40.0, 6.0);
        let metrics = blend_metrics(&[&a, &b], &[0.5, 0.5], None).unwrap();
        assert!((metrics.total_nitrogen - 60.0).abs() < 1e-12);
        assert!((metrics.amino_nitrogen - 8.0).abs() < 1e-12);
        assert!(metrics.target_deviation.is_none());

        let target = FeatureVector::from_peptone(&a);
        let metrics = blend_metrics(&[&a, &b], &[1.0, 0.0], Some(&target)).unwrap();
        assert!(metrics.target_deviation.unwrap() < 1e-12);

        assert!(blend_metrics(&[&a], &[0.5, 0.5], None).is_err());
    }
}
