use crate::features::{FeatureVector, FEATURE_COUNT};
use peptoforge_schemas::peptone::PeptoneProduct;
use std::cmp::Ordering;

/// Features of the base below this value are treated as weaknesses.
pub const WEAK_FEATURE_THRESHOLD: f64 = 0.3;
const DIVERSITY_WEIGHT: f64 = 0.6;
const COVERAGE_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, Copy)]
pub struct Complement<'a> {
    pub peptone: &'a PeptoneProduct,
    pub score: f64,
    pub diversity: f64,
    pub coverage: f64,
}

/// Ranks blend partners for `base` by how different they are and how well
/// they cover the base's weak features.
///
/// Candidates sharing the base's name are skipped. The ranking is stable:
/// equal scores keep their input order.
pub fn select_complements<'a, I>(base: &PeptoneProduct, candidates: I, top_n: usize) -> Vec<Complement<'a>>
where
    I: IntoIterator<Item = &'a PeptoneProduct>,
{
    let base_features = FeatureVector::from_peptone(base).to_array();
    let weak: Vec<usize> = (0..FEATURE_COUNT)
        .filter(|&i| base_features[i] < WEAK_FEATURE_THRESHOLD)
        .collect();

    let mut ranked: Vec<Complement<'a>> = candidates
        .into_iter()
        .filter(|candidate| candidate.name != base.name)
        .map(|candidate| {
            let features = FeatureVector::from_peptone(candidate).to_array();
            let diversity = crate::features::euclidean(&base_features, &features);
            let coverage = if weak.is_empty() {
                0.0
            } else {
                weak.iter().map(|&i| features[i]).sum::<f64>() / weak.len() as f64
            };
            Complement {
                peptone: candidate,
                score: diversity * DIVERSITY_WEIGHT + coverage * COVERAGE_WEIGHT,
                diversity,
                coverage,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    ranked.truncate(top_n);
    ranked
}
