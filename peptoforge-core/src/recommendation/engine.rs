use crate::{
    analysis::{blend_metrics, find_similar, SimilarityMethod},
    blend::BlendEvaluator,
    complementarity::{select_complements, Complement},
    config::OptimizerConfig,
    error::PeptoforgeError,
    features::FeatureVector,
    optimizer::{BlendOptimizationOutcome, BlendOptimizer, Solver},
    pathway::{cache::RequirementSource, PathwayBonus, PathwayRequirements},
    recommendation::{
        builder::RecommenderBuilder,
        catalogue::Catalogue,
        result::{rationale, FitnessResult},
    },
    scoring::FitnessScore,
};
use peptoforge_schemas::{peptone::PeptoneProduct, strain::StrainProfile};
use rayon::prelude::*;
use std::{cmp::Ordering, sync::Arc};
use tracing::{debug, info, warn};

/// Singles considered when building grid blends.
const GRID_BASE_COUNT: usize = 5;
/// Of those, the singles combined into three-component grid blends.
const GRID_TRIPLE_POOL: usize = 4;
const PAIR_GRID: [f64; 5] = [0.3, 0.4, 0.5, 0.6, 0.7];
const TRIPLE_FIRST_GRID: [f64; 4] = [0.2, 0.3, 0.4, 0.5];
const TRIPLE_SECOND_GRID: [f64; 3] = [0.2, 0.3, 0.4];
const FALLBACK_PAIR_GRID: [f64; 4] = [0.4, 0.5, 0.6, 0.7];
const OPTIMIZED_BASE_COUNT: usize = 3;
const MAX_OPTIMIZED_SINGLES: usize = 6;
const MAX_PARTNERS: usize = 3;
/// Grid ratios this close to a bound are moved onto it.
const RATIO_SNAP: f64 = 1e-9;
const RATIO_SUM_TOLERANCE: f64 = 1e-6;

pub struct Recommender {
    pub(super) catalogue: Catalogue,
    pub(super) evaluator: BlendEvaluator,
    pub(super) optimizer: BlendOptimizer,
    pub(super) pathway_bonus: PathwayBonus,
    pub(super) requirements: Option<Arc<dyn RequirementSource>>,
    pub(super) reference_only: bool,
    pub(super) use_optimizer: bool,
    pub(super) solver: Solver,
}

impl Recommender {
    pub fn builder() -> RecommenderBuilder {
        RecommenderBuilder::new()
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn evaluator(&self) -> &BlendEvaluator {
        &self.evaluator
    }

    pub fn optimizer(&self) -> &BlendOptimizer {
        &self.optimizer
    }

    /// Requirement levels for `strain`, if a source is configured and has data.
    ///
    /// Strains under non-disclosure are never looked up. Lookup failures are
    /// logged and treated as missing data.
    pub fn requirements_for(&self, strain: &StrainProfile) -> Option<PathwayRequirements> {
        let source = self.requirements.as_ref()?;
        if strain.is_nda() {
            debug!(strain = %strain.strain_id, "skipping pathway lookup for NDA strain");
            return None;
        }
        match source.fetch(strain) {
            Ok(Some(requirements)) if !requirements.is_empty() => Some(requirements),
            Ok(_) => None,
            Err(err) => {
                warn!(strain = %strain.full_name(), error = %err, "scoring without pathway requirements");
                None
            }
        }
    }

    /// Blend score with the pathway bonus folded in when `requirements` is given.
    pub fn score_blend(
        &self,
        strain: &StrainProfile,
        peptones: &[&PeptoneProduct],
        ratios: &[f64],
        requirements: Option<&PathwayRequirements>,
    ) -> Result<FitnessScore, PeptoforgeError> {
        let mut score = self.evaluator.evaluate(strain, peptones, ratios)?;
        if let Some(requirements) = requirements.filter(|r| !r.is_empty()) {
            let bonus = self.pathway_bonus.blend_bonus(peptones, ratios, requirements);
            score.overall = self.pathway_bonus.apply(score.overall, bonus);
            score.breakdown.pathway_match = Some(bonus);
        }
        Ok(score)
    }

    /// Scores an explicit single peptone or blend.
    pub fn evaluate(&self, strain_id: &str, peptone_names: &[&str], ratios: &[f64]) -> Result<FitnessResult, PeptoforgeError> {
        let strain = self.catalogue.strain(strain_id)?;
        let peptones = self.resolve(peptone_names)?;
        if peptones.len() == ratios.len() {
            self.check_ratios(ratios)?;
        }
        let requirements = self.requirements_for(strain);
        self.result(strain, &peptones, ratios.to_vec(), requirements.as_ref())
    }

    /// Every candidate scored on its own, best first.
    pub fn recommend_single(&self, strain_id: &str, top_n: usize) -> Result<Vec<FitnessResult>, PeptoforgeError> {
        let strain = self.catalogue.strain(strain_id)?;
        let requirements = self.requirements_for(strain);
        let results = self.rank_singles(strain, requirements.as_ref(), top_n)?;
        info!(strain = %strain.full_name(), results = results.len(), "single recommendations ranked");
        Ok(results)
    }

    /// Blends of the best singles evaluated on fixed ratio grids.
    pub fn recommend_blend(
        &self,
        strain_id: &str,
        max_components: usize,
        top_n: usize,
    ) -> Result<Vec<FitnessResult>, PeptoforgeError> {
        check_max_components(max_components)?;
        let strain = self.catalogue.strain(strain_id)?;
        let requirements = self.requirements_for(strain);
        let singles = self.rank_singles(strain, requirements.as_ref(), GRID_BASE_COUNT)?;
        let top: Vec<&PeptoneProduct> = singles.iter().map(|r| &r.peptones[0]).collect();

        let mut candidates: Vec<(Vec<&PeptoneProduct>, Vec<f64>)> = Vec::new();
        for (i, first) in top.iter().enumerate() {
            for second in &top[i + 1..] {
                for r1 in PAIR_GRID {
                    if let Some(ratios) = self.feasible(&[r1, 1.0 - r1]) {
                        candidates.push((vec![*first, *second], ratios));
                    }
                }
            }
        }

        if max_components >= 3 {
            let pool = &top[..top.len().min(GRID_TRIPLE_POOL)];
            for (i, first) in pool.iter().enumerate() {
                for (j, second) in pool.iter().enumerate().skip(i + 1) {
                    for third in &pool[j + 1..] {
                        for r1 in TRIPLE_FIRST_GRID {
                            for r2 in TRIPLE_SECOND_GRID {
                                if let Some(ratios) = self.feasible(&[r1, r2, 1.0 - r1 - r2]) {
                                    candidates.push((vec![*first, *second, *third], ratios));
                                }
                            }
                        }
                    }
                }
            }
        }

        let reqs = requirements.as_ref();
        let mut results = candidates
            .par_iter()
            .map(|(peptones, ratios)| self.result(strain, peptones, ratios.clone(), reqs))
            .collect::<Result<Vec<_>, _>>()?;
        sort_descending(&mut results);
        results.truncate(top_n);
        info!(
            strain = %strain.full_name(),
            evaluated = candidates.len(),
            results = results.len(),
            "grid blends ranked"
        );
        Ok(results)
    }

    /// Blends of the best singles and their complements, with ratios
    /// optimized for the strain.
    ///
    /// Optimizations that fail to converge are discarded; a failed pair is
    /// evaluated on a fixed ratio grid instead.
    pub fn recommend_optimized_blend(
        &self,
        strain_id: &str,
        max_components: usize,
        top_n: usize,
    ) -> Result<Vec<FitnessResult>, PeptoforgeError> {
        check_max_components(max_components)?;
        let strain = self.catalogue.strain(strain_id)?;
        let requirements = self.requirements_for(strain);
        let singles = self.rank_singles(strain, requirements.as_ref(), MAX_OPTIMIZED_SINGLES.min(top_n + 1))?;
        let top: Vec<&PeptoneProduct> = singles.iter().map(|r| &r.peptones[0]).collect();
        let partners = MAX_PARTNERS.min(max_components - 1);

        let mut groups: Vec<Vec<&PeptoneProduct>> = Vec::new();
        for base in top.iter().take(OPTIMIZED_BASE_COUNT) {
            let others = top.iter().copied().filter(|p| p.name != base.name);
            let complements = select_complements(base, others, partners);
            for complement in &complements {
                groups.push(vec![*base, complement.peptone]);
                if max_components >= 3 {
                    let third = complements.get(1).filter(|c| c.peptone.name != complement.peptone.name);
                    if let Some(third) = third {
                        groups.push(vec![*base, complement.peptone, third.peptone]);
                    }
                }
            }
        }

        // Bands that fit pairs may still be too tight for triples.
        let before = groups.len();
        groups.retain(|group| self.optimizer.config().check_bounds(group.len()).is_ok());
        if groups.len() < before {
            debug!(skipped = before - groups.len(), "ratio bounds cannot hold some blend sizes");
        }

        let reqs = requirements.as_ref();
        let mut results: Vec<FitnessResult> = groups
            .par_iter()
            .map(|group| self.optimize_group(strain, group, reqs))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .collect();
        sort_descending(&mut results);
        results.truncate(top_n);
        info!(
            strain = %strain.full_name(),
            groups = groups.len(),
            results = results.len(),
            "optimized blends ranked"
        );
        Ok(results)
    }

    /// Partners for `peptone_name` among the candidate products.
    pub fn complements(&self, peptone_name: &str, top_n: usize) -> Result<Vec<Complement<'_>>, PeptoforgeError> {
        let base = self.catalogue.peptone(peptone_name)?;
        Ok(select_complements(base, self.candidates(), top_n))
    }

    pub fn similar(
        &self,
        peptone_name: &str,
        top_n: usize,
        method: SimilarityMethod,
    ) -> Result<Vec<(&PeptoneProduct, f64)>, PeptoforgeError> {
        let reference = self.catalogue.peptone(peptone_name)?;
        Ok(find_similar(reference, self.candidates(), top_n, method))
    }

    /// Ratios of the named peptones that best match `target`.
    pub fn optimize_target(
        &self,
        peptone_names: &[&str],
        target: &FeatureVector,
        weights: Option<&FeatureVector>,
        solver: Solver,
        initial: Option<&[f64]>,
    ) -> Result<BlendOptimizationOutcome, PeptoforgeError> {
        let peptones = self.resolve(peptone_names)?;
        self.optimizer.optimize_ratio(&peptones, target, weights, solver, initial)
    }

    fn candidates(&self) -> Vec<&PeptoneProduct> {
        if self.reference_only {
            self.catalogue.reference_peptones().collect()
        } else {
            self.catalogue.peptones().iter().collect()
        }
    }

    fn resolve(&self, names: &[&str]) -> Result<Vec<&PeptoneProduct>, PeptoforgeError> {
        names.iter().map(|name| self.catalogue.peptone(name)).collect()
    }

    fn rank_singles(
        &self,
        strain: &StrainProfile,
        requirements: Option<&PathwayRequirements>,
        top_n: usize,
    ) -> Result<Vec<FitnessResult>, PeptoforgeError> {
        let mut results = self
            .candidates()
            .par_iter()
            .map(|peptone| self.result(strain, &[*peptone], vec![1.0], requirements))
            .collect::<Result<Vec<_>, _>>()?;
        sort_descending(&mut results);
        results.truncate(top_n);
        Ok(results)
    }

    fn optimize_group(
        &self,
        strain: &StrainProfile,
        group: &[&PeptoneProduct],
        requirements: Option<&PathwayRequirements>,
    ) -> Result<Vec<FitnessResult>, PeptoforgeError> {
        if self.use_optimizer {
            let score = |s: &StrainProfile, p: &[&PeptoneProduct], r: &[f64]| {
                self.score_blend(s, p, r, requirements).map_or(0.0, |score| score.overall)
            };
            let outcome = self.optimizer.optimize_for_strain(group, strain, score, self.solver, None)?;
            if outcome.success {
                return Ok(vec![self.result(strain, group, outcome.ratios, requirements)?]);
            }
            warn!(
                blend = %outcome.description(),
                message = %outcome.message,
                "discarding non-converged blend optimization"
            );
        }
        if group.len() != 2 {
            return Ok(Vec::new());
        }
        FALLBACK_PAIR_GRID
            .iter()
            .filter_map(|r1| self.feasible(&[*r1, 1.0 - r1]))
            .map(|ratios| self.result(strain, group, ratios, requirements))
            .collect()
    }

    fn result(
        &self,
        strain: &StrainProfile,
        peptones: &[&PeptoneProduct],
        ratios: Vec<f64>,
        requirements: Option<&PathwayRequirements>,
    ) -> Result<FitnessResult, PeptoforgeError> {
        let score = self.score_blend(strain, peptones, &ratios, requirements)?;
        let metrics = blend_metrics(peptones, &ratios, None)?;
        Ok(FitnessResult {
            strain: strain.clone(),
            peptones: peptones.iter().map(|p| (*p).clone()).collect(),
            ratios,
            overall_score: score.overall,
            rationale: rationale(peptones, &score.breakdown, requirements),
            breakdown: score.breakdown,
            metrics,
        })
    }

    /// Blend ratios must lie in the configured band and sum to one; a single
    /// peptone only needs a ratio of one.
    fn check_ratios(&self, ratios: &[f64]) -> Result<(), PeptoforgeError> {
        let config = self.optimizer.config();
        let (lo, hi) = if ratios.len() > 1 { (config.min_ratio, config.max_ratio) } else { (0.0, 1.0) };
        if let Some(&ratio) = ratios
            .iter()
            .find(|r| !r.is_finite() || **r < lo - RATIO_SNAP || **r > hi + RATIO_SNAP)
        {
            return Err(PeptoforgeError::RatioOutOfBounds { ratio, min: lo, max: hi });
        }
        let sum: f64 = ratios.iter().sum();
        if (sum - 1.0).abs() > RATIO_SUM_TOLERANCE {
            return Err(PeptoforgeError::RatioSumMismatch(sum));
        }
        Ok(())
    }

    /// `ratios` snapped onto the configured bounds, or `None` if any lies outside.
    fn feasible(&self, ratios: &[f64]) -> Option<Vec<f64>> {
        let config = self.optimizer.config();
        let (lo, hi) = (config.min_ratio, config.max_ratio);
        ratios
            .iter()
            .map(|&r| {
                let r = if (r - lo).abs() < RATIO_SNAP {
                    lo
                } else if (r - hi).abs() < RATIO_SNAP {
                    hi
                } else {
                    r
                };
                (lo..=hi).contains(&r).then_some(r)
            })
            .collect()
    }
}

fn check_max_components(max_components: usize) -> Result<(), PeptoforgeError> {
    if (OptimizerConfig::MIN_COMPONENTS..=OptimizerConfig::MAX_COMPONENTS).contains(&max_components) {
        Ok(())
    } else {
        Err(PeptoforgeError::InvalidBlendSize {
            got: max_components,
            min: OptimizerConfig::MIN_COMPONENTS,
            max: OptimizerConfig::MAX_COMPONENTS,
        })
    }
}

fn sort_descending(results: &mut [FitnessResult]) {
    results.sort_by(|a, b| b.overall_score.partial_cmp(&a.overall_score).unwrap_or(Ordering::Equal));
}
