//! Constrained optimization of blend ratios.
//!
//! Every solution lies on the capped simplex: ratios sum to one and each
//! ratio stays within `[min_ratio, max_ratio]`. Two objectives are supported
//! (matching a target feature vector, or maximizing strain fitness) and each
//! can be solved by either the local or the global solver.

mod global;
mod local;

use crate::{config::OptimizerConfig, error::PeptoforgeError, features::FeatureVector};
use peptoforge_schemas::{peptone::PeptoneProduct, strain::StrainProfile};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Solver {
    /// Projected gradient descent from an initial guess.
    Local,
    /// Seeded differential evolution over the ratio box.
    Global,
}

impl Solver {
    pub fn name(&self) -> &'static str {
        match self {
            Solver::Local => "Projected gradient",
            Solver::Global => "Differential Evolution",
        }
    }
}

impl fmt::Display for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Solver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "projected_gradient" | "projected-gradient" | "pg" => Ok(Solver::Local),
            "global" | "de" | "differential_evolution" | "differential-evolution" => Ok(Solver::Global),
            other => Err(format!("unknown solver: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationMode {
    /// Minimize the weighted squared distance to a target feature vector.
    TargetMatching,
    /// Maximize a strain's blend fitness score.
    StrainFitness,
}

/// The result of one optimization run.
///
/// A run that fails to converge is still an outcome: `success` is false and
/// `message` says why. Ratios always satisfy the blend constraints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlendOptimizationOutcome {
    pub peptones: Vec<String>,
    pub ratios: Vec<f64>,
    /// Distance to the target, or the fitness score in strain-fitness mode.
    pub objective: f64,
    pub mode: OptimizationMode,
    pub solver: Solver,
    pub iterations: usize,
    pub success: bool,
    pub message: String,
}

impl BlendOptimizationOutcome {
    /// `"SP-100 60.0% + YE-A 40.0%"`
    pub fn description(&self) -> String {
        self.peptones
            .iter()
            .zip(&self.ratios)
            .map(|(name, ratio)| format!("{} {:.1}%", name, ratio * 100.0))
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

/// What a solver hands back before it is attached to peptones.
#[derive(Debug, Clone)]
pub(crate) struct SolverReport {
    pub x: Vec<f64>,
    pub fun: f64,
    pub iterations: usize,
    pub success: bool,
    pub message: String,
}

/// Weighted squared distance between the ratio-weighted blend of `features`
/// and `target`.
pub fn target_objective(features: &[FeatureVector], target: &FeatureVector, weights: &FeatureVector, ratios: &[f64]) -> f64 {
    let blended = FeatureVector::combine(features, ratios).to_array();
    blended
        .iter()
        .zip(target.to_array())
        .zip(weights.to_array())
        .map(|((b, t), w)| ((b - t) * w).powi(2))
        .sum()
}

/// Euclidean projection of `y` onto `{x : sum(x) = 1, lo <= x_i <= hi}`.
///
/// The projection has the form `x_i = clamp(y_i - tau, lo, hi)`; `tau` is
/// found by bisection since the sum is monotone in it. The set must be
/// non-empty (`n * lo <= 1 <= n * hi`).
pub fn project_capped_simplex(y: &[f64], lo: f64, hi: f64) -> Vec<f64> {
    let sum_at = |tau: f64| y.iter().map(|v| (v - tau).clamp(lo, hi)).sum::<f64>();

    let max_y = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_y = y.iter().copied().fold(f64::INFINITY, f64::min);
    // sum_at(low) = n * hi >= 1 and sum_at(high) = n * lo <= 1.
    let mut low = min_y - hi;
    let mut high = max_y - lo;

    for _ in 0..200 {
        let mid = 0.5 * (low + high);
        if mid <= low || mid >= high {
            break;
        }
        if sum_at(mid) > 1.0 {
            low = mid;
        } else {
            high = mid;
        }
    }

    let tau = 0.5 * (low + high);
    y.iter().map(|v| (v - tau).clamp(lo, hi)).collect()
}

#[derive(Debug, Clone, Default)]
pub struct BlendOptimizer {
    config: OptimizerConfig,
}

impl BlendOptimizer {
    pub fn new(config: OptimizerConfig) -> Result<Self, PeptoforgeError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Finds the ratios whose blended feature vector is closest to `target`.
    ///
    /// `weights` default to one per feature; `initial` defaults to equal ratios.
    pub fn optimize_ratio(
        &self,
        peptones: &[&PeptoneProduct],
        target: &FeatureVector,
        weights: Option<&FeatureVector>,
        solver: Solver,
        initial: Option<&[f64]>,
    ) -> Result<BlendOptimizationOutcome, PeptoforgeError> {
        self.check(peptones, initial)?;
        let features: Vec<FeatureVector> = peptones.iter().map(|p| FeatureVector::from_peptone(p)).collect();
        let weights = weights.copied().unwrap_or_else(FeatureVector::ones);

        let objective = |ratios: &[f64]| target_objective(&features, target, &weights, ratios);
        let report = self.solve(&objective, peptones.len(), solver, initial);
        Ok(self.outcome(peptones, report, OptimizationMode::TargetMatching, solver))
    }

    /// Finds the ratios that maximize `score` for `strain`.
    ///
    /// `score` receives the strain, the peptones and a candidate ratio vector;
    /// the reported objective is the score at the solved ratios.
    pub fn optimize_for_strain<F>(
        &self,
        peptones: &[&PeptoneProduct],
        strain: &StrainProfile,
        score: F,
        solver: Solver,
        initial: Option<&[f64]>,
    ) -> Result<BlendOptimizationOutcome, PeptoforgeError>
    where
        F: Fn(&StrainProfile, &[&PeptoneProduct], &[f64]) -> f64,
    {
        self.check(peptones, initial)?;
        let objective = |ratios: &[f64]| -score(strain, peptones, ratios);
        let mut report = self.solve(&objective, peptones.len(), solver, initial);
        report.fun = -report.fun;
        Ok(self.outcome(peptones, report, OptimizationMode::StrainFitness, solver))
    }

    fn check(&self, peptones: &[&PeptoneProduct], initial: Option<&[f64]>) -> Result<(), PeptoforgeError> {
        let n = peptones.len();
        if !(OptimizerConfig::MIN_COMPONENTS..=OptimizerConfig::MAX_COMPONENTS).contains(&n) {
            return Err(PeptoforgeError::InvalidBlendSize {
                got: n,
                min: OptimizerConfig::MIN_COMPONENTS,
                max: OptimizerConfig::MAX_COMPONENTS,
            });
        }
        if let Some(initial) = initial {
            if initial.len() != n {
                return Err(PeptoforgeError::RatioLengthMismatch { peptones: n, ratios: initial.len() });
            }
        }
        self.config.check_bounds(n)
    }

    fn solve(&self, objective: &dyn Fn(&[f64]) -> f64, n: usize, solver: Solver, initial: Option<&[f64]>) -> SolverReport {
        match solver {
            Solver::Local => {
                let start = match initial {
                    Some(guess) => guess.to_vec(),
                    None => vec![1.0 / n as f64; n],
                };
                local::minimize(objective, &start, &self.config)
            }
            Solver::Global => global::minimize(objective, n, &self.config),
        }
    }

    fn outcome(
        &self,
        peptones: &[&PeptoneProduct],
        report: SolverReport,
        mode: OptimizationMode,
        solver: Solver,
    ) -> BlendOptimizationOutcome {
        debug!(
            solver = solver.name(),
            ?mode,
            iterations = report.iterations,
            success = report.success,
            objective = report.fun,
            "blend optimization finished"
        );
        BlendOptimizationOutcome {
            peptones: peptones.iter().map(|p| p.name.clone()).collect(),
            ratios: report.x,
            objective: report.fun,
            mode,
            solver,
            iterations: report.iterations,
            success: report.success,
            message: report.message,
        }
    }
}
