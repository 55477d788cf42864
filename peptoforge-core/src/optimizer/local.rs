//! Local solver: projected quasi-Newton steps on the capped simplex.
//!
//! Each iteration takes a step along the negative gradient scaled by a
//! Barzilai-Borwein estimate of the inverse curvature, projects the result
//! back onto the feasible set and backtracks until the Armijo condition
//! holds. Since every iterate is a projection, the sum and box constraints
//! hold exactly at every step, not only at the end.

use super::{project_capped_simplex, SolverReport};
use crate::config::OptimizerConfig;

const FD_STEP: f64 = 1.490_116_119_384_765_6e-8;
const ARMIJO: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 60;
const STEP_TOLERANCE: f64 = 1e-12;
const INITIAL_MOVE: f64 = 0.1;

pub(super) fn minimize(objective: &dyn Fn(&[f64]) -> f64, start: &[f64], config: &OptimizerConfig) -> SolverReport {
    let (lo, hi) = (config.min_ratio, config.max_ratio);
    let mut x = project_capped_simplex(start, lo, hi);
    let mut f = objective(&x);
    let mut g = gradient(objective, &x, f);
    let mut alpha = INITIAL_MOVE / max_abs(&g).max(1e-12);

    for iteration in 1..=config.max_iterations {
        let mut step = alpha;
        let mut accepted = None;

        for _ in 0..MAX_BACKTRACKS {
            let candidate: Vec<f64> = {
                let shifted: Vec<f64> = x.iter().zip(&g).map(|(xi, gi)| xi - step * gi).collect();
                project_capped_simplex(&shifted, lo, hi)
            };
            let direction: Vec<f64> = candidate.iter().zip(&x).map(|(c, xi)| c - xi).collect();
            if max_abs(&direction) < STEP_TOLERANCE {
                return report(x, f, iteration, true, "Optimization terminated successfully");
            }
            let slope = dot(&g, &direction);
            if slope >= 0.0 {
                return report(x, f, iteration, false, "Positive directional derivative for linesearch");
            }
            let f_candidate = objective(&candidate);
            if f_candidate <= f + ARMIJO * slope {
                accepted = Some((candidate, f_candidate));
                break;
            }
            step *= 0.5;
        }

        let Some((next, f_next)) = accepted else {
            return report(x, f, iteration, false, "Positive directional derivative for linesearch");
        };
        let g_next = gradient(objective, &next, f_next);

        let s: Vec<f64> = next.iter().zip(&x).map(|(a, b)| a - b).collect();
        let y: Vec<f64> = g_next.iter().zip(&g).map(|(a, b)| a - b).collect();
        let sy = dot(&s, &y);
        alpha = if sy > 0.0 { dot(&s, &s) / sy } else { step * 2.0 };
        alpha = alpha.clamp(1e-10, 1e10);

        let change = (f - f_next).abs();
        x = next;
        f = f_next;
        g = g_next;
        if change < config.function_tolerance {
            return report(x, f, iteration, true, "Optimization terminated successfully");
        }
    }

    report(x, f, config.max_iterations, false, "Iteration limit reached")
}

/// Forward-difference gradient.
fn gradient(objective: &dyn Fn(&[f64]) -> f64, x: &[f64], fx: f64) -> Vec<f64> {
    let mut probe = x.to_vec();
    (0..x.len())
        .map(|i| {
            let h = FD_STEP * x[i].abs().max(1.0);
            probe[i] = x[i] + h;
            let derivative = (objective(&probe) - fx) / h;
            probe[i] = x[i];
            derivative
        })
        .collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn max_abs(v: &[f64]) -> f64 {
    v.iter().fold(0.0, |m, x| m.max(x.abs()))
}

fn report(x: Vec<f64>, fun: f64, iterations: usize, success: bool, message: &str) -> SolverReport {
    SolverReport { x, fun, iterations, success, message: message.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimizes_a_quadratic_inside_the_box() {
        let config = OptimizerConfig::default();
        let objective = |x: &[f64]| (x[0] - 0.3).powi(2) + (x[1] - 0.3).powi(2) + (x[2] - 0.4).powi(2);
        let result = minimize(&objective, &[0.6, 0.2, 0.2], &config);
        assert!(result.success, "{}", result.message);
        assert!((result.x[0] - 0.3).abs() < 1e-3);
        assert!((result.x[2] - 0.4).abs() < 1e-3);
        assert!((result.x.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn linear_objective_ends_on_a_vertex() {
        let config = OptimizerConfig::default();
        let objective = |x: &[f64]| -(2.0 * x[0] + x[1]);
        let result = minimize(&objective, &[0.5, 0.5], &config);
        assert!(result.success);
        assert!((result.x[0] - 0.8).abs() < 1e-9);
        assert!((result.x[1] - 0.2).abs() < 1e-9);
    }

    #[test]
    fn reports_iteration_limit() {
        let config = OptimizerConfig { max_iterations: 1, ..OptimizerConfig::default() };
        let objective = |x: &[f64]| (x[0] - 0.3).powi(2) + 5.0 * (x[1] - 0.7).powi(2);
        let result = minimize(&objective, &[0.7, 0.3], &config);
        assert!(!result.success);
        assert_eq!(result.message, "Iteration limit reached");
        assert!((result.x.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn flat_objective_converges_immediately() {
        let result = minimize(&|_: &[f64]| 0.5, &[0.5, 0.5], &OptimizerConfig::default());
        assert!(result.success);
        assert_eq!(result.iterations, 1);
        assert!(result.x.iter().all(|r| (r - 0.5).abs() < 1e-12));
    }
}
