//! Global solver: seeded best/1/bin differential evolution.
//!
//! The box constraint is handled by resampling out-of-range parameters, the
//! sum constraint by an additive penalty. The best member is divided by its
//! sum afterwards and projected back into the box if that pushed a component
//! out of range, so the returned ratios are always feasible.

use super::{project_capped_simplex, SolverReport};
use crate::config::OptimizerConfig;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

const MIN_POPULATION: usize = 5;

pub(super) fn minimize(objective: &dyn Fn(&[f64]) -> f64, n: usize, config: &OptimizerConfig) -> SolverReport {
    let (lo, hi) = (config.min_ratio, config.max_ratio);
    let penalized = |x: &[f64]| objective(x) + config.sum_penalty * (x.iter().sum::<f64>() - 1.0).abs();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let size = (config.population_size * n).max(MIN_POPULATION);
    let mut population = latin_hypercube(size, n, lo, hi, &mut rng);
    let mut energies: Vec<f64> = population.iter().map(|member| penalized(member)).collect();
    let mut best = argmin(&energies);

    let mut generations = 0;
    let mut converged = has_converged(&energies, config.population_tolerance);
    while !converged && generations < config.max_generations {
        generations += 1;
        // Dithering: one mutation scale per generation.
        let (f_lo, f_hi) = config.mutation;
        let scale = f_lo + rng.gen::<f64>() * (f_hi - f_lo);

        for i in 0..size {
            let (r1, r2) = distinct_pair(size, i, &mut rng);
            let forced = rng.gen_range(0..n);
            let mut trial = population[i].clone();
            for j in 0..n {
                if j == forced || rng.gen::<f64>() < config.recombination {
                    let value = population[best][j] + scale * (population[r1][j] - population[r2][j]);
                    trial[j] = if (lo..=hi).contains(&value) { value } else { lo + rng.gen::<f64>() * (hi - lo) };
                }
            }

            let energy = penalized(&trial);
            if energy <= energies[i] {
                population[i] = trial;
                energies[i] = energy;
                if energy <= energies[best] {
                    best = i;
                }
            }
        }
        converged = has_converged(&energies, config.population_tolerance);
    }

    let x = renormalize(&population[best], lo, hi);
    let fun = objective(&x);
    let message = if converged {
        "Optimization terminated successfully"
    } else {
        "Maximum number of iterations has been exceeded"
    };
    SolverReport {
        x,
        fun,
        iterations: generations,
        success: converged,
        message: message.to_string(),
    }
}

/// Stratified initial population: each dimension is cut into `size` equal
/// strata and every stratum is sampled exactly once.
fn latin_hypercube(size: usize, n: usize, lo: f64, hi: f64, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut population = vec![vec![0.0; n]; size];
    let mut strata: Vec<usize> = (0..size).collect();
    for j in 0..n {
        strata.shuffle(rng);
        for (member, stratum) in population.iter_mut().zip(&strata) {
            let u = (*stratum as f64 + rng.gen::<f64>()) / size as f64;
            member[j] = lo + u * (hi - lo);
        }
    }
    population
}

fn distinct_pair(size: usize, exclude: usize, rng: &mut StdRng) -> (usize, usize) {
    let mut pick = |taken: &[usize]| loop {
        let candidate = rng.gen_range(0..size);
        if !taken.contains(&candidate) {
            break candidate;
        }
    };
    let r1 = pick(&[exclude]);
    let r2 = pick(&[exclude, r1]);
    (r1, r2)
}

fn has_converged(energies: &[f64], tolerance: f64) -> bool {
    let count = energies.len() as f64;
    let mean = energies.iter().sum::<f64>() / count;
    let variance = energies.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / count;
    variance.sqrt() <= tolerance * mean.abs()
}

fn argmin(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, value) in values.iter().enumerate() {
        if *value < values[best] {
            best = i;
        }
    }
    best
}

fn renormalize(x: &[f64], lo: f64, hi: f64) -> Vec<f64> {
    let sum: f64 = x.iter().sum();
    let scaled: Vec<f64> = x.iter().map(|v| v / sum).collect();
    if scaled.iter().all(|v| (lo..=hi).contains(v)) {
        scaled
    } else {
        project_capped_simplex(&scaled, lo, hi)
    }
}
