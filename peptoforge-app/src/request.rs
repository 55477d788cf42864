use anyhow::{ensure, Context, Result};
use peptoforge_core::{
    features::{FeatureVector, FeatureWeights},
    optimizer::Solver,
};
use serde::Deserialize;
use std::{fs, path::Path};

/// Target-matching request: which peptones to blend and the feature vector
/// the blend should land on.
#[derive(Debug, Deserialize)]
pub struct TargetRequest {
    pub peptones: Vec<String>,
    pub target: FeatureVector,
    /// Omitted dimensions keep a weight of 1.
    #[serde(default)]
    pub weights: Option<FeatureWeights>,
    #[serde(default = "default_solver")]
    pub solver: Solver,
    #[serde(default)]
    pub initial: Option<Vec<f64>>,
}

fn default_solver() -> Solver {
    Solver::Local
}

impl TargetRequest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let request: TargetRequest =
            serde_yaml::from_str(&content).with_context(|| format!("Failed to parse request {:?}", path))?;
        ensure!(!request.peptones.is_empty(), "request {:?} names no peptones", path);
        Ok(request)
    }

    pub fn weight_vector(&self) -> Option<FeatureVector> {
        self.weights.map(FeatureVector::from)
    }

    pub fn peptone_names(&self) -> Vec<&str> {
        self.peptones.iter().map(String::as_str).collect()
    }
}
