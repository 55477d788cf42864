use anyhow::{Context, Result};
use peptoforge_core::config::{OptimizerConfig, ScoringConfig};
use peptoforge_schemas::{
    file_formats::{OrganismRequirements, PeptoneFile, RequirementFile, StrainFile},
    peptone::PeptoneProduct,
    strain::StrainProfile,
};
use serde::de::DeserializeOwned;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Everything a recommendation run needs, loaded from a knowledge-base directory:
///
/// ```text
/// <base>/strains/*.yaml        required
/// <base>/peptones/*.yaml       required
/// <base>/requirements/*.yaml   optional pathway requirement data
/// <base>/scoring.yaml          optional ScoringConfig override
/// <base>/optimizer.yaml        optional OptimizerConfig override
/// ```
pub struct KnowledgeBase {
    pub strains: Vec<StrainProfile>,
    pub peptones: Vec<PeptoneProduct>,
    pub requirements: Vec<OrganismRequirements>,
    pub scoring: ScoringConfig,
    pub optimizer: OptimizerConfig,
}

impl KnowledgeBase {
    /// Loads all data from the specified base directory. Peptones made by
    /// `reference_manufacturer` are flagged as reference products.
    pub fn load(base_path: &Path, reference_manufacturer: &str) -> Result<Self> {
        println!("Loading knowledge base from '{}'...", base_path.display());

        let strains = load_yaml_files(base_path.join("strains"), |file: StrainFile| file.strains)?;
        let peptones = load_yaml_files(base_path.join("peptones"), |file: PeptoneFile| file.peptones)?
            .into_iter()
            .map(|record| PeptoneProduct::from_record(record, reference_manufacturer))
            .collect::<Vec<_>>();

        let requirements_dir = base_path.join("requirements");
        let requirements = if requirements_dir.is_dir() {
            load_yaml_files(requirements_dir, |file: RequirementFile| file.organisms)?
        } else {
            Vec::new()
        };

        let scoring = load_optional(base_path.join("scoring.yaml"))?.unwrap_or_default();
        let optimizer = load_optional(base_path.join("optimizer.yaml"))?.unwrap_or_default();

        println!(
            "Knowledge base loaded: {} strains, {} peptones, {} organisms with requirement data.",
            strains.len(),
            peptones.len(),
            requirements.len()
        );
        Ok(Self {
            strains,
            peptones,
            requirements,
            scoring,
            optimizer,
        })
    }
}

/// Generic helper to load every YAML file in a directory, in file-name order,
/// and flatten the items each file wraps.
fn load_yaml_files<P, F, E, T>(dir_path: P, extract_vec: E) -> Result<Vec<T>>
where
    P: AsRef<Path>,
    F: DeserializeOwned, // The file wrapper struct (e.g., PeptoneFile)
    E: Fn(F) -> Vec<T>,  // A closure to extract the Vec<T> from the wrapper
{
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir_path.as_ref())
        .with_context(|| format!("Failed to read directory: {:?}", dir_path.as_ref()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |s| s == "yaml" || s == "yml") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut items = Vec::new();
    for path in paths {
        let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;
        let file_wrapper: F =
            serde_yaml::from_str(&content).with_context(|| format!("Failed to parse YAML from {:?}", path))?;
        items.extend(extract_vec(file_wrapper));
    }
    Ok(items)
}

fn load_optional<T: DeserializeOwned>(path: PathBuf) -> Result<Option<T>> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;
    let value = serde_yaml::from_str(&content).with_context(|| format!("Failed to parse YAML from {:?}", path))?;
    Ok(Some(value))
}
