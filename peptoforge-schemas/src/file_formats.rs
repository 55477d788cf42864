use crate::{peptone::PeptoneRecord, strain::StrainProfile};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub struct StrainFile {
    pub schema_version: String,
    pub strains: Vec<StrainProfile>,
}

#[derive(Debug, Deserialize)]
pub struct PeptoneFile {
    pub schema_version: String,
    pub peptones: Vec<PeptoneRecord>,
}

#[derive(Debug, Deserialize)]
pub struct RequirementFile {
    pub schema_version: String,
    pub organisms: Vec<OrganismRequirements>,
}

/// Externally sourced metabolic data for one organism. Either explicit
/// requirement levels (`"Lysine_requirement": "high"`) or a pathway
/// inventory (pathway id to completeness in `[0, 1]`) may be given.
#[derive(Debug, Clone, Deserialize)]
pub struct OrganismRequirements {
    pub genus: String,
    pub species: String,
    #[serde(default)]
    pub requirements: BTreeMap<String, String>,
    #[serde(default)]
    pub pathways: Option<BTreeMap<String, f64>>,
}
