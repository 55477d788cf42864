use crate::error::PeptoforgeError;
use peptoforge_schemas::{
    peptone::PeptoneProduct,
    profile::{NutritionalProfile, ProfileCategory, MW_FRACTION_BANDS},
    strain::StrainProfile,
};
use std::collections::HashMap;

/// Indexed, validated strains and peptones.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    strains: Vec<StrainProfile>,
    peptones: Vec<PeptoneProduct>,
    strain_index: HashMap<String, usize>,
    peptone_index: HashMap<String, usize>,
}

impl Catalogue {
    /// Validates every peptone profile and indexes strains by id and
    /// peptones by name. Duplicate identifiers are rejected.
    pub fn new(strains: Vec<StrainProfile>, peptones: Vec<PeptoneProduct>) -> Result<Self, PeptoforgeError> {
        let mut strain_index = HashMap::with_capacity(strains.len());
        for (i, strain) in strains.iter().enumerate() {
            if strain_index.insert(strain.strain_id.clone(), i).is_some() {
                return Err(PeptoforgeError::DuplicateIdentifier { kind: "strain", id: strain.strain_id.clone() });
            }
        }

        let mut peptone_index = HashMap::with_capacity(peptones.len());
        for (i, peptone) in peptones.iter().enumerate() {
            validate_profile(&peptone.name, &peptone.profile)?;
            if peptone_index.insert(peptone.name.clone(), i).is_some() {
                return Err(PeptoforgeError::DuplicateIdentifier { kind: "peptone", id: peptone.name.clone() });
            }
        }

        Ok(Self { strains, peptones, strain_index, peptone_index })
    }

    pub fn strain(&self, strain_id: &str) -> Result<&StrainProfile, PeptoforgeError> {
        self.strain_index
            .get(strain_id.trim())
            .map(|&i| &self.strains[i])
            .ok_or_else(|| PeptoforgeError::StrainNotFound(strain_id.to_string()))
    }

    pub fn peptone(&self, name: &str) -> Result<&PeptoneProduct, PeptoforgeError> {
        self.peptone_index
            .get(name.trim())
            .map(|&i| &self.peptones[i])
            .ok_or_else(|| PeptoforgeError::PeptoneNotFound(name.to_string()))
    }

    pub fn strains(&self) -> &[StrainProfile] {
        &self.strains
    }

    pub fn peptones(&self) -> &[PeptoneProduct] {
        &self.peptones
    }

    /// Products of the reference manufacturer, in catalogue order.
    pub fn reference_peptones(&self) -> impl Iterator<Item = &PeptoneProduct> {
        self.peptones.iter().filter(|p| p.is_reference())
    }
}

/// Rejects negative or non-finite measurements and molecular-weight
/// fractions outside `[0, 1]`. Non-fraction keys such as `avg_Da` are only
/// checked for sign.
pub fn validate_profile(peptone: &str, profile: &NutritionalProfile) -> Result<(), PeptoforgeError> {
    for (category, key, value) in profile.measurements() {
        if !value.is_finite() || value < 0.0 {
            return Err(PeptoforgeError::InvalidProfile {
                peptone: peptone.to_string(),
                reason: format!("{}.{} = {} is not a non-negative number", category.as_str(), key, value),
            });
        }
        if category == ProfileCategory::MolecularWeight && MW_FRACTION_BANDS.contains(&key) && value > 1.0 {
            return Err(PeptoforgeError::InvalidProfile {
                peptone: peptone.to_string(),
                reason: format!("molecular-weight fraction {key} = {value} exceeds 1"),
            });
        }
    }
    Ok(())
}
