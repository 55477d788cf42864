use crate::profile::NutritionalProfile;
use serde::{Deserialize, Serialize};

/// A peptone product as it appears in a knowledge-base file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeptoneRecord {
    pub sample_id: String,
    pub name: String,
    pub raw_material: String,
    pub manufacturer: String,
    #[serde(default)]
    pub profile: NutritionalProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeptoneProduct {
    pub sample_id: String,
    pub name: String,
    pub raw_material: String,
    pub manufacturer: String,
    pub profile: NutritionalProfile,
    is_reference: bool,
}

impl PeptoneProduct {
    /// Builds a product, flagging it when `manufacturer` matches the
    /// reference manufacturer (case-insensitive).
    pub fn new(
        sample_id: impl Into<String>,
        name: impl Into<String>,
        raw_material: impl Into<String>,
        manufacturer: impl Into<String>,
        profile: NutritionalProfile,
        reference_manufacturer: &str,
    ) -> Self {
        let manufacturer = manufacturer.into();
        let is_reference = manufacturer.trim().to_lowercase() == reference_manufacturer.trim().to_lowercase();
        Self {
            sample_id: sample_id.into(),
            name: name.into(),
            raw_material: raw_material.into(),
            manufacturer,
            profile,
            is_reference,
        }
    }

    pub fn from_record(record: PeptoneRecord, reference_manufacturer: &str) -> Self {
        Self::new(
            record.sample_id,
            record.name,
            record.raw_material,
            record.manufacturer,
            record.profile,
            reference_manufacturer,
        )
    }

    pub fn is_reference(&self) -> bool {
        self.is_reference
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_flag_ignores_case() {
        let product = PeptoneProduct::new("S-01", "SP-100", "Soy", "SEMPIO", NutritionalProfile::default(), "sempio");
        assert!(product.is_reference());

        let other = PeptoneProduct::new("S-02", "YE-A", "Yeast", "Acme", NutritionalProfile::default(), "sempio");
        assert!(!other.is_reference());
    }
}
