//! Shared fixtures for unit tests.

use peptoforge_schemas::{
    peptone::PeptoneProduct,
    profile::{Composition, NutritionalProfile},
    strain::StrainProfile,
};

pub(crate) const REFERENCE_MANUFACTURER: &str = "Sempio";

pub(crate) fn composition(entries: &[(&str, f64)]) -> Composition {
    entries.iter().map(|(key, value)| (key.to_string(), *value)).collect()
}

/// A plausible peptone whose free amino acids scale with its amino nitrogen.
pub(crate) fn peptone(name: &str, raw_material: &str, tn: f64, an: f64) -> PeptoneProduct {
    let profile = NutritionalProfile {
        general: composition(&[("TN", tn), ("AN", an)]),
        nucleotides: composition(&[("AMP", 2.0), ("GMP", 1.5)]),
        vitamins: composition(&[("B1", 0.5), ("B2", 0.8)]),
        molecular_weight: composition(&[
            ("lt250Da", 0.30),
            ("250_500Da", 0.30),
            ("500_750Da", 0.15),
            ("750_1000Da", 0.10),
            ("gt1000Da", 0.15),
        ]),
        total_amino_acids: composition(&[
            ("Threonine", 3.0),
            ("Valine", 4.0),
            ("Methionine", 1.5),
            ("Isoleucine", 3.5),
            ("Leucine", 6.0),
            ("Phenylalanine", 3.0),
            ("Tryptophan", 1.0),
            ("Lysine", 5.0),
            ("Histidine", 2.0),
            ("Glycine", 10.0),
            ("Glutamic acid", 12.0),
            ("Alanine", 6.0),
        ]),
        free_amino_acids: composition(&[
            ("Lysine", an * 0.05),
            ("Leucine", an * 0.04),
            ("Threonine", an * 0.02),
        ]),
        ..Default::default()
    };
    PeptoneProduct::new(
        format!("ID-{name}"),
        name,
        raw_material,
        REFERENCE_MANUFACTURER,
        profile,
        REFERENCE_MANUFACTURER,
    )
}

pub(crate) fn with_manufacturer(product: PeptoneProduct, manufacturer: &str) -> PeptoneProduct {
    PeptoneProduct::new(
        product.sample_id,
        product.name,
        product.raw_material,
        manufacturer,
        product.profile,
        REFERENCE_MANUFACTURER,
    )
}

pub(crate) fn strain(genus: &str, species: &str) -> StrainProfile {
    StrainProfile::new(genus, species, format!("{genus}-{species}-1"), 30.0)
}

pub(crate) fn lab_strain() -> StrainProfile {
    StrainProfile::new("Lactobacillus", "plantarum", "KCCM 12116", 37.0)
}
