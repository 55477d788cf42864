#![allow(dead_code)]

use peptoforge_core::recommendation::Recommender;
use peptoforge_schemas::{
    peptone::PeptoneProduct,
    profile::{Composition, NutritionalProfile},
    strain::StrainProfile,
};

pub const REFERENCE: &str = "Sempio";
pub const LAB_ID: &str = "KCCM 12116";
pub const BACILLUS_ID: &str = "KCTC 1022";
pub const NDA_ID: &str = "KCCM 40*";

fn composition(entries: &[(&str, f64)]) -> Composition {
    entries.iter().map(|(key, value)| (key.to_string(), *value)).collect()
}

/// A peptone whose growth factors and free amino acids scale with `an`.
pub fn peptone(name: &str, raw_material: &str, manufacturer: &str, tn: f64, an: f64) -> PeptoneProduct {
    let profile = NutritionalProfile {
        general: composition(&[("TN", tn), ("AN", an)]),
        nucleotides: composition(&[("AMP", an * 0.3), ("GMP", an * 0.2)]),
        vitamins: composition(&[("B1", 0.4), ("B2", an * 0.1)]),
        molecular_weight: composition(&[
            ("lt250Da", 0.20 + an / 100.0),
            ("250_500Da", 0.30),
            ("500_750Da", 0.15),
            ("750_1000Da", 0.10),
            ("gt1000Da", 0.25 - an / 100.0),
        ]),
        total_amino_acids: composition(&[
            ("Threonine", 3.0),
            ("Valine", 4.0),
            ("Methionine", 1.5),
            ("Isoleucine", 3.5),
            ("Leucine", 6.0),
            ("Phenylalanine", 3.0),
            ("Tryptophan", 1.0),
            ("Lysine", 5.0 + an / 10.0),
            ("Histidine", 2.0),
            ("Glycine", 10.0),
            ("Glutamic acid", 14.0),
        ]),
        free_amino_acids: composition(&[
            ("Lysine", an * 0.05),
            ("Leucine", an * 0.04),
            ("Methionine", an * 0.01),
        ]),
        ..Default::default()
    };
    PeptoneProduct::new(format!("S-{name}"), name, raw_material, manufacturer, profile, REFERENCE)
}

pub fn peptones() -> Vec<PeptoneProduct> {
    vec![
        peptone("SP-90", "Soy", REFERENCE, 90.0, 16.0),
        peptone("YE-70", "Yeast", REFERENCE, 70.0, 12.0),
        peptone("CA-60", "Casein", "Acme", 60.0, 9.0),
        peptone("WG-40", "Wheat", REFERENCE, 40.0, 5.0),
        peptone("FI-20", "Fish", REFERENCE, 20.0, 2.0),
        peptone("PE-55", "Pea", "Acme", 55.0, 7.0),
    ]
}

pub fn strains() -> Vec<StrainProfile> {
    vec![
        StrainProfile::new("Lactobacillus", "plantarum", LAB_ID, 37.0),
        StrainProfile::new("Bacillus", "subtilis", BACILLUS_ID, 30.0),
        StrainProfile::new("Lactobacillus", "casei", NDA_ID, 37.0),
    ]
}

pub fn recommender() -> Recommender {
    Recommender::builder()
        .with_strains(strains())
        .with_peptones(peptones())
        .build()
        .unwrap()
}

pub fn assert_feasible(ratios: &[f64], min: f64, max: f64) {
    let sum: f64 = ratios.iter().sum();
    assert!((sum - 1.0).abs() < 1e-6, "ratios {ratios:?} sum to {sum}");
    for ratio in ratios {
        assert!(*ratio >= min - 1e-9 && *ratio <= max + 1e-9, "ratio {ratio} outside [{min}, {max}]");
    }
}
