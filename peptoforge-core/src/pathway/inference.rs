use super::{PathwayRequirements, RequirementLevel, NUCLEOTIDE, VITAMIN};
use std::collections::BTreeMap;

/// Pathway id to completeness in `[0, 1]` for one organism.
pub type PathwayInventory = BTreeMap<String, f64>;

/// Completeness below this marks a present pathway as partial.
pub const COMPLETENESS_THRESHOLD: f64 = 0.7;

pub const AMINO_ACID_PATHWAYS: [(&str, &str); 18] = [
    ("Alanine", "map00250"),
    ("Aspartate", "map00250"),
    ("Glutamate", "map00250"),
    ("Glycine", "map00260"),
    ("Serine", "map00260"),
    ("Threonine", "map00260"),
    ("Cysteine", "map00270"),
    ("Methionine", "map00270"),
    ("Valine", "map00290"),
    ("Leucine", "map00290"),
    ("Isoleucine", "map00290"),
    ("Lysine", "map00300"),
    ("Arginine", "map00330"),
    ("Proline", "map00330"),
    ("Histidine", "map00340"),
    ("Tyrosine", "map00350"),
    ("Phenylalanine", "map00400"),
    ("Tryptophan", "map00400"),
];

pub const VITAMIN_PATHWAYS: [&str; 8] = [
    "map00730", // thiamine
    "map00740", // riboflavin
    "map00750", // B6
    "map00760", // nicotinate
    "map00770", // pantothenate
    "map00780", // biotin
    "map00785", // lipoic acid
    "map00790", // folate
];

pub const PURINE_METABOLISM: &str = "map00230";
pub const PYRIMIDINE_METABOLISM: &str = "map00240";

/// Infers requirement levels from which biosynthesis pathways an organism has.
///
/// A missing amino-acid pathway means the organism must take that amino acid
/// up from the medium (high); a partial one means medium. Vitamins are judged
/// by how many of the vitamin pathways are missing, nucleotides by purine and
/// pyrimidine metabolism.
pub fn infer_requirements(inventory: &PathwayInventory) -> PathwayRequirements {
    let mut requirements = PathwayRequirements::new();

    for (amino_acid, pathway) in AMINO_ACID_PATHWAYS {
        let level = match inventory.get(pathway) {
            None => RequirementLevel::High,
            Some(completeness) if *completeness < COMPLETENESS_THRESHOLD => RequirementLevel::Medium,
            Some(_) => RequirementLevel::Low,
        };
        requirements.insert(amino_acid, level);
    }

    let missing = VITAMIN_PATHWAYS
        .iter()
        .filter(|pathway| !inventory.contains_key(**pathway))
        .count() as f64;
    let total = VITAMIN_PATHWAYS.len() as f64;
    let vitamin = if missing > total * 0.7 {
        RequirementLevel::High
    } else if missing > total * 0.3 {
        RequirementLevel::Medium
    } else {
        RequirementLevel::Low
    };
    requirements.insert(VITAMIN, vitamin);

    let nucleotide = if inventory.contains_key(PURINE_METABOLISM) && inventory.contains_key(PYRIMIDINE_METABOLISM) {
        RequirementLevel::Low
    } else {
        RequirementLevel::High
    };
    requirements.insert(NUCLEOTIDE, nucleotide);

    requirements
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory(entries: &[(&str, f64)]) -> PathwayInventory {
        entries.iter().map(|(id, c)| (id.to_string(), *c)).collect()
    }

    #[test]
    fn empty_inventory_means_everything_is_required() {
        let requirements = infer_requirements(&PathwayInventory::new());
        assert_eq!(requirements.len(), AMINO_ACID_PATHWAYS.len() + 2);
        assert!(requirements.iter().all(|(_, level)| level == RequirementLevel::High));
    }

    #[test]
    fn partial_pathways_are_medium() {
        let requirements = infer_requirements(&inventory(&[
            ("map00300", 0.5),
            ("map00260", 1.0),
            ("map00230", 1.0),
            ("map00240", 1.0),
        ]));
        assert_eq!(requirements.level("Lysine"), Some(RequirementLevel::Medium));
        assert_eq!(requirements.level("Threonine"), Some(RequirementLevel::Low));
        assert_eq!(requirements.level("Tryptophan"), Some(RequirementLevel::High));
        assert_eq!(requirements.level(NUCLEOTIDE), Some(RequirementLevel::Low));
    }

    #[test]
    fn vitamin_level_follows_missing_fraction() {
        // 3 of 8 missing is above 30%.
        let five: Vec<(&str, f64)> = VITAMIN_PATHWAYS[..5].iter().map(|id| (*id, 1.0)).collect();
        assert_eq!(infer_requirements(&inventory(&five)).level(VITAMIN), Some(RequirementLevel::Medium));

        // 2 of 8 missing is not.
        let six: Vec<(&str, f64)> = VITAMIN_PATHWAYS[..6].iter().map(|id| (*id, 1.0)).collect();
        assert_eq!(infer_requirements(&inventory(&six)).level(VITAMIN), Some(RequirementLevel::Low));

        // 6 of 8 missing is above 70%.
        let two: Vec<(&str, f64)> = VITAMIN_PATHWAYS[..2].iter().map(|id| (*id, 1.0)).collect();
        assert_eq!(infer_requirements(&inventory(&two)).level(VITAMIN), Some(RequirementLevel::High));
    }
}
