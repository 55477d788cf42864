//! Defines the data structures describing a microbial strain and the static
//! category table that classifies strains by genus.

use serde::{Deserialize, Serialize};

/// Enumerates the strain groups that share a nutritional behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum StrainCategory {
    #[serde(rename = "LAB")]
    Lab,
    Bacillus,
    #[serde(rename = "E_coli")]
    EColi,
    Yeast,
    Actinomycetes,
    #[default]
    Other,
}

/// How demanding a strain category is regarding complex nitrogen sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NutritionalType {
    Fastidious,
    Minimal,
    Moderate,
    Complex,
    Variable,
}

/// One row of the static classification table.
#[derive(Debug, Clone, Copy)]
pub struct CategoryInfo {
    pub category: StrainCategory,
    pub genera: &'static [&'static str],
    pub nutritional_type: NutritionalType,
    pub key_requirements: &'static [&'static str],
    pub description: &'static str,
}

pub const CATEGORY_TABLE: [CategoryInfo; 6] = [
    CategoryInfo {
        category: StrainCategory::Lab,
        genera: &[
            "Lactobacillus",
            "Lactiplantibacillus",
            "Lacticaseibacillus",
            "Limosilactobacillus",
            "Ligilactobacillus",
            "Bifidobacterium",
            "Enterococcus",
            "Streptococcus",
            "Lactococcus",
            "Leuconostoc",
            "Weissella",
            "Pediococcus",
        ],
        nutritional_type: NutritionalType::Fastidious,
        key_requirements: &["amino_acids", "B_vitamins", "nucleotides"],
        description: "Lactic acid bacteria with high nutritional requirements",
    },
    CategoryInfo {
        category: StrainCategory::Bacillus,
        genera: &["Bacillus"],
        nutritional_type: NutritionalType::Minimal,
        key_requirements: &["nitrogen_source", "trace_minerals"],
        description: "Spore-forming bacteria with minimal nutritional needs",
    },
    // Sits between minimal and moderate; scored with the moderate rules.
    CategoryInfo {
        category: StrainCategory::EColi,
        genera: &["Escherichia"],
        nutritional_type: NutritionalType::Moderate,
        key_requirements: &["nitrogen_source", "carbon_source"],
        description: "Gram-negative bacteria, commonly used in biotechnology",
    },
    CategoryInfo {
        category: StrainCategory::Yeast,
        genera: &["Saccharomyces", "Candida", "Pichia"],
        nutritional_type: NutritionalType::Moderate,
        key_requirements: &["nitrogen_source", "vitamins", "trace_minerals"],
        description: "Eukaryotic microorganisms",
    },
    CategoryInfo {
        category: StrainCategory::Actinomycetes,
        genera: &["Streptomyces", "Actinomyces"],
        nutritional_type: NutritionalType::Complex,
        key_requirements: &["complex_nitrogen", "phosphate"],
        description: "Filamentous bacteria, antibiotic producers",
    },
    CategoryInfo {
        category: StrainCategory::Other,
        genera: &[],
        nutritional_type: NutritionalType::Variable,
        key_requirements: &["basic_nutrients"],
        description: "Other microorganisms",
    },
];

impl StrainCategory {
    pub const ALL: [StrainCategory; 6] = [
        StrainCategory::Lab,
        StrainCategory::Bacillus,
        StrainCategory::EColi,
        StrainCategory::Yeast,
        StrainCategory::Actinomycetes,
        StrainCategory::Other,
    ];

    /// Classifies a genus, falling back to `Other` for unknown genera.
    pub fn from_genus(genus: &str) -> Self {
        let genus = genus.trim();
        CATEGORY_TABLE
            .iter()
            .find(|info| info.genera.contains(&genus))
            .map_or(StrainCategory::Other, |info| info.category)
    }

    pub fn info(&self) -> &'static CategoryInfo {
        // The table holds exactly one row per variant, in declaration order.
        &CATEGORY_TABLE[*self as usize]
    }

    pub fn nutritional_type(&self) -> NutritionalType {
        self.info().nutritional_type
    }

    pub fn key_requirements(&self) -> &'static [&'static str] {
        self.info().key_requirements
    }

    pub fn description(&self) -> &'static str {
        self.info().description
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrainCategory::Lab => "LAB",
            StrainCategory::Bacillus => "Bacillus",
            StrainCategory::EColi => "E_coli",
            StrainCategory::Yeast => "Yeast",
            StrainCategory::Actinomycetes => "Actinomycetes",
            StrainCategory::Other => "Other",
        }
    }
}

/// A strain as it appears in a knowledge-base file, before classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrainRecord {
    pub genus: String,
    pub species: String,
    pub strain_id: String,
    pub temperature: f64,
    pub domain: Option<String>,
    pub medium: Option<String>,
}

/// A classified strain. The category and the NDA flag are derived once, when
/// the strain is built, and never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StrainRecord")]
pub struct StrainProfile {
    pub genus: String,
    pub species: String,
    pub strain_id: String,
    /// Incubation temperature in degrees Celsius.
    pub temperature: f64,
    pub domain: Option<String>,
    pub medium: Option<String>,
    category: StrainCategory,
    is_nda: bool,
}

impl StrainProfile {
    pub fn new(
        genus: impl Into<String>,
        species: impl Into<String>,
        strain_id: impl Into<String>,
        temperature: f64,
    ) -> Self {
        Self::from(StrainRecord {
            genus: genus.into(),
            species: species.into(),
            strain_id: strain_id.into(),
            temperature,
            domain: None,
            medium: None,
        })
    }

    pub fn category(&self) -> StrainCategory {
        self.category
    }

    pub fn nutritional_type(&self) -> NutritionalType {
        self.category.nutritional_type()
    }

    pub fn key_requirements(&self) -> &'static [&'static str] {
        self.category.key_requirements()
    }

    /// Strains under non-disclosure carry a `*` in their identifier.
    pub fn is_nda(&self) -> bool {
        self.is_nda
    }

    pub fn full_name(&self) -> String {
        [&self.genus, &self.species, &self.strain_id]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<StrainRecord> for StrainProfile {
    fn from(record: StrainRecord) -> Self {
        let category = StrainCategory::from_genus(&record.genus);
        let is_nda = record.strain_id.contains('*');
        Self {
            genus: record.genus,
            species: record.species,
            strain_id: record.strain_id.trim().to_string(),
            temperature: record.temperature,
            domain: record.domain,
            medium: record.medium,
            category,
            is_nda,
        }
    }
}
