use thiserror::Error;

#[derive(Debug, Error)]
pub enum PeptoforgeError {
    #[error("Strain '{0}' not found in catalogue")]
    StrainNotFound(String),

    #[error("Peptone '{0}' not found in catalogue")]
    PeptoneNotFound(String),

    #[error("A blend needs between {min} and {max} peptones, got {got}")]
    InvalidBlendSize { got: usize, min: usize, max: usize },

    #[error("Got {ratios} ratios for {peptones} peptones")]
    RatioLengthMismatch { peptones: usize, ratios: usize },

    #[error("Blend ratios must sum to 1, got {0}")]
    RatioSumMismatch(f64),

    #[error("Blend ratio {ratio} lies outside [{min}, {max}]")]
    RatioOutOfBounds { ratio: f64, min: f64, max: f64 },

    #[error("Ratio bounds [{min}, {max}] cannot hold {components} components summing to 1")]
    InvalidRatioBounds { min: f64, max: f64, components: usize },

    #[error("Invalid profile for peptone '{peptone}': {reason}")]
    InvalidProfile { peptone: String, reason: String },

    #[error("Unknown requirement level '{level}' for '{key}'")]
    InvalidRequirementLevel { key: String, level: String },

    #[error("Duplicate {kind} identifier '{id}'")]
    DuplicateIdentifier { kind: &'static str, id: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Requirement lookup failed for '{0}': {1}")]
    RequirementLookup(String, String),
}
