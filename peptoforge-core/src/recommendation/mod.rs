//! Candidate generation and ranking for single peptones and blends.

pub mod builder;
pub mod catalogue;
pub mod engine;
pub mod result;

pub use builder::RecommenderBuilder;
pub use catalogue::Catalogue;
pub use engine::Recommender;
pub use result::{FitnessResult, RecommendationRecord};
