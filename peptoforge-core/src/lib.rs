//! Fitness scoring, blend evaluation and blend-ratio optimization for
//! peptone nitrogen sources.
//!
//! The entry point for most callers is [`recommendation::Recommender`],
//! built with [`recommendation::RecommenderBuilder`]. The lower-level
//! pieces (scorer, blend evaluator, optimizer, pathway bonus) are usable on
//! their own.

pub mod analysis;
pub mod blend;
pub mod complementarity;
pub mod config;
pub mod error;
pub mod features;
pub mod optimizer;
pub mod pathway;
pub mod recommendation;
pub mod scoring;

#[cfg(test)]
mod test_support;
