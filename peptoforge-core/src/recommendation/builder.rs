use crate::{
    blend::BlendEvaluator,
    config::{OptimizerConfig, ScoringConfig},
    error::PeptoforgeError,
    optimizer::{BlendOptimizer, Solver},
    pathway::{cache::RequirementSource, PathwayBonus},
    recommendation::{catalogue::Catalogue, engine::Recommender},
    scoring::FitnessScorer,
};
use peptoforge_schemas::{peptone::PeptoneProduct, strain::StrainProfile};
use std::sync::Arc;

/// A fluent builder for constructing a `Recommender`.
///
/// Only strains and peptones are required. Scoring and optimizer settings
/// fall back to their defaults; pathway adjustment is enabled by supplying a
/// requirement source.
pub struct RecommenderBuilder {
    strains: Vec<StrainProfile>,
    peptones: Vec<PeptoneProduct>,
    scoring: ScoringConfig,
    optimizer: OptimizerConfig,
    pathway_bonus: PathwayBonus,
    requirements: Option<Arc<dyn RequirementSource>>,
    reference_only: bool,
    use_optimizer: bool,
    solver: Solver,
}

impl Default for RecommenderBuilder {
    fn default() -> Self {
        Self {
            strains: Vec::new(),
            peptones: Vec::new(),
            scoring: ScoringConfig::default(),
            optimizer: OptimizerConfig::default(),
            pathway_bonus: PathwayBonus::default(),
            requirements: None,
            reference_only: false,
            use_optimizer: true,
            solver: Solver::Local,
        }
    }
}

impl RecommenderBuilder {
    /// Creates a builder with default scoring and optimizer settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strains(mut self, strains: Vec<StrainProfile>) -> Self {
        self.strains = strains;
        self
    }

    pub fn with_peptones(mut self, peptones: Vec<PeptoneProduct>) -> Self {
        self.peptones = peptones;
        self
    }

    pub fn with_scoring_config(mut self, config: ScoringConfig) -> Self {
        self.scoring = config;
        self
    }

    pub fn with_optimizer_config(mut self, config: OptimizerConfig) -> Self {
        self.optimizer = config;
        self
    }

    pub fn with_pathway_bonus(mut self, bonus: PathwayBonus) -> Self {
        self.pathway_bonus = bonus;
        self
    }

    /// Enables pathway-aware scoring backed by `source`.
    pub fn with_requirement_source(mut self, source: Arc<dyn RequirementSource>) -> Self {
        self.requirements = Some(source);
        self
    }

    /// Restricts candidates to the reference manufacturer's products.
    pub fn reference_only(mut self, reference_only: bool) -> Self {
        self.reference_only = reference_only;
        self
    }

    /// When disabled, optimized-blend requests evaluate a fixed ratio grid instead.
    pub fn use_optimizer(mut self, use_optimizer: bool) -> Self {
        self.use_optimizer = use_optimizer;
        self
    }

    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    /// Consumes the builder and returns a configured `Recommender`.
    ///
    /// # Errors
    ///
    /// Returns a `PeptoforgeError` if either configuration is invalid, a
    /// peptone profile fails validation, or an identifier is duplicated.
    pub fn build(self) -> Result<Recommender, PeptoforgeError> {
        let catalogue = Catalogue::new(self.strains, self.peptones)?;
        let evaluator = BlendEvaluator::new(FitnessScorer::new(self.scoring)?);
        let optimizer = BlendOptimizer::new(self.optimizer)?;
        if !(0.0..=1.0).contains(&self.pathway_bonus.max_uplift) {
            return Err(PeptoforgeError::ConfigError(format!(
                "pathway uplift must lie in [0, 1], got {}",
                self.pathway_bonus.max_uplift
            )));
        }

        Ok(Recommender {
            catalogue,
            evaluator,
            optimizer,
            pathway_bonus: self.pathway_bonus,
            requirements: self.requirements,
            reference_only: self.reference_only,
            use_optimizer: self.use_optimizer,
            solver: self.solver,
        })
    }
}
