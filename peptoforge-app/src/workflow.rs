use crate::config::KnowledgeBase;
use crate::report::{self, ComplementRecord, OutcomeRecord, SimilarityRecord, TargetReport};
use crate::request::TargetRequest;
use anyhow::Result;
use peptoforge_core::{
    analysis::{blend_metrics, SimilarityMethod},
    optimizer::Solver,
    pathway::cache::{RequirementCache, StaticRequirements},
    recommendation::{FitnessResult, Recommender},
};
use peptoforge_schemas::strain::StrainProfile;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// Switches shared by every command.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output_root: PathBuf,
    pub reference_only: bool,
    pub use_optimizer: bool,
    pub solver: Solver,
}

/// Wires the knowledge base into a `Recommender`. Requirement data, when
/// present, is served through a cache.
pub fn build_recommender(kb: KnowledgeBase, options: &RunOptions) -> Result<Recommender> {
    let mut builder = Recommender::builder()
        .with_strains(kb.strains)
        .with_peptones(kb.peptones)
        .with_scoring_config(kb.scoring)
        .with_optimizer_config(kb.optimizer)
        .reference_only(options.reference_only)
        .use_optimizer(options.use_optimizer)
        .with_solver(options.solver);

    let requirements = StaticRequirements::from_organisms(&kb.requirements)?;
    if !requirements.is_empty() {
        println!("Pathway requirement data available for {} organisms.", requirements.len());
        builder = builder.with_requirement_source(Arc::new(RequirementCache::new(requirements)));
    }
    Ok(builder.build()?)
}

fn run_label(kind: &str, id: &str) -> String {
    let id: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{}_{}", kind, id)
}

fn category_line(strain: &StrainProfile) -> String {
    let category = strain.category();
    format!(
        "Category: {} ({}), key needs: {}",
        category.as_str(),
        category.description(),
        category.key_requirements().join(", ")
    )
}

fn print_results(results: &[FitnessResult]) {
    for (i, result) in results.iter().enumerate() {
        println!(
            "{:>3}. {:<40} score {:.4} (quality {:.3})",
            i + 1,
            result.description(),
            result.overall_score,
            result.metrics.quality_score
        );
        let breakdown = result
            .breakdown
            .entries()
            .iter()
            .map(|(name, value)| format!("{}={:.3}", name, value))
            .collect::<Vec<_>>()
            .join(" ");
        println!("     {}", breakdown);
        println!("     {}", result.rationale);
    }
}

fn finish(kind: &str, id: &str, results: &[FitnessResult], options: &RunOptions) -> Result<PathBuf> {
    print_results(results);
    let dir = report::create_run_dir(&options.output_root, &run_label(kind, id))?;
    report::write_recommendations(&dir, results)?;
    println!("Wrote {} results to '{}'", results.len(), dir.display());
    Ok(dir)
}

pub fn run_single(recommender: &Recommender, strain_id: &str, top_n: usize, options: &RunOptions) -> Result<PathBuf> {
    let strain = recommender.catalogue().strain(strain_id)?;
    println!("\n--- [Workflow] Single peptones for {} ---", strain.full_name());
    println!("{}", category_line(strain));
    let results = recommender.recommend_single(strain_id, top_n)?;
    finish("single", strain_id, &results, options)
}

pub fn run_blend(
    recommender: &Recommender,
    strain_id: &str,
    max_components: usize,
    top_n: usize,
    options: &RunOptions,
) -> Result<PathBuf> {
    let strain = recommender.catalogue().strain(strain_id)?;
    println!("\n--- [Workflow] Grid blends for {} ---", strain.full_name());
    println!("{}", category_line(strain));
    let results = recommender.recommend_blend(strain_id, max_components, top_n)?;
    finish("blend", strain_id, &results, options)
}

pub fn run_optimized(
    recommender: &Recommender,
    strain_id: &str,
    max_components: usize,
    top_n: usize,
    options: &RunOptions,
) -> Result<PathBuf> {
    let strain = recommender.catalogue().strain(strain_id)?;
    println!(
        "\n--- [Workflow] Optimized blends for {} ({}) ---",
        strain.full_name(),
        if options.use_optimizer { options.solver.name() } else { "ratio grid" }
    );
    println!("{}", category_line(strain));
    let results = recommender.recommend_optimized_blend(strain_id, max_components, top_n)?;
    finish("optimize", strain_id, &results, options)
}

pub fn run_target(recommender: &Recommender, request_path: &Path, options: &RunOptions) -> Result<PathBuf> {
    let request = TargetRequest::load(request_path)?;
    let weights = request.weight_vector();
    println!("\n--- [Workflow] Target matching for {} ---", request.peptones.join(", "));
    let outcome = recommender.optimize_target(
        &request.peptone_names(),
        &request.target,
        weights.as_ref(),
        request.solver,
        request.initial.as_deref(),
    )?;

    println!("Solver: {} ({} iterations)", outcome.solver.name(), outcome.iterations);
    println!("Blend: {}", outcome.description());
    println!("Objective: {:.6}", outcome.objective);
    if !outcome.success {
        println!("Warning: {}", outcome.message);
    }

    let peptones = request
        .peptone_names()
        .into_iter()
        .map(|name| recommender.catalogue().peptone(name))
        .collect::<Result<Vec<_>, _>>()?;
    let metrics = blend_metrics(&peptones, &outcome.ratios, Some(&request.target))?;
    println!(
        "Blend composition: TN {:.2}, AN {:.2}, quality {:.3}",
        metrics.total_nitrogen, metrics.amino_nitrogen, metrics.quality_score
    );

    let dir = report::create_run_dir(&options.output_root, "target")?;
    report::write_csv(&dir.join(report::RECOMMENDATIONS_CSV), &[OutcomeRecord::new(&outcome, &metrics)])?;
    report::write_json(
        &dir.join(report::RESULTS_JSON),
        &TargetReport { outcome: &outcome, metrics: &metrics },
    )?;
    println!("Wrote results to '{}'", dir.display());
    Ok(dir)
}

pub fn run_complement(
    recommender: &Recommender,
    peptone_name: &str,
    top_n: usize,
    options: &RunOptions,
) -> Result<PathBuf> {
    println!("\n--- [Workflow] Complements for {} ---", peptone_name);
    let records: Vec<ComplementRecord> = recommender
        .complements(peptone_name, top_n)?
        .iter()
        .enumerate()
        .map(|(i, complement)| ComplementRecord::new(i + 1, complement))
        .collect();
    for record in &records {
        println!(
            "{:>3}. {:<20} score {:.4} (diversity {:.3}, coverage {:.3})",
            record.rank, record.peptone, record.score, record.diversity, record.coverage
        );
    }

    let dir = report::create_run_dir(&options.output_root, &run_label("complement", peptone_name))?;
    report::write_csv(&dir.join(report::RECOMMENDATIONS_CSV), &records)?;
    report::write_json(&dir.join(report::RESULTS_JSON), &records)?;
    println!("Wrote {} results to '{}'", records.len(), dir.display());
    Ok(dir)
}

pub fn run_similar(
    recommender: &Recommender,
    peptone_name: &str,
    top_n: usize,
    method: SimilarityMethod,
    options: &RunOptions,
) -> Result<PathBuf> {
    println!("\n--- [Workflow] Products similar to {} ({:?}) ---", peptone_name, method);
    let records: Vec<SimilarityRecord> = recommender
        .similar(peptone_name, top_n, method)?
        .into_iter()
        .enumerate()
        .map(|(i, (peptone, similarity))| SimilarityRecord::new(i + 1, peptone, similarity))
        .collect();
    for record in &records {
        println!(
            "{:>3}. {:<20} similarity {:.4} (quality {:.3})",
            record.rank, record.peptone, record.similarity, record.quality_score
        );
    }

    let dir = report::create_run_dir(&options.output_root, &run_label("similar", peptone_name))?;
    report::write_csv(&dir.join(report::RECOMMENDATIONS_CSV), &records)?;
    report::write_json(&dir.join(report::RESULTS_JSON), &records)?;
    println!("Wrote {} results to '{}'", records.len(), dir.display());
    Ok(dir)
}
