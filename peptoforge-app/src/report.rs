use anyhow::{Context, Result};
use peptoforge_core::{
    analysis::{quality_score, BlendMetrics},
    complementarity::Complement,
    optimizer::BlendOptimizationOutcome,
    recommendation::FitnessResult,
};
use peptoforge_schemas::peptone::PeptoneProduct;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const RECOMMENDATIONS_CSV: &str = "recommendations.csv";
pub const RESULTS_JSON: &str = "results.json";

/// Creates `<root>/<label>_<timestamp>` and returns its path.
pub fn create_run_dir(root: &Path, label: &str) -> Result<PathBuf> {
    let dir = root.join(format!("{}_{}", label, chrono::Utc::now().format("%Y%m%d_%H%M%S")));
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create output directory: {:?}", dir))?;
    Ok(dir)
}

#[derive(Debug, Serialize)]
pub struct ComplementRecord {
    pub rank: usize,
    pub peptone: String,
    pub raw_material: String,
    pub manufacturer: String,
    pub score: f64,
    pub diversity: f64,
    pub coverage: f64,
}

impl ComplementRecord {
    pub fn new(rank: usize, complement: &Complement<'_>) -> Self {
        Self {
            rank,
            peptone: complement.peptone.name.clone(),
            raw_material: complement.peptone.raw_material.clone(),
            manufacturer: complement.peptone.manufacturer.clone(),
            score: complement.score,
            diversity: complement.diversity,
            coverage: complement.coverage,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SimilarityRecord {
    pub rank: usize,
    pub peptone: String,
    pub raw_material: String,
    pub manufacturer: String,
    pub similarity: f64,
    pub quality_score: f64,
}

impl SimilarityRecord {
    pub fn new(rank: usize, peptone: &PeptoneProduct, similarity: f64) -> Self {
        Self {
            rank,
            peptone: peptone.name.clone(),
            raw_material: peptone.raw_material.clone(),
            manufacturer: peptone.manufacturer.clone(),
            similarity,
            quality_score: quality_score(&peptone.profile),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OutcomeRecord {
    pub description: String,
    pub solver: String,
    pub objective: f64,
    pub iterations: usize,
    pub success: bool,
    pub message: String,
    pub quality_score: f64,
    pub total_nitrogen: f64,
    pub amino_nitrogen: f64,
    pub target_deviation: Option<f64>,
}

impl OutcomeRecord {
    pub fn new(outcome: &BlendOptimizationOutcome, metrics: &BlendMetrics) -> Self {
        Self {
            description: outcome.description(),
            solver: outcome.solver.name().to_string(),
            objective: outcome.objective,
            iterations: outcome.iterations,
            success: outcome.success,
            message: outcome.message.clone(),
            quality_score: metrics.quality_score,
            total_nitrogen: metrics.total_nitrogen,
            amino_nitrogen: metrics.amino_nitrogen,
            target_deviation: metrics.target_deviation,
        }
    }
}

/// The solved blend together with its composition, as written to `results.json`.
#[derive(Debug, Serialize)]
pub struct TargetReport<'a> {
    pub outcome: &'a BlendOptimizationOutcome,
    pub metrics: &'a BlendMetrics,
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("Failed to create {:?}", path))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

/// Writes the ranked table and the full results of a recommendation run.
pub fn write_recommendations(dir: &Path, results: &[FitnessResult]) -> Result<()> {
    let records: Vec<_> = results
        .iter()
        .enumerate()
        .map(|(i, result)| result.to_record(i + 1))
        .collect();
    write_csv(&dir.join(RECOMMENDATIONS_CSV), &records)?;
    write_json(&dir.join(RESULTS_JSON), results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        rank: usize,
        name: &'static str,
        score: Option<f64>,
    }

    #[test]
    fn run_dir_is_created_under_root() {
        let root = tempfile::tempdir().unwrap();
        let dir = create_run_dir(root.path(), "single_KCCM").unwrap();
        assert!(dir.is_dir());
        assert!(dir.starts_with(root.path()));
        let name = dir.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("single_KCCM_"));
    }

    #[test]
    fn csv_has_a_header_and_one_line_per_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let rows = [
            Row { rank: 1, name: "SP-100", score: Some(0.9) },
            Row { rank: 2, name: "YE-A", score: None },
        ];
        write_csv(&path, &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["rank,name,score", "1,SP-100,0.9", "2,YE-A,"]);
    }

    #[test]
    fn json_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        write_json(&path, &[Row { rank: 1, name: "SP-100", score: None }]).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["name"], "SP-100");
        assert!(value[0]["score"].is_null());
    }
}
