pub mod console;
pub mod json;
pub mod markdown;
pub mod progress;
pub mod scored_csv;
pub mod stats;

use crate::errors::RunError;
use crate::model::EvaluationResult;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Format of the timestamp embedded in report file names.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Everything the report writers need from one run. `results[i]` belongs to
/// input row `i`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunArtifacts {
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    /// Rows in the input dataset; may exceed `results.len()` when cancelled.
    pub total_rows: usize,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<EvaluationResult>,
}

impl RunArtifacts {
    pub fn begin(provider: &str, model: &str, temperature: f32, total_rows: usize) -> Self {
        let now = Utc::now();
        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            temperature,
            total_rows,
            cancelled: false,
            started_at: now,
            finished_at: now,
            results: Vec::with_capacity(total_rows),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    pub fn degraded_count(&self) -> usize {
        self.results.iter().map(EvaluationResult::degraded_count).sum()
    }
}

/// Paths of the three files written by [`write_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub scored_csv: PathBuf,
    pub aggregate_json: PathBuf,
    pub markdown: PathBuf,
}

impl ReportPaths {
    pub fn new(out_dir: &Path, timestamp: &str) -> Self {
        Self {
            scored_csv: out_dir.join(format!("scored_dataset_{timestamp}.csv")),
            aggregate_json: out_dir.join(format!("aggregate_stats_{timestamp}.json")),
            markdown: out_dir.join(format!("evaluation_report_{timestamp}.md")),
        }
    }
}

/// Write the scored CSV, aggregate JSON and Markdown report into `out_dir`,
/// creating it if needed. All three share one local-time timestamp.
pub fn write_all(artifacts: &RunArtifacts, out_dir: &Path) -> Result<ReportPaths, RunError> {
    let now = Local::now();
    write_all_at(artifacts, out_dir, &now)
}

pub fn write_all_at(
    artifacts: &RunArtifacts,
    out_dir: &Path,
    generated_at: &DateTime<Local>,
) -> Result<ReportPaths, RunError> {
    std::fs::create_dir_all(out_dir)
        .map_err(|e| RunError::output(out_dir.display().to_string(), e.to_string()))?;

    let paths = ReportPaths::new(out_dir, &generated_at.format(FILE_TIMESTAMP_FORMAT).to_string());
    let summary = stats::summarize(&artifacts.results);

    scored_csv::write_scored_csv(&artifacts.results, &paths.scored_csv)
        .map_err(|e| output_error(&paths.scored_csv, &e))?;
    json::write_aggregate_json(&summary, &paths.aggregate_json)
        .map_err(|e| output_error(&paths.aggregate_json, &e))?;
    markdown::write_markdown_report(artifacts, &summary, generated_at, &paths.markdown)
        .map_err(|e| output_error(&paths.markdown, &e))?;

    tracing::info!(
        csv = %paths.scored_csv.display(),
        json = %paths.aggregate_json.display(),
        markdown = %paths.markdown.display(),
        "reports written"
    );
    Ok(paths)
}

fn output_error(path: &Path, err: &anyhow::Error) -> RunError {
    RunError::output(path.display().to_string(), format!("{err:#}"))
}
