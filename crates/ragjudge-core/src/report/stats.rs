use crate::dimensions::Dimension;
use crate::model::EvaluationResult;
use serde::ser::{Serialize, Serializer};

/// Rows listed in the failure-case section of the report.
pub const LOWEST_ROWS: usize = 5;

/// Mean, median and sample standard deviation of one score column.
/// `None` where the statistic is undefined for the sample size.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize)]
pub struct ScoreStats {
    #[serde(rename = "average_score")]
    pub mean: Option<f64>,
    #[serde(rename = "median_score")]
    pub median: Option<f64>,
    #[serde(rename = "std_dev_score")]
    pub std_dev: Option<f64>,
}

impl ScoreStats {
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            mean: mean(values),
            median: median(values),
            std_dev: sample_std_dev(values),
        }
    }
}

/// Per-dimension statistics in `Dimension::ALL` order. Serializes as a map
/// keyed by display name, preserving that order.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionStats(pub Vec<(Dimension, ScoreStats)>);

impl DimensionStats {
    pub fn get(&self, dim: Dimension) -> Option<&ScoreStats> {
        self.0.iter().find(|(d, _)| *d == dim).map(|(_, s)| s)
    }
}

impl Serialize for DimensionStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(d, s)| (d.display_name(), s)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total_rows: usize,
    pub final_score: ScoreStats,
    pub per_dimension: DimensionStats,
    pub degraded_dimension_count: usize,
    /// Indices of the lowest final scores, ascending, ties by lower index.
    pub lowest_rows: Vec<usize>,
}

pub fn summarize(results: &[EvaluationResult]) -> RunSummary {
    let finals: Vec<f64> = results.iter().map(EvaluationResult::final_score).collect();
    let per_dimension = Dimension::ALL
        .into_iter()
        .map(|dim| {
            let column: Vec<f64> = results
                .iter()
                .map(|r| f64::from(r.score(dim).score()))
                .collect();
            (dim, ScoreStats::from_values(&column))
        })
        .collect();

    RunSummary {
        total_rows: results.len(),
        final_score: ScoreStats::from_values(&finals),
        per_dimension: DimensionStats(per_dimension),
        degraded_dimension_count: results.iter().map(EvaluationResult::degraded_count).sum(),
        lowest_rows: lowest_rows(results, LOWEST_ROWS),
    }
}

pub fn lowest_rows(results: &[EvaluationResult], n: usize) -> Vec<usize> {
    let mut indexed: Vec<(usize, f64)> = results
        .iter()
        .map(EvaluationResult::final_score)
        .enumerate()
        .collect();
    indexed.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    indexed.into_iter().take(n).map(|(i, _)| i).collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample (n-1) standard deviation; undefined below two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}
