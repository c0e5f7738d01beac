use crate::report::stats::{DimensionStats, RunSummary};
use serde::Serialize;
use std::path::Path;

/// On-disk shape of `aggregate_stats_<ts>.json`.
#[derive(Debug, Serialize)]
pub struct AggregateStats<'a> {
    pub total_rows_evaluated: usize,
    pub average_final_score: Option<f64>,
    pub median_final_score: Option<f64>,
    pub std_dev_final_score: Option<f64>,
    pub per_dimension_stats: &'a DimensionStats,
    pub degraded_dimension_count: usize,
}

impl<'a> From<&'a RunSummary> for AggregateStats<'a> {
    fn from(summary: &'a RunSummary) -> Self {
        Self {
            total_rows_evaluated: summary.total_rows,
            average_final_score: summary.final_score.mean,
            median_final_score: summary.final_score.median,
            std_dev_final_score: summary.final_score.std_dev,
            per_dimension_stats: &summary.per_dimension,
            degraded_dimension_count: summary.degraded_dimension_count,
        }
    }
}

pub fn write_aggregate_json(summary: &RunSummary, out: &Path) -> anyhow::Result<()> {
    let doc = AggregateStats::from(summary);
    std::fs::write(out, serde_json::to_string_pretty(&doc)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::DimensionTable;
    use crate::model::tests::uniform_scores;
    use crate::model::EvaluationResult;
    use crate::report::stats::summarize;

    #[test]
    fn aggregate_json_has_expected_fields() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("stats.json");
        let table = DimensionTable::standard();
        let results = vec![
            EvaluationResult::new(uniform_scores(4), &table),
            EvaluationResult::new(uniform_scores(8), &table),
        ];

        write_aggregate_json(&summarize(&results), &out).unwrap();

        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(v["total_rows_evaluated"], 2);
        assert!((v["average_final_score"].as_f64().unwrap() - 6.0).abs() < 1e-9);
        assert!((v["median_final_score"].as_f64().unwrap() - 6.0).abs() < 1e-9);
        assert_eq!(v["degraded_dimension_count"], 0);
        let relevance = &v["per_dimension_stats"]["Relevance"];
        assert_eq!(relevance["average_score"], 6.0);
        assert!(relevance["std_dev_score"].as_f64().unwrap() > 2.8);
        assert!(v["per_dimension_stats"]["Contextual Awareness"].is_object());
    }

    #[test]
    fn empty_run_writes_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("stats.json");

        write_aggregate_json(&summarize(&[]), &out).unwrap();

        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(v["total_rows_evaluated"], 0);
        assert!(v["average_final_score"].is_null());
        assert!(v["std_dev_final_score"].is_null());
    }
}
