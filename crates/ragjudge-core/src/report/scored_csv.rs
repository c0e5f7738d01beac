use crate::dimensions::Dimension;
use crate::model::EvaluationResult;
use anyhow::Context;
use std::path::Path;

/// Header row: `final_score`, then `<dim>_score` and `<dim>_reasoning` for
/// each dimension in fixed order.
pub fn header() -> Vec<String> {
    let mut columns = vec!["final_score".to_string()];
    for dim in Dimension::ALL {
        columns.push(format!("{}_score", dim.key()));
        columns.push(format!("{}_reasoning", dim.key()));
    }
    columns
}

fn record(result: &EvaluationResult) -> Vec<String> {
    let mut fields = vec![format!("{:.2}", result.final_score())];
    for (_, score) in result.scores().iter() {
        fields.push(score.score().to_string());
        fields.push(score.reasoning().to_string());
    }
    fields
}

pub fn write_scored_csv(results: &[EvaluationResult], out: &Path) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(out)
        .with_context(|| format!("failed to create {}", out.display()))?;
    writer.write_record(header())?;
    for result in results {
        writer.write_record(record(result))?;
    }
    writer.flush()?;
    Ok(())
}
