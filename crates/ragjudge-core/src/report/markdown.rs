use crate::report::stats::RunSummary;
use crate::report::RunArtifacts;
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::path::Path;

fn fmt_stat(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |x| format!("{x:.2}"))
}

pub fn render_markdown_report(
    artifacts: &RunArtifacts,
    summary: &RunSummary,
    generated_at: &DateTime<Local>,
) -> Result<String, std::fmt::Error> {
    let mut md = String::new();
    writeln!(md, "# RAG Evaluation Report\n")?;
    writeln!(
        md,
        "**Report generated on:** {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(
        md,
        "**Judge:** {} ({}), temperature {}\n",
        artifacts.provider, artifacts.model, artifacts.temperature
    )?;

    writeln!(md, "## Executive Summary\n")?;
    writeln!(md, "- **Total Rows Evaluated:** {}", summary.total_rows)?;
    writeln!(
        md,
        "- **Average Final Score:** {}",
        fmt_stat(summary.final_score.mean)
    )?;
    writeln!(
        md,
        "- **Median Final Score:** {}",
        fmt_stat(summary.final_score.median)
    )?;
    writeln!(
        md,
        "- **Degraded Dimension Scores:** {}",
        summary.degraded_dimension_count
    )?;
    if artifacts.cancelled {
        writeln!(
            md,
            "- **Run cancelled:** {} of {} rows evaluated",
            summary.total_rows, artifacts.total_rows
        )?;
    }
    writeln!(md)?;

    writeln!(md, "## Dimension-wise Analysis\n")?;
    writeln!(md, "| Dimension            | Average Score | Median Score | Std Dev |")?;
    writeln!(md, "|----------------------|---------------|--------------|---------|")?;
    for (dim, stats) in &summary.per_dimension.0 {
        writeln!(
            md,
            "| {:<20} | {:<13} | {:<12} | {:<7} |",
            dim.display_name(),
            fmt_stat(stats.mean),
            fmt_stat(stats.median),
            fmt_stat(stats.std_dev)
        )?;
    }
    writeln!(md)?;

    writeln!(md, "## Failure Case Analysis\n")?;
    if summary.lowest_rows.is_empty() {
        writeln!(md, "No rows were evaluated.")?;
        return Ok(md);
    }
    writeln!(
        md,
        "Top {} lowest-scoring rows:\n",
        summary.lowest_rows.len()
    )?;
    for &index in &summary.lowest_rows {
        let Some(result) = artifacts.results.get(index) else {
            continue;
        };
        writeln!(
            md,
            "### Row Index: {} (Final Score: {:.2})",
            index,
            result.final_score()
        )?;
        for (dim, score) in result.scores().iter() {
            writeln!(
                md,
                "- **{}:** {} - *{}*",
                dim.display_name(),
                score.score(),
                score.reasoning()
            )?;
        }
        writeln!(md)?;
    }
    Ok(md)
}

pub fn write_markdown_report(
    artifacts: &RunArtifacts,
    summary: &RunSummary,
    generated_at: &DateTime<Local>,
    out: &Path,
) -> anyhow::Result<()> {
    let md = render_markdown_report(artifacts, summary, generated_at)?;
    std::fs::write(out, md)?;
    Ok(())
}
