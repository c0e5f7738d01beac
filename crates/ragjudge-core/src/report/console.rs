use crate::report::progress::{ProgressEvent, ProgressSink};
use crate::report::stats::RunSummary;
use crate::report::{ReportPaths, RunArtifacts};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Format a single progress line. Deterministic, unit-testable.
#[must_use]
pub fn format_progress_line(ev: &ProgressEvent) -> String {
    format!(
        "Evaluated row {}/{} (final score {:.2})",
        ev.done, ev.total, ev.final_score
    )
}

/// Minimum interval between progress lines.
const PROGRESS_MIN_INTERVAL_MS: u64 = 200;

/// Emit every row for small datasets, roughly every 10% for larger ones.
pub(crate) fn progress_step(total: usize) -> usize {
    if total <= 10 {
        1
    } else {
        std::cmp::max(1, total / 10)
    }
}

/// Returns a sink that throttles updates and prints them to stderr.
/// Always emits the first and the last row.
pub fn default_progress_sink(total: usize) -> Option<ProgressSink> {
    if total == 0 {
        return None;
    }
    let step = progress_step(total);
    let last_emit: Arc<Mutex<Option<Instant>>> = Arc::new(Mutex::new(None));
    Some(Arc::new(move |ev: ProgressEvent| {
        let now = Instant::now();
        let should_emit = {
            let mut last = last_emit.lock().unwrap_or_else(|p| p.into_inner());
            let emit_final = ev.done == ev.total;
            let emit_step = ev.done % step == 0 || ev.done == 1;
            let interval_ok = last
                .map(|t| {
                    now.saturating_duration_since(t)
                        >= Duration::from_millis(PROGRESS_MIN_INTERVAL_MS)
                })
                .unwrap_or(true);
            let ok = emit_final || (emit_step && interval_ok);
            if ok {
                *last = Some(now);
            }
            ok
        };
        if should_emit {
            eprintln!("{}", format_progress_line(&ev));
        }
    }))
}

/// Lines printed after a run: row count, average score, degraded dimensions,
/// and where the reports went.
pub fn format_run_summary(
    artifacts: &RunArtifacts,
    summary: &RunSummary,
    paths: &ReportPaths,
) -> Vec<String> {
    let mut lines = Vec::new();
    if artifacts.cancelled {
        lines.push(format!(
            "Evaluation cancelled after {}/{} rows.",
            summary.total_rows, artifacts.total_rows
        ));
    } else {
        lines.push("Evaluation complete.".to_string());
    }
    lines.push(format!("Rows evaluated: {}", summary.total_rows));
    lines.push(match summary.final_score.mean {
        Some(mean) => format!("Average final score: {mean:.2}"),
        None => "Average final score: n/a".to_string(),
    });
    lines.push(format!(
        "Degraded dimension scores: {}",
        summary.degraded_dimension_count
    ));
    lines.push(format!("Scored dataset saved to: {}", paths.scored_csv.display()));
    lines.push(format!("Aggregate stats saved to: {}", paths.aggregate_json.display()));
    lines.push(format!("Markdown report saved to: {}", paths.markdown.display()));
    lines
}

pub fn print_run_summary(artifacts: &RunArtifacts, summary: &RunSummary, paths: &ReportPaths) {
    eprintln!();
    for line in format_run_summary(artifacts, summary, paths) {
        eprintln!("{line}");
    }
}
