use super::report_fatal;
use crate::cli::args::RunArgs;
use crate::exit_codes;
use ragjudge_core::config::{self, load_config, validate_temperature, RunConfig};
use ragjudge_core::dataset::load_rows;
use ragjudge_core::providers::llm::gateway_for;
use ragjudge_core::report::console::{default_progress_sink, print_run_summary};
use ragjudge_core::report::{stats, write_all};
use ragjudge_core::{
    DimensionJudge, DimensionTable, JudgeProvider, RowEvaluator, RunArtifacts, RunError, Runner,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

pub(crate) async fn run(args: RunArgs, quiet: bool) -> anyhow::Result<i32> {
    let cfg = match resolve_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => return Ok(report_fatal(&e)),
    };
    if let Some(min) = args.min_score {
        if !min.is_finite() {
            return Ok(report_fatal(&RunError::invalid_args(format!(
                "--min-score must be a finite number, got {min}"
            ))));
        }
    }

    // Credentials are checked before the input is touched.
    let gateway = match gateway_for(&cfg.judge) {
        Ok(g) => g,
        Err(e) => return Ok(report_fatal(&RunError::from(e))),
    };

    let rows = match load_rows(&args.csv, args.limit) {
        Ok(rows) => rows,
        Err(e) => return Ok(report_fatal(&e)),
    };

    let table = DimensionTable::standard();
    if let Err(e) = table.validate() {
        return Ok(report_fatal(&RunError::from(e)));
    }
    let judge = DimensionJudge::new(gateway, cfg.retry_policy());
    let evaluator =
        RowEvaluator::new(judge, Arc::new(table)).with_mode(cfg.dimension_mode());
    let model = match cfg.judge.provider {
        JudgeProvider::Gemini => cfg.judge.model.clone(),
        JudgeProvider::Fake => JudgeProvider::Fake.to_string(),
    };
    let runner = Runner::new(evaluator, model);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; stopping after writing completed rows");
            let _ = cancel_tx.send(true);
        }
    });

    let progress = if quiet {
        None
    } else {
        default_progress_sink(rows.len())
    };
    let artifacts = runner
        .run_until_cancelled(&rows, cfg.judge.temperature, progress, cancel_rx)
        .await;
    ctrl_c.abort();

    let paths = match write_all(&artifacts, &args.output) {
        Ok(paths) => paths,
        Err(e) => return Ok(report_fatal(&e)),
    };
    let summary = stats::summarize(&artifacts.results);
    print_run_summary(&artifacts, &summary, &paths);

    Ok(decide_exit_code(&artifacts, summary.final_score.mean, args.min_score))
}

/// Defaults, then the config file, then command-line overrides.
fn resolve_config(args: &RunArgs) -> Result<RunConfig, RunError> {
    let mut cfg = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(RunError::missing_config(
                    path.display().to_string(),
                    "--config points at a file that does not exist",
                ));
            }
            load_config(path)?
        }
        None => {
            let default_path = Path::new(config::DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                load_config(default_path)?
            } else {
                RunConfig::default()
            }
        }
    };

    if let Some(provider) = &args.judge.provider {
        cfg.judge.provider = provider
            .parse()
            .map_err(|e: ragjudge_core::ConfigError| RunError::invalid_args(e.to_string()))?;
    }
    if let Some(model) = &args.judge.model {
        cfg.judge.model = model.clone();
    }
    if let Some(temperature) = args.temperature {
        validate_temperature(temperature).map_err(|e| RunError::invalid_args(e.to_string()))?;
        cfg.judge.temperature = temperature;
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Cancellation wins over the score gate. An empty run cannot pass a gate.
fn decide_exit_code(artifacts: &RunArtifacts, mean: Option<f64>, min_score: Option<f64>) -> i32 {
    if artifacts.cancelled {
        return exit_codes::CANCELLED;
    }
    match (min_score, mean) {
        (Some(min), Some(mean)) if mean < min => {
            eprintln!("Average final score {mean:.2} is below --min-score {min:.2}");
            exit_codes::SCORE_BELOW_THRESHOLD
        }
        (Some(min), None) => {
            eprintln!("No rows were evaluated; --min-score {min:.2} cannot be met");
            exit_codes::SCORE_BELOW_THRESHOLD
        }
        _ => exit_codes::SUCCESS,
    }
}
