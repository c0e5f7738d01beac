use crate::engine::row::RowEvaluator;
use crate::model::RagRow;
use crate::report::progress::{ProgressEvent, ProgressSink};
use crate::report::RunArtifacts;
use tokio::sync::watch;
use tracing::Instrument;

/// Drives the row evaluator over a dataset, one row at a time, in input order.
#[derive(Clone)]
pub struct Runner {
    pub evaluator: RowEvaluator,
    pub model: String,
}

impl Runner {
    pub fn new(evaluator: RowEvaluator, model: impl Into<String>) -> Self {
        Self {
            evaluator,
            model: model.into(),
        }
    }

    /// Evaluate every row. `results[i]` always belongs to `rows[i]`.
    pub async fn run(
        &self,
        rows: &[RagRow],
        temperature: f32,
        progress: Option<ProgressSink>,
    ) -> RunArtifacts {
        let (_keep_open, never) = watch::channel(false);
        self.run_until_cancelled(rows, temperature, progress, never)
            .await
    }

    /// Like [`Runner::run`], but stops as soon as `cancel` flips to `true`.
    ///
    /// The row in flight at that moment is dropped along with its pending judge
    /// calls; rows already finished stay in the artifacts and `cancelled` is set.
    pub async fn run_until_cancelled(
        &self,
        rows: &[RagRow],
        temperature: f32,
        progress: Option<ProgressSink>,
        mut cancel: watch::Receiver<bool>,
    ) -> RunArtifacts {
        let total = rows.len();
        let mut artifacts = RunArtifacts::begin(
            self.evaluator.judge().provider_name(),
            &self.model,
            temperature,
            total,
        );
        tracing::info!(
            rows = total,
            provider = %artifacts.provider,
            model = %artifacts.model,
            temperature,
            "starting evaluation"
        );

        for (index, row) in rows.iter().enumerate() {
            if *cancel.borrow() {
                artifacts.cancelled = true;
                break;
            }

            let span = tracing::info_span!("row", index, of = total);
            let evaluation = self
                .evaluator
                .evaluate_row(row, temperature)
                .instrument(span);
            let outcome = tokio::select! {
                biased;
                _ = cancel_requested(&mut cancel) => None,
                result = evaluation => Some(result),
            };
            let Some(result) = outcome else {
                tracing::warn!(
                    completed = artifacts.results.len(),
                    total,
                    "evaluation cancelled; keeping completed rows"
                );
                artifacts.cancelled = true;
                break;
            };

            tracing::info!(
                row = index + 1,
                total,
                final_score = result.final_score(),
                degraded = result.degraded_count(),
                "row evaluated"
            );
            let final_score = result.final_score();
            artifacts.results.push(result);
            if let Some(sink) = &progress {
                sink(ProgressEvent {
                    done: index + 1,
                    total,
                    final_score,
                });
            }
        }

        artifacts.finish();
        artifacts
    }
}

/// Resolves once cancellation is requested. A dropped sender never cancels.
async fn cancel_requested(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|flag| *flag).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::{Dimension, DimensionTable};
    use crate::errors::GatewayError;
    use crate::judge::retry::RetryPolicy;
    use crate::judge::DimensionJudge;
    use crate::model::EvaluationScore;
    use crate::providers::llm::fake::FakeGateway;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn rows(n: usize) -> Vec<RagRow> {
        (0..n)
            .map(|i| RagRow::new(format!("question {i}"), "", "context", "answer"))
            .collect()
    }

    fn runner(fake: Arc<FakeGateway>) -> Runner {
        let judge = DimensionJudge::new(fake, RetryPolicy::default());
        let evaluator = RowEvaluator::new(judge, Arc::new(DimensionTable::standard()));
        Runner::new(evaluator, "fake-model")
    }

    #[tokio::test]
    async fn every_row_gets_exactly_one_result_in_order() {
        let fake = Arc::new(FakeGateway::fixed(EvaluationScore::new(6, "ok").unwrap()));
        let input = rows(4);

        let artifacts = runner(fake.clone()).run(&input, 0.0, None).await;

        assert_eq!(artifacts.results.len(), 4);
        assert_eq!(artifacts.total_rows, 4);
        assert!(!artifacts.cancelled);
        assert_eq!(fake.call_count(), 4 * 6);
        let questions: Vec<String> = fake
            .calls()
            .iter()
            .map(|c| c.request.user_content.clone())
            .collect();
        // Rows are processed strictly one after another.
        for (i, chunk) in questions.chunks(6).enumerate() {
            assert!(chunk.iter().all(|q| q.contains(&format!("question {i}"))));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn total_gateway_failure_still_yields_one_result_per_row() {
        let fake = Arc::new(FakeGateway::failing(GatewayError::transport(
            "connection refused",
        )));

        let artifacts = runner(fake).run(&rows(3), 0.0, None).await;

        assert_eq!(artifacts.results.len(), 3);
        for result in &artifacts.results {
            assert_eq!(result.final_score(), 0.0);
            assert_eq!(result.degraded_count(), Dimension::ALL.len());
        }
    }

    #[tokio::test]
    async fn empty_dataset_produces_empty_artifacts() {
        let fake = Arc::new(FakeGateway::fixed(EvaluationScore::new(6, "ok").unwrap()));
        let artifacts = runner(fake.clone()).run(&[], 0.0, None).await;
        assert!(artifacts.results.is_empty());
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn progress_sink_sees_each_completed_row() {
        let fake = Arc::new(FakeGateway::fixed(EvaluationScore::new(10, "great").unwrap()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let sink: ProgressSink = Arc::new(move |ev: ProgressEvent| {
            sink_seen.lock().unwrap().push((ev.done, ev.total, ev.final_score));
        });

        runner(fake).run(&rows(3), 0.0, Some(sink)).await;

        let seen = seen.lock().unwrap();
        let counts: Vec<(usize, usize)> = seen.iter().map(|&(d, t, _)| (d, t)).collect();
        assert_eq!(counts, vec![(1, 3), (2, 3), (3, 3)]);
        assert!(seen.iter().all(|&(_, _, s)| (s - 10.0).abs() < 1e-9));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_keeps_completed_rows_only() {
        // Row 0 succeeds at once; row 1 keeps backing off on overload.
        let fake = Arc::new(
            FakeGateway::failing(GatewayError::overloaded(503, "busy")).with_script(
                std::iter::repeat_with(|| Ok(EvaluationScore::new(7, "fine").unwrap())).take(6),
            ),
        );
        let (tx, rx) = watch::channel(false);
        let runner = runner(fake);
        let input = rows(3);

        let handle = tokio::spawn(async move {
            runner.run_until_cancelled(&input, 0.0, None, rx).await
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        tx.send(true).unwrap();
        let artifacts = handle.await.unwrap();

        assert!(artifacts.cancelled);
        assert_eq!(artifacts.results.len(), 1);
        assert_eq!(artifacts.total_rows, 3);
        assert!((artifacts.results[0].final_score() - 7.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn already_cancelled_run_evaluates_nothing() {
        let fake = Arc::new(FakeGateway::fixed(EvaluationScore::new(6, "ok").unwrap()));
        let (_tx, rx) = watch::channel(true);

        let artifacts = runner(fake.clone())
            .run_until_cancelled(&rows(2), 0.0, None, rx)
            .await;

        assert!(artifacts.cancelled);
        assert!(artifacts.results.is_empty());
        assert_eq!(fake.call_count(), 0);
    }
}
