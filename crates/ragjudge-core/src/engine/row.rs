use crate::dimensions::{Dimension, DimensionTable};
use crate::judge::DimensionJudge;
use crate::model::{DimensionScores, EvaluationResult, EvaluationScore, RagRow};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How the six dimension judges of one row are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionMode {
    /// Fan out all six calls and join them before building the row result.
    #[default]
    Concurrent,
    /// One dimension at a time, in `Dimension::ALL` order.
    Sequential,
}

#[derive(Clone)]
pub struct RowEvaluator {
    judge: DimensionJudge,
    table: Arc<DimensionTable>,
    mode: DimensionMode,
}

impl RowEvaluator {
    pub fn new(judge: DimensionJudge, table: Arc<DimensionTable>) -> Self {
        Self {
            judge,
            table,
            mode: DimensionMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: DimensionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn judge(&self) -> &DimensionJudge {
        &self.judge
    }

    pub fn table(&self) -> &DimensionTable {
        &self.table
    }

    /// Score `row` on every dimension and combine the six scores.
    ///
    /// The result exists only once all six judges have resolved; dropping the
    /// returned future drops every in-flight judge call with it.
    pub async fn evaluate_row(&self, row: &RagRow, temperature: f32) -> EvaluationResult {
        let scores = match self.mode {
            DimensionMode::Concurrent => {
                let (
                    relevance,
                    groundedness,
                    completeness,
                    factual_accuracy,
                    coherence,
                    contextual_awareness,
                ) = futures::join!(
                    self.judge_one(row, Dimension::Relevance, temperature),
                    self.judge_one(row, Dimension::Groundedness, temperature),
                    self.judge_one(row, Dimension::Completeness, temperature),
                    self.judge_one(row, Dimension::FactualAccuracy, temperature),
                    self.judge_one(row, Dimension::Coherence, temperature),
                    self.judge_one(row, Dimension::ContextualAwareness, temperature),
                );
                DimensionScores {
                    relevance,
                    groundedness,
                    completeness,
                    factual_accuracy,
                    coherence,
                    contextual_awareness,
                }
            }
            DimensionMode::Sequential => DimensionScores {
                relevance: self.judge_one(row, Dimension::Relevance, temperature).await,
                groundedness: self.judge_one(row, Dimension::Groundedness, temperature).await,
                completeness: self.judge_one(row, Dimension::Completeness, temperature).await,
                factual_accuracy: self
                    .judge_one(row, Dimension::FactualAccuracy, temperature)
                    .await,
                coherence: self.judge_one(row, Dimension::Coherence, temperature).await,
                contextual_awareness: self
                    .judge_one(row, Dimension::ContextualAwareness, temperature)
                    .await,
            },
        };
        EvaluationResult::new(scores, &self.table)
    }

    async fn judge_one(&self, row: &RagRow, dimension: Dimension, temperature: f32) -> EvaluationScore {
        tracing::debug!(dimension = %dimension, "evaluating dimension");
        let score = self.judge.evaluate(row, dimension, temperature).await;
        tracing::info!(
            dimension = %dimension,
            score = score.score(),
            degraded = score.is_degraded(),
            "dimension evaluated"
        );
        score
    }
}
