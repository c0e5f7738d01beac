pub mod prompt;
pub mod retry;

use crate::dimensions::Dimension;
use crate::errors::GatewayError;
use crate::model::{EvaluationScore, RagRow};
use crate::providers::llm::{JudgeGateway, JudgeRequest};
use retry::{RetryDecision, RetryPolicy};
use std::sync::Arc;

/// Obtains one score for one (row, dimension) pair, masking transient
/// gateway failures. Never fails: exhausted or non-retryable errors become a
/// degraded score of 0 whose reasoning carries the error.
#[derive(Clone)]
pub struct DimensionJudge {
    gateway: Arc<dyn JudgeGateway>,
    retry: RetryPolicy,
}

impl DimensionJudge {
    pub fn new(gateway: Arc<dyn JudgeGateway>, retry: RetryPolicy) -> Self {
        Self { gateway, retry }
    }

    pub fn provider_name(&self) -> &'static str {
        self.gateway.provider_name()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub async fn evaluate(
        &self,
        row: &RagRow,
        dimension: Dimension,
        temperature: f32,
    ) -> EvaluationScore {
        let request = JudgeRequest {
            dimension,
            system_instructions: prompt::system_instructions(dimension),
            user_content: prompt::user_content(row),
            temperature,
        };

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let outcome = self
                .gateway
                .invoke(&request)
                .await
                .and_then(|score| score.validate().map(|()| score));
            let err = match outcome {
                Ok(score) => return score,
                Err(err) => err,
            };

            match self.retry.decide(attempt, &err) {
                RetryDecision::Backoff(wait) => {
                    tracing::warn!(
                        dimension = %dimension,
                        attempt,
                        wait_secs = wait.as_secs_f64(),
                        error = %err,
                        "model is overloaded; retrying after backoff"
                    );
                    tokio::time::sleep(wait).await;
                }
                RetryDecision::RetryNow => {
                    tracing::warn!(
                        dimension = %dimension,
                        attempt,
                        error = %err,
                        "model returned an invalid score; retrying"
                    );
                }
                RetryDecision::Degrade => return self.degrade(dimension, attempt, &err),
            }
        }
    }

    fn degrade(&self, dimension: Dimension, attempts: u32, err: &GatewayError) -> EvaluationScore {
        tracing::warn!(
            dimension = %dimension,
            attempts,
            error = %err,
            "evaluation failed; recording degraded score"
        );
        let reasoning = match err {
            GatewayError::ValidationFailed(_) => format!(
                "Evaluation failed after all retries ({} attempts): {}",
                attempts, err
            ),
            _ => format!("API error: {}", err),
        };
        EvaluationScore::degraded(reasoning)
    }
}
