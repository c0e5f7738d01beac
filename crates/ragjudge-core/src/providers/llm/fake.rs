use super::{JudgeGateway, JudgeRequest};
use crate::dimensions::Dimension;
use crate::errors::GatewayError;
use crate::model::EvaluationScore;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::time::Instant;

pub type FakeOutcome = Result<EvaluationScore, GatewayError>;

/// One recorded gateway invocation.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub request: JudgeRequest,
    pub at: Instant,
}

/// Deterministic gateway for dry runs and tests.
///
/// Outcomes are taken from the per-dimension script first, then the shared
/// script, then the fallback outcome.
#[derive(Debug)]
pub struct FakeGateway {
    fallback: FakeOutcome,
    script: Mutex<VecDeque<FakeOutcome>>,
    per_dimension: Mutex<HashMap<Dimension, VecDeque<FakeOutcome>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeGateway {
    fn with_fallback(fallback: FakeOutcome) -> Self {
        Self {
            fallback,
            script: Mutex::new(VecDeque::new()),
            per_dimension: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always answers with the same verdict.
    pub fn fixed(verdict: EvaluationScore) -> Self {
        Self::with_fallback(Ok(verdict))
    }

    /// Always fails with `err`.
    pub fn failing(err: GatewayError) -> Self {
        Self::with_fallback(Err(err))
    }

    /// Serve `outcomes` in order, then fail with a transport error.
    pub fn scripted(outcomes: impl IntoIterator<Item = FakeOutcome>) -> Self {
        Self::with_fallback(Err(GatewayError::transport("no more scripted responses")))
            .with_script(outcomes)
    }

    pub fn with_script(self, outcomes: impl IntoIterator<Item = FakeOutcome>) -> Self {
        self.lock_script().extend(outcomes);
        self
    }

    pub fn with_dimension_script(
        self,
        dimension: Dimension,
        outcomes: impl IntoIterator<Item = FakeOutcome>,
    ) -> Self {
        self.per_dimension
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .entry(dimension)
            .or_default()
            .extend(outcomes);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn calls_for(&self, dimension: Dimension) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.request.dimension == dimension)
            .collect()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<FakeOutcome>> {
        self.script.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn next_outcome(&self, dimension: Dimension) -> FakeOutcome {
        let scripted = self
            .per_dimension
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get_mut(&dimension)
            .and_then(|q| q.pop_front());
        scripted
            .or_else(|| self.lock_script().pop_front())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl JudgeGateway for FakeGateway {
    async fn invoke(&self, request: &JudgeRequest) -> Result<EvaluationScore, GatewayError> {
        self.calls
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(RecordedCall {
                request: request.clone(),
                at: Instant::now(),
            });
        self.next_outcome(request.dimension)
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
