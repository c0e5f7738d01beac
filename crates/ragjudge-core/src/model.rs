use crate::dimensions::{Dimension, DimensionTable};
use crate::errors::GatewayError;
use serde::{Deserialize, Serialize};

/// Lowest and highest score a judge may give.
pub const MIN_SCORE: i64 = 0;
pub const MAX_SCORE: i64 = 10;

/// One unit of evaluation input. Missing source fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagRow {
    #[serde(default)]
    pub current_user_question: String,
    #[serde(default)]
    pub conversation_history: String,
    #[serde(default)]
    pub fragment_texts: String,
    #[serde(default)]
    pub assistant_answer: String,
}

impl RagRow {
    pub fn new(
        current_user_question: impl Into<String>,
        conversation_history: impl Into<String>,
        fragment_texts: impl Into<String>,
        assistant_answer: impl Into<String>,
    ) -> Self {
        Self {
            current_user_question: current_user_question.into(),
            conversation_history: conversation_history.into(),
            fragment_texts: fragment_texts.into(),
            assistant_answer: assistant_answer.into(),
        }
    }

    /// Blank (whitespace-only) history counts as "no prior turns".
    pub fn has_history(&self) -> bool {
        !self.conversation_history.trim().is_empty()
    }
}

/// One dimension's verdict. Built by [`EvaluationScore::new`],
/// [`EvaluationScore::degraded`] or a checked deserialize, so the score is
/// always within `MIN_SCORE..=MAX_SCORE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScoreRecord")]
pub struct EvaluationScore {
    score: u8,
    reasoning: String,
    /// Set only on fallback scores produced after the judge gave up.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    degraded: bool,
}

impl EvaluationScore {
    /// Accept a judge verdict. Out-of-range scores and empty reasoning are
    /// validation failures, never clamped.
    pub fn new(score: i64, reasoning: impl Into<String>) -> Result<Self, GatewayError> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(GatewayError::validation(format!(
                "score {} outside {}..={}",
                score, MIN_SCORE, MAX_SCORE
            )));
        }
        let reasoning = reasoning.into();
        if reasoning.trim().is_empty() {
            return Err(GatewayError::validation("reasoning is empty"));
        }
        Ok(Self {
            score: score as u8,
            reasoning,
            degraded: false,
        })
    }

    /// Score-0 fallback carrying the reason the judge gave up.
    pub fn degraded(reasoning: impl Into<String>) -> Self {
        Self {
            score: 0,
            reasoning: reasoning.into(),
            degraded: true,
        }
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Check a verdict handed back by a gateway before it is accepted.
    /// Fallback scores are produced by the judge only, never by a gateway.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.degraded {
            return Err(GatewayError::validation(
                "gateway returned a fallback score",
            ));
        }
        Self::new(i64::from(self.score), self.reasoning.as_str()).map(|_| ())
    }

    /// Bypasses validation to stand in for a misbehaving gateway.
    #[cfg(test)]
    pub(crate) fn unchecked(score: u8, reasoning: &str) -> Self {
        Self {
            score,
            reasoning: reasoning.to_string(),
            degraded: false,
        }
    }
}

/// Wire shape of [`EvaluationScore`]; deserialization goes through the same
/// checks as construction.
#[derive(Deserialize)]
struct ScoreRecord {
    score: i64,
    reasoning: String,
    #[serde(default)]
    degraded: bool,
}

impl TryFrom<ScoreRecord> for EvaluationScore {
    type Error = GatewayError;

    fn try_from(record: ScoreRecord) -> Result<Self, Self::Error> {
        if !record.degraded {
            return Self::new(record.score, record.reasoning);
        }
        if record.score != 0 {
            return Err(GatewayError::validation(format!(
                "degraded score must be 0, got {}",
                record.score
            )));
        }
        Ok(Self::degraded(record.reasoning))
    }
}

/// The six dimension verdicts of one row, one slot per dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub relevance: EvaluationScore,
    pub groundedness: EvaluationScore,
    pub completeness: EvaluationScore,
    pub factual_accuracy: EvaluationScore,
    pub coherence: EvaluationScore,
    pub contextual_awareness: EvaluationScore,
}

impl DimensionScores {
    pub fn get(&self, dim: Dimension) -> &EvaluationScore {
        match dim {
            Dimension::Relevance => &self.relevance,
            Dimension::Groundedness => &self.groundedness,
            Dimension::Completeness => &self.completeness,
            Dimension::FactualAccuracy => &self.factual_accuracy,
            Dimension::Coherence => &self.coherence,
            Dimension::ContextualAwareness => &self.contextual_awareness,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &EvaluationScore)> + '_ {
        Dimension::ALL.into_iter().map(move |d| (d, self.get(d)))
    }
}

/// Aggregate verdict for one row. Built once all six dimensions resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ResultRecord")]
pub struct EvaluationResult {
    #[serde(flatten)]
    scores: DimensionScores,
    final_score: f64,
}

impl EvaluationResult {
    pub fn new(scores: DimensionScores, table: &DimensionTable) -> Self {
        let final_score = table.weighted_sum(|d| scores.get(d).score());
        Self {
            scores,
            final_score,
        }
    }

    pub fn final_score(&self) -> f64 {
        self.final_score
    }

    pub fn score(&self, dim: Dimension) -> &EvaluationScore {
        self.scores.get(dim)
    }

    pub fn scores(&self) -> &DimensionScores {
        &self.scores
    }

    pub fn degraded_count(&self) -> usize {
        self.scores.iter().filter(|(_, s)| s.is_degraded()).count()
    }
}

#[derive(Deserialize)]
struct ResultRecord {
    #[serde(flatten)]
    scores: DimensionScores,
    final_score: f64,
}

impl TryFrom<ResultRecord> for EvaluationResult {
    type Error = GatewayError;

    fn try_from(record: ResultRecord) -> Result<Self, Self::Error> {
        // Weighted sums of in-range scores may overshoot by float rounding.
        let bounds = MIN_SCORE as f64 - 1e-9..=MAX_SCORE as f64 + 1e-9;
        if !bounds.contains(&record.final_score) {
            return Err(GatewayError::validation(format!(
                "final score {} outside {}..={}",
                record.final_score, MIN_SCORE, MAX_SCORE
            )));
        }
        Ok(Self {
            scores: record.scores,
            final_score: record.final_score,
        })
    }
}
