//! Judge model gateway: the one seam between the scoring engine and a model.
//!
//! Implementations take a fully built prompt and return an
//! [`EvaluationScore`] or one of the [`GatewayError`] kinds. The judge
//! re-validates every returned score before accepting it.

pub mod fake;
pub mod gemini;

use crate::config::{JudgeProvider, JudgeSettings};
use crate::dimensions::Dimension;
use crate::errors::{ConfigError, GatewayError};
use crate::model::EvaluationScore;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct JudgeRequest {
    pub dimension: Dimension,
    pub system_instructions: String,
    pub user_content: String,
    pub temperature: f32,
}

#[async_trait]
pub trait JudgeGateway: Send + Sync {
    async fn invoke(&self, request: &JudgeRequest) -> Result<EvaluationScore, GatewayError>;

    fn provider_name(&self) -> &'static str;
}

/// Build the gateway selected by `settings`.
///
/// Fails with [`ConfigError::MissingCredential`] when the live provider has no
/// API key, before any row is read.
pub fn gateway_for(settings: &JudgeSettings) -> Result<Arc<dyn JudgeGateway>, ConfigError> {
    match settings.provider {
        JudgeProvider::Gemini => {
            let gateway = gemini::GeminiGateway::from_env(settings.model.clone())?
                .with_timeout(settings.timeout())
                .with_max_output_tokens(settings.max_output_tokens);
            Ok(Arc::new(gateway))
        }
        JudgeProvider::Fake => {
            let verdict = EvaluationScore::new(
                i64::from(settings.fake_score),
                format!("fake judge verdict ({})", settings.fake_score),
            )
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
            Ok(Arc::new(fake::FakeGateway::fixed(verdict)))
        }
    }
}

/// Parse a `{ "score": int, "reasoning": string }` object out of raw model text.
///
/// Leading prose and trailing text around the first JSON object are tolerated.
pub fn parse_verdict(text: &str) -> Result<EvaluationScore, GatewayError> {
    let text = text.trim();
    let start = text
        .find('{')
        .ok_or_else(|| GatewayError::validation("no JSON object found in judge output"))?;
    let val: serde_json::Value = serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<serde_json::Value>()
        .next()
        .ok_or_else(|| GatewayError::validation("no JSON object found in judge output"))?
        .map_err(|e| GatewayError::validation(format!("invalid JSON: {}", e)))?;

    let score = match val.get("score") {
        Some(v) => integer_score(v)?,
        None => return Err(GatewayError::validation("judge JSON missing 'score' field")),
    };
    let reasoning = val
        .get("reasoning")
        .and_then(|v| v.as_str())
        .ok_or_else(|| GatewayError::validation("judge JSON missing 'reasoning' field"))?;

    EvaluationScore::new(score, reasoning)
}

fn integer_score(v: &serde_json::Value) -> Result<i64, GatewayError> {
    if let Some(n) = v.as_i64() {
        return Ok(n);
    }
    // 7.0 is an integer score; 7.5 is not.
    match v.as_f64() {
        Some(f) if f.fract() == 0.0 && f.is_finite() => Ok(f as i64),
        _ => Err(GatewayError::validation(format!(
            "score must be an integer, got {}",
            v
        ))),
    }
}
