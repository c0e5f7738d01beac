use super::{parse_verdict, JudgeGateway, JudgeRequest};
use crate::errors::{ConfigError, GatewayError};
use crate::model::EvaluationScore;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Status the service uses to signal a temporarily overloaded model.
const OVERLOADED_STATUS: u16 = 503;

pub struct GeminiGateway {
    pub model: String,
    api_key: String,
    pub max_output_tokens: u32,
    pub timeout: Duration,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiGateway {
    pub fn new(model: String, api_key: String) -> Self {
        Self {
            model,
            api_key,
            max_output_tokens: 1024,
            timeout: Duration::from_secs(60),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Create from environment; fails when `GEMINI_API_KEY` is unset or blank.
    pub fn from_env(model: String) -> Result<Self, ConfigError> {
        let key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingCredential {
                var: API_KEY_ENV.to_string(),
            })?;
        Ok(Self::new(model, key))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Request body with a JSON response schema so the model answers with
/// `{score, reasoning}` only.
pub(crate) fn build_request_body(request: &JudgeRequest, max_output_tokens: u32) -> serde_json::Value {
    json!({
        "systemInstruction": {
            "parts": [{ "text": request.system_instructions }]
        },
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.user_content }]
        }],
        "generationConfig": {
            "temperature": request.temperature,
            "maxOutputTokens": max_output_tokens,
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "score": {
                        "type": "INTEGER",
                        "description": "The score from 0 to 10."
                    },
                    "reasoning": {
                        "type": "STRING",
                        "description": "The reasoning behind the score."
                    }
                },
                "required": ["score", "reasoning"]
            }
        }
    })
}

/// Concatenated text parts of the first candidate.
pub(crate) fn extract_text(body: &serde_json::Value) -> Result<String, GatewayError> {
    let parts = body
        .pointer("/candidates/0/content/parts")
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            let reason = body
                .pointer("/candidates/0/finishReason")
                .or_else(|| body.pointer("/promptFeedback/blockReason"))
                .and_then(|v| v.as_str())
                .unwrap_or("no candidates");
            GatewayError::validation(format!("Gemini response has no content ({})", reason))
        })?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();
    if text.trim().is_empty() {
        return Err(GatewayError::validation("Gemini response text is empty"));
    }
    Ok(text)
}

#[async_trait]
impl JudgeGateway for GeminiGateway {
    async fn invoke(&self, request: &JudgeRequest) -> Result<EvaluationScore, GatewayError> {
        let body = build_request_body(request, self.max_output_tokens);

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::transport(format!(
                        "Gemini request timed out after {}s",
                        self.timeout.as_secs()
                    ))
                } else {
                    GatewayError::transport(format!("Gemini request failed: {}", e))
                }
            })?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            if status == OVERLOADED_STATUS {
                return Err(GatewayError::overloaded(status, error_text));
            }
            return Err(GatewayError::transport(format!(
                "Gemini API error (status {}): {}",
                status, error_text
            )));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| GatewayError::transport(format!("Gemini response is not JSON: {}", e)))?;

        let text = extract_text(&json)?;
        parse_verdict(&text)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::Dimension;

    fn request() -> JudgeRequest {
        JudgeRequest {
            dimension: Dimension::Groundedness,
            system_instructions: "judge groundedness".into(),
            user_content: "the row".into(),
            temperature: 0.3,
        }
    }

    #[test]
    fn body_carries_prompt_temperature_and_schema() {
        let body = build_request_body(&request(), 256);
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "judge groundedness"
        );
        assert_eq!(body["contents"][0]["parts"][0]["text"], "the row");
        let t = body["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((t - 0.3).abs() < 1e-6);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
        assert_eq!(
            body["generationConfig"]["responseSchema"]["required"],
            json!(["score", "reasoning"])
        );
    }

    #[test]
    fn extracts_candidate_text() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "{\"score\": 6, " },
                    { "text": "\"reasoning\": \"partly grounded\"}" }
                ]},
                "finishReason": "STOP"
            }]
        });
        let text = extract_text(&body).unwrap();
        let verdict = parse_verdict(&text).unwrap();
        assert_eq!(verdict.score(), 6);
        assert_eq!(verdict.reasoning(), "partly grounded");
    }

    #[test]
    fn blocked_response_is_validation_failure() {
        let body = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = extract_text(&body).unwrap_err();
        assert!(matches!(err, GatewayError::ValidationFailed(_)));
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn endpoint_uses_model_and_trimmed_base() {
        let gw = GeminiGateway::new("gemini-2.0-flash".into(), "k".into())
            .with_base_url("http://localhost:8080/v1beta/");
        assert_eq!(
            gw.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(gw.provider_name(), "gemini");
    }

    /// Serve exactly one canned HTTP response on a loopback port.
    async fn one_shot_server(status_line: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let raw = String::from_utf8_lossy(&buf);
                if let Some(end) = raw.find("\r\n\r\n") {
                    let content_length = raw[..end]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{}/v1beta", addr)
    }

    #[tokio::test]
    async fn http_503_maps_to_overloaded() {
        let base = one_shot_server(
            "HTTP/1.1 503 Service Unavailable",
            r#"{"error":{"code":503,"status":"UNAVAILABLE"}}"#,
        )
        .await;
        let gw = GeminiGateway::new(DEFAULT_MODEL.into(), "k".into()).with_base_url(base);
        let err = gw.invoke(&request()).await.unwrap_err();
        match err {
            GatewayError::Overloaded { status, message } => {
                assert_eq!(status, 503);
                assert!(message.contains("UNAVAILABLE"));
            }
            other => panic!("expected overloaded, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn other_http_errors_are_transport_errors() {
        let base = one_shot_server(
            "HTTP/1.1 400 Bad Request",
            r#"{"error":{"code":400,"status":"INVALID_ARGUMENT"}}"#,
        )
        .await;
        let gw = GeminiGateway::new(DEFAULT_MODEL.into(), "k".into()).with_base_url(base);
        let err = gw.invoke(&request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
        assert!(err.to_string().contains("status 400"));
    }

    #[tokio::test]
    async fn successful_response_is_parsed_and_validated() {
        let base = one_shot_server(
            "HTTP/1.1 200 OK",
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"score\": 11, \"reasoning\": \"too kind\"}"}]}}]}"#,
        )
        .await;
        let gw = GeminiGateway::new(DEFAULT_MODEL.into(), "k".into()).with_base_url(base);
        let err = gw.invoke(&request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::ValidationFailed(_)));
    }
}
