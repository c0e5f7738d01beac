//! Optional `ragjudge.yaml` run configuration.
//!
//! Precedence is defaults < config file < command-line flags; the file only
//! supplies what the CLI does not override.

use crate::engine::row::DimensionMode;
use crate::errors::ConfigError;
use crate::judge::retry::RetryPolicy;
use crate::providers::llm::gemini;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;
pub const DEFAULT_CONFIG_PATH: &str = "ragjudge.yaml";
pub const MAX_TEMPERATURE: f32 = 2.0;

pub const SAMPLE_CONFIG: &str = r#"# ragjudge run configuration
version: 1

judge:
  # gemini | fake (fake answers every dimension with `fake_score`, no network)
  provider: gemini
  model: gemini-2.0-flash
  temperature: 0.0
  max_output_tokens: 1024
  timeout_seconds: 60
  fake_score: 7

retry:
  # attempts per (row, dimension), including the first
  max_attempts: 3
  # overload wait = backoff_base_ms * 2^attempt
  backoff_base_ms: 1000

# judge the six dimensions of a row concurrently
concurrent_dimensions: true
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JudgeProvider {
    #[default]
    Gemini,
    Fake,
}

impl JudgeProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            JudgeProvider::Gemini => "gemini",
            JudgeProvider::Fake => "fake",
        }
    }
}

impl FromStr for JudgeProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(JudgeProvider::Gemini),
            "fake" => Ok(JudgeProvider::Fake),
            other => Err(ConfigError::InvalidValue(format!(
                "unknown judge provider '{other}' (expected gemini or fake)"
            ))),
        }
    }
}

impl std::fmt::Display for JudgeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JudgeSettings {
    pub provider: JudgeProvider,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_seconds: u64,
    /// Verdict returned by the `fake` provider for every dimension.
    pub fake_score: u8,
}

impl Default for JudgeSettings {
    fn default() -> Self {
        Self {
            provider: JudgeProvider::default(),
            model: gemini::DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_output_tokens: 1024,
            timeout_seconds: 60,
            fake_score: 7,
        }
    }
}

impl JudgeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            backoff_base_ms: policy.backoff_base.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub version: u32,
    pub judge: JudgeSettings,
    pub retry: RetrySettings,
    pub concurrent_dimensions: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            judge: JudgeSettings::default(),
            retry: RetrySettings::default(),
            concurrent_dimensions: true,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != SUPPORTED_CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version,
                supported: SUPPORTED_CONFIG_VERSION,
            });
        }
        validate_temperature(self.judge.temperature)?;
        if self.judge.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue("judge.model must not be empty".into()));
        }
        if self.judge.max_output_tokens == 0 {
            return Err(ConfigError::InvalidValue(
                "judge.max_output_tokens must be at least 1".into(),
            ));
        }
        if self.judge.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "judge.timeout_seconds must be at least 1".into(),
            ));
        }
        if i64::from(self.judge.fake_score) > crate::model::MAX_SCORE {
            return Err(ConfigError::InvalidValue(format!(
                "judge.fake_score {} outside 0..={}",
                self.judge.fake_score,
                crate::model::MAX_SCORE
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            backoff_base: Duration::from_millis(self.retry.backoff_base_ms),
        }
    }

    pub fn dimension_mode(&self) -> DimensionMode {
        if self.concurrent_dimensions {
            DimensionMode::Concurrent
        } else {
            DimensionMode::Sequential
        }
    }
}

pub fn validate_temperature(temperature: f32) -> Result<(), ConfigError> {
    if !temperature.is_finite() || !(0.0..=MAX_TEMPERATURE).contains(&temperature) {
        return Err(ConfigError::InvalidValue(format!(
            "temperature {temperature} outside 0.0..={MAX_TEMPERATURE}"
        )));
    }
    Ok(())
}

pub fn parse_config(raw: &str) -> Result<RunConfig, ConfigError> {
    let cfg: RunConfig =
        serde_yaml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_config(path: &Path) -> Result<RunConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    parse_config(&raw)
}

/// Write [`SAMPLE_CONFIG`] to `path`. Refuses to overwrite unless `force`.
pub fn write_sample_config(path: &Path, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists {
            path: path.display().to_string(),
        });
    }
    std::fs::write(path, SAMPLE_CONFIG).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        detail: format!("failed to write sample config: {e}"),
    })
}
