use thiserror::Error;

/// Failure kinds of the judge model gateway.
///
/// Every gateway implementation maps its failures onto exactly one of these;
/// the retry policy branches on the variant, never on message text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The model is temporarily unavailable (HTTP 503 class).
    #[error("model overloaded (status {status}): {message}")]
    Overloaded { status: u16, message: String },

    /// The model answered, but not with a valid score/reasoning pair.
    #[error("invalid judge output: {0}")]
    ValidationFailed(String),

    /// Any other transport or provider failure. Not retried.
    #[error("judge transport error: {0}")]
    Transport(String),
}

impl GatewayError {
    pub fn overloaded(status: u16, message: impl Into<String>) -> Self {
        Self::Overloaded {
            status,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {detail}")]
    Read { path: String, detail: String },

    #[error("failed to parse YAML: {0}")]
    Parse(String),

    #[error("unsupported config version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("invalid dimension weights: {0}")]
    InvalidWeights(String),

    #[error("{var} not found in environment variables")]
    MissingCredential { var: String },

    #[error("{path} already exists (use --force to overwrite)")]
    AlreadyExists { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunErrorKind {
    InputUnavailable,
    MissingConfig,
    ConfigParse,
    MissingCredential,
    InvalidArgs,
    Output,
    Other,
}

impl RunErrorKind {
    /// Stable machine-readable reason code printed on fatal exit.
    pub fn reason_code(&self) -> &'static str {
        match self {
            RunErrorKind::InputUnavailable => "E_INPUT_UNAVAILABLE",
            RunErrorKind::MissingConfig => "E_CFG_MISSING",
            RunErrorKind::ConfigParse => "E_CFG_PARSE",
            RunErrorKind::MissingCredential => "E_MISSING_CREDENTIAL",
            RunErrorKind::InvalidArgs => "E_INVALID_ARGS",
            RunErrorKind::Output => "E_OUTPUT",
            RunErrorKind::Other => "E_OTHER",
        }
    }
}

/// Fatal, run-level failure. Only raised before rows are processed or while
/// writing output; per-dimension failures never surface here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunError {
    pub kind: RunErrorKind,
    pub message: String,
    pub path: Option<String>,
    pub detail: Option<String>,
}

impl RunError {
    pub fn new(kind: RunErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
            detail: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn input_unavailable(path: impl Into<String>, detail: impl Into<String>) -> Self {
        let path = path.into();
        let detail = detail.into();
        Self::new(
            RunErrorKind::InputUnavailable,
            format!("The file '{}' could not be read: {}", path, detail),
        )
        .with_path(path)
        .with_detail(detail)
    }

    pub fn missing_config(path: impl Into<String>, detail: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            RunErrorKind::MissingConfig,
            format!("Config file not found: {}", path),
        )
        .with_path(path)
        .with_detail(detail)
    }

    pub fn config(err: &ConfigError) -> Self {
        let kind = match err {
            ConfigError::MissingCredential { .. } => RunErrorKind::MissingCredential,
            ConfigError::AlreadyExists { .. } => RunErrorKind::InvalidArgs,
            _ => RunErrorKind::ConfigParse,
        };
        Self::new(kind, err.to_string())
    }

    pub fn invalid_args(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::new(RunErrorKind::InvalidArgs, detail.clone()).with_detail(detail)
    }

    pub fn output(path: impl Into<String>, detail: impl Into<String>) -> Self {
        let path = path.into();
        let detail = detail.into();
        Self::new(
            RunErrorKind::Output,
            format!("failed to write {}: {}", path, detail),
        )
        .with_path(path)
        .with_detail(detail)
    }

    pub fn other(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::new(RunErrorKind::Other, detail.clone()).with_detail(detail)
    }

    pub fn reason_code(&self) -> &'static str {
        self.kind.reason_code()
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RunError {}

impl From<ConfigError> for RunError {
    fn from(err: ConfigError) -> Self {
        RunError::config(&err)
    }
}
