pub mod config;
pub mod dataset;
pub mod dimensions;
pub mod engine;
pub mod errors;
pub mod judge;
pub mod model;
pub mod providers;
pub mod report;

pub use config::{JudgeProvider, RunConfig};
pub use dimensions::{Dimension, DimensionTable};
pub use engine::row::{DimensionMode, RowEvaluator};
pub use engine::runner::Runner;
pub use errors::{ConfigError, GatewayError, RunError, RunErrorKind};
pub use judge::DimensionJudge;
pub use model::{DimensionScores, EvaluationResult, EvaluationScore, RagRow};
pub use report::{ReportPaths, RunArtifacts};
