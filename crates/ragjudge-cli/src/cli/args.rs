use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ragjudge",
    version,
    about = "Score RAG answers with an LLM judge across six quality dimensions"
)]
pub struct Cli {
    #[command(flatten)]
    pub log: LogArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Evaluate every row of a CSV file and write the reports
    Run(RunArgs),
    /// Write a sample ragjudge.yaml
    Init(InitArgs),
    Version,
}

#[derive(Args, Clone, Debug)]
pub struct LogArgs {
    /// Only log warnings and errors (RUST_LOG still overrides)
    #[arg(long, global = true)]
    pub quiet: bool,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Clone, Debug)]
pub struct RunArgs {
    /// CSV file with the columns "Current User Question", "Conversation History",
    /// "Fragment Texts" and "Assistant Answer"
    #[arg(long)]
    pub csv: PathBuf,

    /// Directory for the scored dataset, aggregate stats and Markdown report
    #[arg(long)]
    pub output: PathBuf,

    /// Sampling temperature for the judge (0.0 - 2.0); overrides the config file
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Config file (default: ragjudge.yaml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Evaluate only the first N rows
    #[arg(long)]
    pub limit: Option<usize>,

    /// Exit 1 when the average final score is below this value
    #[arg(long)]
    pub min_score: Option<f64>,

    #[command(flatten)]
    pub judge: JudgeArgs,
}

#[derive(Args, Clone, Debug, Default)]
pub struct JudgeArgs {
    /// judge provider (gemini|fake)
    #[arg(long = "judge", env = "RAGJUDGE_JUDGE")]
    pub provider: Option<String>,

    /// judge model name
    #[arg(long = "judge-model", env = "RAGJUDGE_JUDGE_MODEL")]
    pub model: Option<String>,
}

#[derive(Parser, Clone, Debug)]
pub struct InitArgs {
    #[arg(long, default_value = ragjudge_core::config::DEFAULT_CONFIG_PATH)]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}
