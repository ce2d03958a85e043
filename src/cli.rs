use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "tourbench",
    version,
    about = "Scoring and significance testing for tour-poster extraction benchmarks"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Score(ScoreArgs),
    Compare(CompareArgs),
    Validate(ValidateArgs),
}

/// Overrides layered on top of the scoring config file.
#[derive(Args, Debug, Clone, Default)]
pub struct BootstrapOverrides {
    #[arg(long)]
    pub bootstrap_samples: Option<usize>,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub alpha: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    #[arg(long)]
    pub ground_truth_dir: PathBuf,

    #[arg(long)]
    pub predictions_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value = "results")]
    pub out: PathBuf,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long = "model")]
    pub models: Vec<String>,

    #[arg(long)]
    pub workers: Option<usize>,

    #[command(flatten)]
    pub bootstrap: BootstrapOverrides,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompareMetric {
    AppQuality,
    AppCore,
}

impl CompareMetric {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AppQuality => "app_quality_score",
            Self::AppCore => "app_core_score",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[arg(long)]
    pub scores_path: PathBuf,

    #[arg(long, value_enum, default_value_t = CompareMetric::AppQuality)]
    pub metric: CompareMetric,

    #[arg(long = "model")]
    pub models: Vec<String>,

    #[arg(long)]
    pub out: Option<PathBuf>,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub bootstrap: BootstrapOverrides,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long)]
    pub prediction_path: PathBuf,
}
