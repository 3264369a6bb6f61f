//! The two experiment drivers: the robust embedding comparison and the
//! single glove-twitter-50 run.

use std::path::PathBuf;

use embsweep_core::{
    EmbeddingId, ExperimentPlan, ExperimentRunner, HyperParams, KNOWN_EMBEDDINGS, Result,
    ResultSet, RetryPolicy, SweepError, TrainConfig, TrainOutput, single_run,
};
use tracing::info;

use crate::bridge::CommandStep;
use crate::data::{check_labels, load_splits};
use crate::plot::SvgPlotter;
use crate::report::JsonSummary;

/// Embeddings compared by the robust run, in plot order.
pub const EMBEDDING_TYPES: [&str; 4] = [
    "glove-twitter-50",
    "glove-twitter-100",
    "glove-twitter-200",
    "word2vec-google-news-300",
];

pub const COMPARISON_PLOT: &str = "embedding_comparison.svg";
pub const COMPARISON_SUMMARY: &str = "embedding_comparison.json";
pub const SINGLE_RUN_PLOT: &str = "single_run_loss.svg";
pub const SINGLE_RUN_CHECKPOINT: &str = "model.pth";

/// Whitespace-separated trainer arguments, used when none are given on the
/// command line.
pub const TRAINER_ARGS_ENV: &str = "EMBSWEEP_TRAINER_ARGS";

/// External program implementing one train/eval attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for TrainerCommand {
    fn default() -> Self {
        Self {
            program: "python3".into(),
            args: vec!["train_step.py".into()],
        }
    }
}

impl TrainerCommand {
    /// Builds the command from the program and the `--trainer-arg` values.
    ///
    /// Command-line arguments are taken verbatim. Without any, `env_args` is
    /// split on whitespace, and without that the default script is used.
    pub fn from_parts(program: String, cli_args: Vec<String>, env_args: Option<&str>) -> Self {
        let args = if !cli_args.is_empty() {
            cli_args
        } else {
            env_args
                .map(|v| v.split_whitespace().map(str::to_string).collect::<Vec<_>>())
                .filter(|words| !words.is_empty())
                .unwrap_or_else(|| Self::default().args)
        };
        Self { program, args }
    }

    pub fn step(&self) -> CommandStep {
        CommandStep::new(&self.program).args(&self.args)
    }
}

/// Settings for [`run_comparison`].
#[derive(Debug, Clone)]
pub struct ComparisonSettings {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub trainer: TrainerCommand,
    pub params: HyperParams,
    pub retry: RetryPolicy,
    pub embeddings: Vec<String>,
}

impl Default for ComparisonSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("."),
            trainer: TrainerCommand::default(),
            params: HyperParams::default(),
            retry: RetryPolicy::default(),
            embeddings: EMBEDDING_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Settings for [`run_single_experiment`].
#[derive(Debug, Clone)]
pub struct SingleSettings {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub trainer: TrainerCommand,
    pub params: HyperParams,
    pub embedding: String,
}

impl Default for SingleSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("."),
            trainer: TrainerCommand::default(),
            params: HyperParams::default(),
            embedding: EMBEDDING_TYPES[0].to_string(),
        }
    }
}

/// Trains every embedding with retries and writes the comparison plot and
/// summary. Only data loading, configuration and reporting errors escape.
pub fn run_comparison(settings: &ComparisonSettings) -> Result<ResultSet> {
    let plan = ExperimentPlan::from_embeddings(
        &settings.params,
        settings.embeddings.as_slice(),
        KNOWN_EMBEDDINGS,
    )?
    .in_dir(&settings.output_dir);

    info!("Loading data...");
    let splits = load_splits(&settings.data_dir)?;
    check_labels(&splits, settings.params.num_classes)?;
    info!("✓ Data loaded successfully!");

    let mut step = settings.trainer.step();
    let mut sink = (
        SvgPlotter::new(settings.output_dir.join(COMPARISON_PLOT)),
        JsonSummary::new(settings.output_dir.join(COMPARISON_SUMMARY)),
    );

    ExperimentRunner::new(settings.retry).run_all(&plan, &splits, &mut step, &mut sink)
}

/// Trains one embedding once and plots train vs dev loss. Any failure,
/// including a training failure, is returned.
pub fn run_single_experiment(settings: &SingleSettings) -> Result<TrainOutput> {
    let embedding = EmbeddingId::new(settings.embedding.as_str())?;
    if !embedding.is_known() {
        return Err(SweepError::InvalidConfig(format!(
            "unknown embedding {embedding}"
        )));
    }
    let config = TrainConfig::for_embedding(&settings.params, embedding)
        .with_save_path(SINGLE_RUN_CHECKPOINT)
        .in_dir(&settings.output_dir);

    info!("Loading IMDB dataset...");
    let splits = load_splits(&settings.data_dir)?;
    check_labels(&splits, config.num_classes)?;

    info!("Running single training run...");
    let mut step = settings.trainer.step();
    let mut plotter = SvgPlotter::new(settings.output_dir.join(SINGLE_RUN_PLOT));
    single_run(&config, &splits, &mut step, &mut plotter)
}
