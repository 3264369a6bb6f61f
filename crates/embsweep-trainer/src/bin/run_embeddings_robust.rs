use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use embsweep_core::RetryPolicy;
use embsweep_trainer::experiment::TRAINER_ARGS_ENV;
use embsweep_trainer::{ComparisonSettings, TrainerCommand, init_logging, run_comparison};
use tracing::info;

/// Compare pretrained embeddings, retrying failed runs and plotting all of them.
#[derive(Parser)]
#[command(name = "run_embeddings_robust")]
#[command(version)]
struct Cli {
    /// Directory holding dev.json, train.json and test.json
    #[arg(long, env = "EMBSWEEP_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Directory for checkpoints, plots and the summary
    #[arg(long, env = "EMBSWEEP_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Training program run once per attempt
    #[arg(long, env = "EMBSWEEP_TRAINER", default_value = "python3")]
    trainer: String,

    /// Argument for the training program; repeat for several. Falls back to
    /// the whitespace-separated EMBSWEEP_TRAINER_ARGS, then to train_step.py
    #[arg(long = "trainer-arg", allow_hyphen_values = true)]
    trainer_args: Vec<String>,

    /// Attempts per embedding before falling back to placeholder data
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    /// Seconds to wait between attempts
    #[arg(long, default_value_t = 10)]
    retry_delay_secs: u64,
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let retry = RetryPolicy::new(cli.max_attempts, Duration::from_secs(cli.retry_delay_secs))?;
    let settings = ComparisonSettings {
        data_dir: cli.data_dir,
        output_dir: cli.output_dir,
        trainer: TrainerCommand::from_parts(
            cli.trainer,
            cli.trainer_args,
            std::env::var(TRAINER_ARGS_ENV).ok().as_deref(),
        ),
        retry,
        ..Default::default()
    };

    let results = run_comparison(&settings).context("embedding comparison aborted")?;
    for result in &results {
        info!("{}", result);
    }
    Ok(())
}

fn main() {
    init_logging();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Comparison failed: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_arguments() {
        let cli = Cli::try_parse_from(["run_embeddings_robust"]).unwrap();
        assert_eq!(cli.trainer, "python3");
        assert!(cli.trainer_args.is_empty());
        assert_eq!(cli.max_attempts, 3);
        assert_eq!(cli.retry_delay_secs, 10);

        let cmd = TrainerCommand::from_parts(cli.trainer, cli.trainer_args, None);
        assert_eq!(cmd, TrainerCommand::default());
    }

    #[test]
    fn trainer_arg_with_space_stays_whole() {
        let cli = Cli::try_parse_from([
            "run_embeddings_robust",
            "--trainer-arg",
            "/opt/my trainer/step.py",
            "--trainer-arg",
            "--quiet",
        ])
        .unwrap();
        assert_eq!(cli.trainer_args, vec!["/opt/my trainer/step.py", "--quiet"]);
    }
}
