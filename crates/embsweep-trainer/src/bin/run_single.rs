use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use embsweep_trainer::experiment::{SINGLE_RUN_PLOT, TRAINER_ARGS_ENV};
use embsweep_trainer::{SingleSettings, TrainerCommand, init_logging, run_single_experiment};
use tracing::info;

/// Train with glove-twitter-50 once and plot training vs validation loss.
#[derive(Parser)]
#[command(name = "run_single")]
#[command(version)]
struct Cli {
    /// Directory holding dev.json, train.json and test.json
    #[arg(long, env = "EMBSWEEP_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Directory for the checkpoint and the plot
    #[arg(long, env = "EMBSWEEP_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Training program
    #[arg(long, env = "EMBSWEEP_TRAINER", default_value = "python3")]
    trainer: String,

    /// Argument for the training program; repeat for several. Falls back to
    /// the whitespace-separated EMBSWEEP_TRAINER_ARGS, then to train_step.py
    #[arg(long = "trainer-arg", allow_hyphen_values = true)]
    trainer_args: Vec<String>,
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = SingleSettings {
        data_dir: cli.data_dir,
        output_dir: cli.output_dir,
        trainer: TrainerCommand::from_parts(
            cli.trainer,
            cli.trainer_args,
            std::env::var(TRAINER_ARGS_ENV).ok().as_deref(),
        ),
        ..Default::default()
    };

    run_single_experiment(&settings).context("single run failed")?;
    info!(
        "Plot saved as '{}'",
        settings.output_dir.join(SINGLE_RUN_PLOT).display()
    );
    info!("Done!");
    Ok(())
}

fn main() {
    init_logging();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Training failed: {:#}", e);
        std::process::exit(1);
    }
}
