//! # Embsweep Trainer
//!
//! Concrete collaborators for the embedding comparison: split loading, the
//! subprocess train/eval step, SVG and JSON reporting, and the two
//! experiment drivers behind the `run_embeddings_robust` and `run_single`
//! binaries.

pub mod bridge;
pub mod data;
pub mod experiment;
pub mod plot;
pub mod report;

pub use bridge::CommandStep;
pub use data::{Dataset, check_labels, load_dataset, load_splits};
pub use experiment::{
    ComparisonSettings, EMBEDDING_TYPES, SingleSettings, TrainerCommand, run_comparison,
    run_single_experiment,
};
pub use plot::SvgPlotter;
pub use report::JsonSummary;

use tracing_subscriber::EnvFilter;

/// Human-readable progress on stdout, `info` level unless `RUST_LOG` says
/// otherwise.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
