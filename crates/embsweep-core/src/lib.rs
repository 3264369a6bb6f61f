//! # Embsweep Core
//!
//! Runs a comparison study over pretrained word embeddings: each
//! configuration is trained and evaluated by an external step, retried a
//! bounded number of times, and replaced by placeholder data when it never
//! succeeds, so the final report always covers every configuration.
//!
//! ## Quick Start
//!
//! ```rust
//! use embsweep_core::{
//!     ExperimentPlan, ExperimentRunner, HyperParams, RetryPolicy, Splits,
//!     TrainConfig, TrainOutput, KNOWN_EMBEDDINGS,
//! };
//!
//! let params = HyperParams::default().with_epochs(2);
//! let plan = ExperimentPlan::from_embeddings(&params, &["glove-twitter-50"], KNOWN_EMBEDDINGS)
//!     .unwrap();
//! let splits = Splits::new((), (), ());
//!
//! let mut step = |_: &TrainConfig, _: &Splits<()>| -> embsweep_core::Result<TrainOutput> {
//!     Ok(TrainOutput::new(vec![0.9, 0.7], vec![0.8, 0.6], vec![0.6, 0.7]))
//! };
//! let runner = ExperimentRunner::new(RetryPolicy::once());
//! let results = runner.collect(&plan, &splits, &mut step);
//! assert_eq!(results.len(), plan.len());
//! assert_eq!(results.get(0).unwrap().dev_accuracies, vec![0.6, 0.7]);
//! ```
pub mod config;
pub mod error;
pub mod result;
pub mod retry;
pub mod runner;
pub mod step;

// Re-export primary API
pub use config::{EmbeddingId, ExperimentPlan, HyperParams, KNOWN_EMBEDDINGS, TrainConfig};
pub use error::{Result, SweepError};
pub use result::{Placeholder, ResultSet, RunKind, RunResult};
pub use retry::{Attempted, RetryPolicy};
pub use runner::{ExperimentRunner, single_run};
pub use step::{LossCurveSink, ReportingSink, Splits, TrainEvalStep, TrainOutput};
