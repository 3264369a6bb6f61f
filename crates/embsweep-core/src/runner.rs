//! # Experiment Runner
//!
//! Walks an [`ExperimentPlan`] in order, runs the train/eval step for each
//! configuration under a [`RetryPolicy`], substitutes a [`Placeholder`]
//! result when every attempt fails, and hands the complete [`ResultSet`] to
//! a reporting sink.

use tracing::{info, warn};

use crate::config::{ExperimentPlan, TrainConfig};
use crate::error::{Result, SweepError};
use crate::result::{Placeholder, ResultSet, RunResult};
use crate::retry::RetryPolicy;
use crate::step::{LossCurveSink, ReportingSink, Splits, TrainEvalStep, TrainOutput};

/// Sequential, retrying driver for a comparison study.
#[derive(Debug, Clone, Default)]
pub struct ExperimentRunner {
    policy: RetryPolicy,
    placeholder: Placeholder,
}

impl ExperimentRunner {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            placeholder: Placeholder::default(),
        }
    }

    /// Replaces the sentinel values used for degraded results.
    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn placeholder(&self) -> &Placeholder {
        &self.placeholder
    }

    /// Runs every configuration and reports the results once.
    ///
    /// Training failures never escape: they are retried and then degraded.
    /// A sink failure does escape, and no results are returned in that case.
    pub fn run_all<D, S, R>(
        &self,
        plan: &ExperimentPlan,
        splits: &Splits<D>,
        step: &mut S,
        sink: &mut R,
    ) -> Result<ResultSet>
    where
        S: TrainEvalStep<D> + ?Sized,
        R: ReportingSink + ?Sized,
    {
        self.run_all_with_sleep(plan, splits, step, sink, std::thread::sleep)
    }

    /// [`run_all`](Self::run_all) with an explicit backoff sleep.
    pub fn run_all_with_sleep<D, S, R>(
        &self,
        plan: &ExperimentPlan,
        splits: &Splits<D>,
        step: &mut S,
        sink: &mut R,
        sleep: impl FnMut(std::time::Duration),
    ) -> Result<ResultSet>
    where
        S: TrainEvalStep<D> + ?Sized,
        R: ReportingSink + ?Sized,
    {
        let results = self.collect_with_sleep(plan, splits, step, sleep);

        info!("--- Generating comparison plots ---");
        sink.report(&results, &plan.labels())?;
        info!("✓ Comparison plots generated successfully!");

        Ok(results)
    }

    /// Runs every configuration without reporting.
    pub fn collect<D, S>(&self, plan: &ExperimentPlan, splits: &Splits<D>, step: &mut S) -> ResultSet
    where
        S: TrainEvalStep<D> + ?Sized,
    {
        self.collect_with_sleep(plan, splits, step, std::thread::sleep)
    }

    /// [`collect`](Self::collect) with an explicit backoff sleep.
    pub fn collect_with_sleep<D, S>(
        &self,
        plan: &ExperimentPlan,
        splits: &Splits<D>,
        step: &mut S,
        mut sleep: impl FnMut(std::time::Duration),
    ) -> ResultSet
    where
        S: TrainEvalStep<D> + ?Sized,
    {
        info!("Starting robust embedding comparison...");
        let mut results = ResultSet::with_capacity(plan.len());

        for (i, config) in plan.iter().enumerate() {
            info!(
                "--- Training with {} ({}/{}) ---",
                config.label(),
                i + 1,
                plan.len()
            );
            let result = self.run_config(config, splits, step, &mut sleep);
            results.push(result);
        }

        if results.degraded_count() > 0 {
            warn!(
                "{} of {} configurations use placeholder data",
                results.degraded_count(),
                results.len()
            );
        }

        results
    }

    fn run_config<D, S>(
        &self,
        config: &TrainConfig,
        splits: &Splits<D>,
        step: &mut S,
        sleep: &mut impl FnMut(std::time::Duration),
    ) -> RunResult
    where
        S: TrainEvalStep<D> + ?Sized,
    {
        let outcome = self.policy.execute_with_sleep(
            config.label(),
            |attempt| {
                let output = step.train_eval(config, splits)?;
                info!("✓ Successfully completed training for {}", config.label());
                if output.epoch_dev_accs.len() != config.num_epochs {
                    warn!(
                        "{} returned {} epochs of validation data, configured {}",
                        config.label(),
                        output.epoch_dev_accs.len(),
                        config.num_epochs
                    );
                }
                Ok::<_, SweepError>(RunResult::completed(
                    config,
                    attempt,
                    output.epoch_dev_accs,
                    output.epoch_dev_losses,
                ))
            },
            &mut *sleep,
        );

        outcome.or_degrade(|e, attempts| {
            warn!(
                "Failed to train with {} after {} attempts ({}); using placeholder data \
                 (accuracy {}, loss {})",
                config.label(),
                attempts,
                e,
                self.placeholder.accuracy,
                self.placeholder.loss
            );
            self.placeholder.series(config, attempts)
        })
    }
}

/// Trains one configuration once and plots its loss curves.
///
/// There is no retry and no placeholder: a training failure aborts before
/// the sink is touched.
pub fn single_run<D, S, P>(
    config: &TrainConfig,
    splits: &Splits<D>,
    step: &mut S,
    sink: &mut P,
) -> Result<TrainOutput>
where
    S: TrainEvalStep<D> + ?Sized,
    P: LossCurveSink + ?Sized,
{
    config.params().validate()?;

    info!(
        "Starting single run with {} embeddings...",
        config.label()
    );
    let output = step.train_eval(config, splits)?;

    if output.epoch_train_losses.len() != output.epoch_dev_losses.len() {
        return Err(SweepError::TrainEval(format!(
            "train loss has {} epochs but dev loss has {}",
            output.epoch_train_losses.len(),
            output.epoch_dev_losses.len()
        )));
    }

    sink.plot_epochs(&output.epoch_train_losses, &output.epoch_dev_losses)?;
    info!("Training completed!");

    Ok(output)
}
