//! Seams to the external collaborators: the train-and-evaluate step and the
//! reporting sinks.

use serde::{Deserialize, Serialize};

use crate::config::TrainConfig;
use crate::error::{Result, SweepError};
use crate::result::ResultSet;

/// The three dataset splits handed to every attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Splits<D> {
    pub dev: D,
    pub train: D,
    pub test: D,
}

impl<D> Splits<D> {
    pub fn new(dev: D, train: D, test: D) -> Self {
        Self { dev, train, test }
    }

    /// Applies `f` to each split, keeping the dev/train/test positions.
    pub fn map<'a, T>(&'a self, mut f: impl FnMut(&'a D) -> T) -> Splits<T> {
        Splits {
            dev: f(&self.dev),
            train: f(&self.train),
            test: f(&self.test),
        }
    }
}

/// Everything one train-and-evaluate call produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainOutput {
    /// Training loss per epoch.
    pub epoch_train_losses: Vec<f64>,
    /// Training accuracy per epoch. Not used by the runner.
    #[serde(default)]
    pub epoch_train_accs: Vec<f64>,
    /// Validation loss per epoch.
    pub epoch_dev_losses: Vec<f64>,
    /// Validation accuracy per epoch.
    pub epoch_dev_accs: Vec<f64>,
    /// Final test loss. Not used by the runner.
    #[serde(default)]
    pub test_loss: Option<f64>,
    /// Final test accuracy. Not used by the runner.
    #[serde(default)]
    pub test_acc: Option<f64>,
}

impl TrainOutput {
    /// Builds an output holding only the series the runner consumes.
    #[must_use]
    pub fn new(train_losses: Vec<f64>, dev_losses: Vec<f64>, dev_accs: Vec<f64>) -> Self {
        Self {
            epoch_train_losses: train_losses,
            epoch_train_accs: Vec::new(),
            epoch_dev_losses: dev_losses,
            epoch_dev_accs: dev_accs,
            test_loss: None,
            test_acc: None,
        }
    }

    /// Checks that every per-epoch series has `num_epochs` entries.
    /// The training-accuracy series may be empty.
    pub fn check_epochs(&self, num_epochs: usize) -> Result<()> {
        let series = [
            ("train loss", self.epoch_train_losses.len()),
            ("dev loss", self.epoch_dev_losses.len()),
            ("dev accuracy", self.epoch_dev_accs.len()),
        ];
        for (name, len) in series {
            if len != num_epochs {
                return Err(SweepError::TrainEval(format!(
                    "{name} series has {len} entries, expected {num_epochs}"
                )));
            }
        }
        if !self.epoch_train_accs.is_empty() && self.epoch_train_accs.len() != num_epochs {
            return Err(SweepError::TrainEval(format!(
                "train accuracy series has {} entries, expected {num_epochs}",
                self.epoch_train_accs.len()
            )));
        }
        Ok(())
    }
}

/// One train-and-evaluate invocation for a configuration.
///
/// Implementations own the model, the embedding lookup and checkpointing;
/// the runner only sees the returned series or the error.
pub trait TrainEvalStep<D> {
    fn train_eval(&mut self, config: &TrainConfig, splits: &Splits<D>) -> Result<TrainOutput>;
}

impl<D, F> TrainEvalStep<D> for F
where
    F: FnMut(&TrainConfig, &Splits<D>) -> Result<TrainOutput>,
{
    fn train_eval(&mut self, config: &TrainConfig, splits: &Splits<D>) -> Result<TrainOutput> {
        self(config, splits)
    }
}

/// Receives the full result set once all configurations have run.
pub trait ReportingSink {
    /// `labels` are the embedding identifiers, in the same order as `results`.
    fn report(&mut self, results: &ResultSet, labels: &[String]) -> Result<()>;
}

impl<S: ReportingSink + ?Sized> ReportingSink for &mut S {
    fn report(&mut self, results: &ResultSet, labels: &[String]) -> Result<()> {
        (**self).report(results, labels)
    }
}

/// Runs `A` then `B`; the first failure aborts.
impl<A: ReportingSink, B: ReportingSink> ReportingSink for (A, B) {
    fn report(&mut self, results: &ResultSet, labels: &[String]) -> Result<()> {
        self.0.report(results, labels)?;
        self.1.report(results, labels)
    }
}

/// Receives the training and validation loss curves of a single run.
pub trait LossCurveSink {
    fn plot_epochs(&mut self, train_losses: &[f64], dev_losses: &[f64]) -> Result<()>;
}

impl<S: LossCurveSink + ?Sized> LossCurveSink for &mut S {
    fn plot_epochs(&mut self, train_losses: &[f64], dev_losses: &[f64]) -> Result<()> {
        (**self).plot_epochs(train_losses, dev_losses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: usize,
        fail: bool,
    }

    impl ReportingSink for Recorder {
        fn report(&mut self, _results: &ResultSet, _labels: &[String]) -> Result<()> {
            self.calls += 1;
            if self.fail {
                return Err(SweepError::Reporting("disk full".into()));
            }
            Ok(())
        }
    }

    #[test]
    fn splits_map_keeps_positions() {
        let splits = Splits::new("dev", "train", "test");
        let lens = splits.map(|s| s.len());
        assert_eq!(lens, Splits::new(3, 5, 4));
    }

    #[test]
    fn check_epochs_detects_short_series() {
        let output = TrainOutput::new(vec![1.0, 0.9], vec![1.0, 0.8], vec![0.5, 0.6]);
        assert!(output.check_epochs(2).is_ok());
        let err = output.check_epochs(3).unwrap_err();
        assert!(matches!(err, SweepError::TrainEval(_)));

        let mut output = output;
        output.epoch_train_accs = vec![0.5];
        assert!(output.check_epochs(2).is_err());
    }

    #[test]
    fn train_output_extras_are_optional() {
        let json = r#"{
            "epoch_train_losses": [0.7],
            "epoch_dev_losses": [0.6],
            "epoch_dev_accs": [0.55]
        }"#;
        let output: TrainOutput = serde_json::from_str(json).unwrap();
        assert!(output.epoch_train_accs.is_empty());
        assert_eq!(output.test_acc, None);
        assert_eq!(output.epoch_dev_accs, vec![0.55]);
    }

    #[test]
    fn pair_sink_reports_both_in_order() {
        let mut pair = (Recorder::default(), Recorder::default());
        pair.report(&ResultSet::new(), &[]).unwrap();
        assert_eq!(pair.0.calls, 1);
        assert_eq!(pair.1.calls, 1);
    }

    #[test]
    fn pair_sink_stops_at_first_failure() {
        let mut pair = (
            Recorder {
                calls: 0,
                fail: true,
            },
            Recorder::default(),
        );
        assert!(pair.report(&ResultSet::new(), &[]).is_err());
        assert_eq!(pair.0.calls, 1);
        assert_eq!(pair.1.calls, 0);
    }
}
