//! Train/eval step backed by an external training program.
//!
//! The model, the embedding download and checkpointing live outside this
//! workspace. Each attempt spawns the program, writes one JSON request to its
//! stdin and reads a [`TrainOutput`] from the last non-empty line of its
//! stdout. Anything printed before that line is treated as progress output.

use std::ffi::OsString;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use embsweep_core::{Result, Splits, SweepError, TrainConfig, TrainEvalStep, TrainOutput};
use serde::Serialize;
use tracing::debug;

use crate::data::Dataset;

/// Number of stderr lines quoted in a failure message.
const STDERR_TAIL_LINES: usize = 5;

#[derive(Serialize)]
struct Request<'a> {
    config: &'a TrainConfig,
    data: Splits<&'a Path>,
}

/// Runs `program args...` once per attempt.
#[derive(Debug, Clone)]
pub struct CommandStep {
    program: OsString,
    args: Vec<OsString>,
    working_dir: Option<PathBuf>,
}

impl CommandStep {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the program from `dir` instead of the current directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn request_body(config: &TrainConfig, splits: &Splits<Dataset>) -> Result<Vec<u8>> {
        let request = Request {
            config,
            data: splits.map(|d| d.path.as_path()),
        };
        Ok(serde_json::to_vec(&request)?)
    }
}

impl TrainEvalStep<Dataset> for CommandStep {
    fn train_eval(&mut self, config: &TrainConfig, splits: &Splits<Dataset>) -> Result<TrainOutput> {
        let body = Self::request_body(config, splits)?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        debug!("Spawning {:?} {:?} for {}", self.program, self.args, config.label());
        let mut child = cmd.spawn().map_err(|e| {
            SweepError::TrainEval(format!("failed to start {:?}: {e}", self.program))
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A program that exits without reading is reported by its exit status below.
            match stdin.write_all(&body) {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(SweepError::TrainEval(format!("failed to send request: {e}")));
                }
                _ => {}
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| SweepError::TrainEval(format!("failed to wait for trainer: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
            return Err(SweepError::TrainEval(format!(
                "trainer exited with {}: {}",
                output.status,
                tail.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let last = stdout
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| SweepError::TrainEval("trainer produced no output".into()))?;

        let result: TrainOutput = serde_json::from_str(last.trim())
            .map_err(|e| SweepError::TrainEval(format!("unreadable trainer output: {e}")))?;
        result.check_epochs(config.num_epochs)?;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embsweep_core::{EmbeddingId, HyperParams};
    use std::fs;

    const OUTPUT: &str = r#"{"epoch_train_losses":[0.9,0.8],"epoch_train_accs":[0.5,0.6],"epoch_dev_losses":[0.7,0.6],"epoch_dev_accs":[0.6,0.7],"test_loss":0.65,"test_acc":0.68}"#;

    fn config(epochs: usize) -> TrainConfig {
        let params = HyperParams::default().with_epochs(epochs);
        TrainConfig::for_embedding(&params, EmbeddingId::new("glove-twitter-50").unwrap())
    }

    fn dataset(dir: &Path, name: &str, labels: Vec<usize>) -> Dataset {
        Dataset {
            path: dir.join(name),
            texts: labels.iter().map(|l| format!("text {l}")).collect(),
            labels,
        }
    }

    fn splits(dir: &Path) -> Splits<Dataset> {
        Splits::new(
            dataset(dir, "dev.json", vec![0, 1]),
            dataset(dir, "train.json", vec![1, 0, 1]),
            dataset(dir, "test.json", vec![0]),
        )
    }

    fn shell(script: &str) -> CommandStep {
        CommandStep::new("sh").arg("-c").arg(script)
    }

    #[test]
    fn reads_last_line_as_output() {
        let dir = tempfile::tempdir().unwrap();
        let script = format!("cat > request.json; echo 'epoch 1/2'; echo '{OUTPUT}'; echo");
        let mut step = shell(&script).with_working_dir(dir.path());

        let output = step.train_eval(&config(2), &splits(dir.path())).unwrap();
        assert_eq!(output.epoch_dev_accs, vec![0.6, 0.7]);
        assert_eq!(output.test_acc, Some(0.68));

        let request: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("request.json")).unwrap())
                .unwrap();
        assert_eq!(request["config"]["embeddings"], "glove-twitter-50");
        assert_eq!(request["config"]["num_epochs"], 2);
        let train = dir.path().join("train.json");
        assert_eq!(request["data"]["train"], train.to_str().unwrap());
    }

    #[test]
    fn non_zero_exit_is_train_eval_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut step = shell("echo 'embedding download failed' >&2; exit 3");

        let err = step.train_eval(&config(2), &splits(dir.path())).unwrap_err();
        assert!(matches!(err, SweepError::TrainEval(_)));
        assert!(err.to_string().contains("embedding download failed"));
    }

    #[test]
    fn garbage_output_is_train_eval_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut step = shell("cat > /dev/null; echo 'not json'");

        let err = step.train_eval(&config(2), &splits(dir.path())).unwrap_err();
        assert!(err.to_string().contains("unreadable trainer output"));
    }

    #[test]
    fn wrong_epoch_count_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let script = format!("cat > /dev/null; echo '{OUTPUT}'");
        let mut step = shell(&script);

        let err = step.train_eval(&config(3), &splits(dir.path())).unwrap_err();
        assert!(matches!(err, SweepError::TrainEval(_)));
    }

    #[test]
    fn missing_program_is_train_eval_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut step = CommandStep::new("embsweep-no-such-trainer");

        let err = step.train_eval(&config(2), &splits(dir.path())).unwrap_err();
        assert!(err.to_string().contains("failed to start"));
    }
}
