//! External post generator invocation.
//!
//! The generator is an opaque program (a Python CLI in production) invoked as:
//!
//! ```text
//! <program> <entrypoint> --type <kind> --products <csv> --brand <brand>
//!           --output-dir <posts dir> [--count N] [--duration N]
//! ```
//!
//! Exit status 0 is success; stdout is then parsed as JSON when possible.
//! Any other exit is a failure carrying stderr (or stdout when stderr is
//! empty).

use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, instrument};

use powerchip_core::{GenerationKind, JobResult};

use super::JobRunner;
use crate::config::GeneratorConfig;

/// Errors running the generator.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The process could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process exited unsuccessfully.
    #[error("{message}")]
    Failed { code: Option<i32>, message: String },
}

/// One generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationJob {
    pub kind: GenerationKind,
    /// Number of carousel slides.
    pub count: Option<u32>,
    /// Reel length in seconds.
    pub duration: Option<u32>,
}

impl GenerationJob {
    #[must_use]
    pub const fn new(kind: GenerationKind) -> Self {
        Self {
            kind,
            count: None,
            duration: None,
        }
    }

    #[must_use]
    pub const fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    #[must_use]
    pub const fn with_duration(mut self, duration: u32) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Kind-specific arguments.
    ///
    /// `--count` applies to carousels and `--duration` to reels; each is
    /// emitted only when present and non-zero, and ignored for other kinds.
    #[must_use]
    pub fn extra_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        match self.kind {
            GenerationKind::Carousel => {
                if let Some(count) = self.count.filter(|c| *c > 0) {
                    args.push("--count".to_string());
                    args.push(count.to_string());
                }
            }
            GenerationKind::Reels => {
                if let Some(duration) = self.duration.filter(|d| *d > 0) {
                    args.push("--duration".to_string());
                    args.push(duration.to_string());
                }
            }
            GenerationKind::Static => {}
        }

        args
    }
}

impl std::fmt::Display for GenerationJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(count) = self.count {
            write!(f, " count={count}")?;
        }
        if let Some(duration) = self.duration {
            write!(f, " duration={duration}")?;
        }
        Ok(())
    }
}

/// Runs the generator as a child process.
#[derive(Debug, Clone)]
pub struct GeneratorInvoker {
    config: GeneratorConfig,
}

impl GeneratorInvoker {
    #[must_use]
    pub const fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Full argument list after the program name.
    #[must_use]
    pub fn args(&self, job: &GenerationJob) -> Vec<String> {
        let mut args = vec![
            self.config.entrypoint.clone(),
            "--type".to_string(),
            job.kind.as_str().to_string(),
            "--products".to_string(),
            self.config.products_path.display().to_string(),
            "--brand".to_string(),
            self.config.brand.clone(),
            "--output-dir".to_string(),
            self.config.output_dir.display().to_string(),
        ];
        args.extend(job.extra_args());
        args
    }

    /// Run one job to completion.
    ///
    /// stdout and stderr are captured in full and drained concurrently, so a
    /// chatty generator cannot deadlock on a full pipe.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Spawn`] if the program cannot be started and
    /// [`GeneratorError::Failed`] on a non-zero exit.
    #[instrument(skip(self), fields(job = %job))]
    pub async fn run(&self, job: &GenerationJob) -> Result<JobResult, GeneratorError> {
        let args = self.args(job);
        debug!(program = %self.config.program, ?args, "Starting generator");

        let mut command = Command::new(&self.config.program);
        command.args(&args).stdin(Stdio::null());
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .await
            .map_err(|source| GeneratorError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let result = classify(output.status, &stdout, &stderr)?;

        info!(kind = %job.kind, "Generator finished");

        Ok(result)
    }
}

impl JobRunner for GeneratorInvoker {
    async fn run(&self, job: &GenerationJob) -> Result<JobResult, GeneratorError> {
        Self::run(self, job).await
    }
}

/// Turn a finished process into a result.
fn classify(status: ExitStatus, stdout: &str, stderr: &str) -> Result<JobResult, GeneratorError> {
    if status.success() {
        return Ok(JobResult::from_stdout(stdout));
    }

    let message = [stderr.trim(), stdout.trim()]
        .into_iter()
        .find(|s| !s.is_empty())
        .map_or_else(
            || match status.code() {
                Some(code) => format!("generator exited with status {code}"),
                None => "generator terminated by signal".to_string(),
            },
            String::from,
        );

    Err(GeneratorError::Failed {
        code: status.code(),
        message,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(program: &str, entrypoint: &str) -> GeneratorConfig {
        GeneratorConfig {
            program: program.to_string(),
            entrypoint: entrypoint.to_string(),
            working_dir: None,
            products_path: PathBuf::from("products.csv"),
            brand: "Powerchip Brasil".to_string(),
            output_dir: PathBuf::from("posts"),
        }
    }

    #[test]
    fn test_extra_args_carousel() {
        let job = GenerationJob::new(GenerationKind::Carousel).with_count(5);
        assert_eq!(job.extra_args(), vec!["--count", "5"]);
    }

    #[test]
    fn test_extra_args_reels() {
        let job = GenerationJob::new(GenerationKind::Reels).with_duration(15);
        assert_eq!(job.extra_args(), vec!["--duration", "15"]);
    }

    #[test]
    fn test_extra_args_ignores_mismatched_and_zero() {
        let job = GenerationJob::new(GenerationKind::Static)
            .with_count(5)
            .with_duration(15);
        assert!(job.extra_args().is_empty());

        let job = GenerationJob::new(GenerationKind::Reels).with_count(5);
        assert!(job.extra_args().is_empty());

        let job = GenerationJob::new(GenerationKind::Carousel).with_count(0);
        assert!(job.extra_args().is_empty());
    }

    #[test]
    fn test_full_args() {
        let invoker = GeneratorInvoker::new(config("python", "generate_posts_cli.py"));
        let job = GenerationJob::new(GenerationKind::Carousel).with_count(5);
        assert_eq!(
            invoker.args(&job),
            vec![
                "generate_posts_cli.py",
                "--type",
                "carousel",
                "--products",
                "products.csv",
                "--brand",
                "Powerchip Brasil",
                "--output-dir",
                "posts",
                "--count",
                "5",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let invoker = GeneratorInvoker::new(config("powerchip-no-such-program", "x"));
        let result = invoker.run(&GenerationJob::new(GenerationKind::Static)).await;
        assert!(matches!(result, Err(GeneratorError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_parses_json_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("gen.sh");
        std::fs::write(&script, "echo '{\"status\":\"ok\",\"count\":3}'\n").unwrap();

        let invoker = GeneratorInvoker::new(config("sh", &script.display().to_string()));
        let result = invoker
            .run(&GenerationJob::new(GenerationKind::Carousel).with_count(3))
            .await
            .unwrap();
        assert_eq!(result.as_value()["count"], 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_wraps_plain_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("gen.sh");
        std::fs::write(&script, "echo done\n").unwrap();

        let invoker = GeneratorInvoker::new(config("sh", &script.display().to_string()));
        let result = invoker
            .run(&GenerationJob::new(GenerationKind::Static))
            .await
            .unwrap();
        assert_eq!(result.as_value()["status"], "ok");
        assert_eq!(result.as_value()["detail"], "done");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_failure_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("gen.sh");
        std::fs::write(&script, "echo partial\necho boom >&2\nexit 1\n").unwrap();

        let invoker = GeneratorInvoker::new(config("sh", &script.display().to_string()));
        let err = invoker
            .run(&GenerationJob::new(GenerationKind::Static))
            .await
            .unwrap_err();
        match err {
            GeneratorError::Failed { code, message } => {
                assert_eq!(code, Some(1));
                assert_eq!(message, "boom");
            }
            GeneratorError::Spawn { .. } => panic!("expected Failed"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_failure_falls_back_to_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("gen.sh");
        std::fs::write(&script, "echo only-stdout\nexit 2\n").unwrap();

        let invoker = GeneratorInvoker::new(config("sh", &script.display().to_string()));
        let err = invoker
            .run(&GenerationJob::new(GenerationKind::Static))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "only-stdout");
    }
}
