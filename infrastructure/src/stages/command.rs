//! Out-of-process stage: runs an external program per loan

use crate::config::FileStageConfig;
use crate::process::run_to_completion;
use async_trait::async_trait;
use loanflow_application::ports::stage::{Stage, StageContext, StageError};
use loanflow_domain::{RawStageOutput, SentinelMarkers, StageReport};
use std::path::PathBuf;
use tracing::debug;

/// Substitute `{loan_id}` and `{param}` in an argument template.
///
/// An argument that is exactly `{param}` is dropped when there is no
/// parameter, so optional trailing arguments disappear cleanly.
pub fn render_args(template: &[String], ctx: &StageContext) -> Vec<String> {
    template
        .iter()
        .filter(|arg| !(arg.as_str() == "{param}" && ctx.parameter.is_none()))
        .map(|arg| {
            let param = ctx.parameter.map(|p| p.to_string()).unwrap_or_default();
            arg.replace("{loan_id}", ctx.loan_id.as_str())
                .replace("{param}", &param)
        })
        .collect()
}

/// Runs one program to completion and classifies it by exit status and
/// sentinel markers.
#[derive(Debug, Clone)]
pub struct CommandStage {
    name: String,
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    markers: SentinelMarkers,
    kill_on_timeout: bool,
}

impl CommandStage {
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            markers: SentinelMarkers::default(),
            kill_on_timeout: true,
        }
    }

    pub fn from_config(config: &FileStageConfig) -> Self {
        let mut stage = Self::new(&config.name, &config.program)
            .with_args(config.args.clone())
            .with_markers(config.markers())
            .with_kill_on_timeout(config.kill_on_timeout);
        stage.working_dir = config.working_dir.clone();
        stage
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_markers(mut self, markers: SentinelMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// Whether the child is killed when the runner abandons the call.
    pub fn with_kill_on_timeout(mut self, kill: bool) -> Self {
        self.kill_on_timeout = kill;
        self
    }

    /// Spawn the program and wait for it, capturing both streams.
    pub async fn run_raw(&self, ctx: &StageContext) -> Result<RawStageOutput, StageError> {
        let args = render_args(&self.args, ctx);
        debug!("Stage {}: {} {}", self.name, self.program, args.join(" "));

        run_to_completion(
            &self.program,
            &args,
            self.working_dir.as_deref(),
            self.kill_on_timeout,
        )
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                StageError::Spawn(format!("{}: {}", self.program, e))
            }
            _ => StageError::Io(e),
        })
    }
}

#[async_trait]
impl Stage for CommandStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &StageContext) -> Result<StageReport, StageError> {
        let raw = self.run_raw(ctx).await?;
        Ok(StageReport::new(self.markers.classify(&raw), raw.combined()))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use loanflow_domain::StageVerdict;

    fn sh(name: &str, script: &str) -> CommandStage {
        CommandStage::new(name, "sh").with_args(vec![
            "-c".to_string(),
            script.to_string(),
            "stage".to_string(),
            "{loan_id}".to_string(),
            "{param}".to_string(),
        ])
    }

    #[test]
    fn test_render_args() {
        let template = vec!["run.py".to_string(), "{loan_id}".to_string(), "{param}".to_string()];
        let ctx = StageContext::new("L1");
        assert_eq!(render_args(&template, &ctx), vec!["run.py", "L1"]);

        let ctx = ctx.with_parameter(Some(5));
        assert_eq!(render_args(&template, &ctx), vec!["run.py", "L1", "5"]);

        let inline = vec!["--runs={param}".to_string()];
        assert_eq!(render_args(&inline, &StageContext::new("L1")), vec!["--runs="]);
    }

    #[tokio::test]
    async fn test_zero_exit_is_success() {
        let stage = sh("echo", "echo processed $1");
        let report = stage.execute(&StageContext::new("L1")).await.unwrap();
        assert_eq!(report.verdict, StageVerdict::Success);
        assert_eq!(report.transcript.trim(), "processed L1");
    }

    #[tokio::test]
    async fn test_parameter_is_passed() {
        let stage = sh("param", "echo runs=$2");
        let report = stage
            .execute(&StageContext::new("L1").with_parameter(Some(4)))
            .await
            .unwrap();
        assert!(report.transcript.contains("runs=4"));
    }

    #[tokio::test]
    async fn test_no_data_marker() {
        let stage = sh("form", "echo 'No Form 1003 documents found'; exit 1")
            .with_markers(SentinelMarkers::new().with_no_data("No Form 1003 documents found"));
        let report = stage.execute(&StageContext::new("L1")).await.unwrap();
        assert_eq!(
            report.verdict,
            StageVerdict::NoData("No Form 1003 documents found".to_string())
        );
    }

    #[tokio::test]
    async fn test_success_marker_overrides_exit_code() {
        let stage = sh("analysis", "echo 'CONSISTENCY SUMMARY'; exit 2")
            .with_markers(SentinelMarkers::new().with_success("CONSISTENCY SUMMARY"));
        let report = stage.execute(&StageContext::new("L1")).await.unwrap();
        assert_eq!(report.verdict, StageVerdict::Success);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failure_with_stderr() {
        let stage = sh("broken", "echo 'rate limited' >&2; exit 3");
        let report = stage.execute(&StageContext::new("L1")).await.unwrap();
        assert_eq!(report.verdict, StageVerdict::Failure("rate limited".to_string()));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let stage = CommandStage::new("ghost", "/nonexistent/loanflow-stage");
        let err = stage.execute(&StageContext::new("L1")).await.unwrap_err();
        assert!(matches!(err, StageError::Spawn(_)));
    }

    #[tokio::test]
    async fn test_hung_process_times_out_under_runner() {
        use loanflow_application::StageRunner;
        use loanflow_domain::{OutcomeKind, StageSpec};
        use std::time::{Duration, Instant};

        let stage = sh("hang", "sleep 30");
        let spec = StageSpec::new("hang", Duration::from_millis(200));
        let started = Instant::now();
        let result = StageRunner::default()
            .run(&spec, &stage, &StageContext::new("L1"))
            .await;
        assert_eq!(result.outcome, OutcomeKind::Timeout);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
