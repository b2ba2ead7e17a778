//! Executor for the `echo` command.
//!
//! This is the reference integration: it exercises every phase of the
//! lifecycle against a program that exists on effectively every host, so
//! end-to-end behavior can be verified without installing anything.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::core::capabilities::Capabilities;
use crate::core::config::JobConfig;
use crate::core::error::{ExecutorError, ExecutorResult};
use crate::core::executor::{ProgramExecutor, ProgramInput};
use crate::core::{JobRequest, JobResult, OutputFiles};
use crate::exec::{self, RunCommand, ScratchDir};

/// Ceiling applied when the job config does not carry its own limit.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const HINT: &str = "echo ships with GNU coreutils (or busybox); install one or adjust PATH.";

/// Runs `echo` and reports what came back on stdout.
pub struct EchoExecutor {
    caps: Capabilities,
}

impl EchoExecutor {
    pub fn new() -> Self {
        let caps = Capabilities::builder("echo")
            .scratch(true)
            .thread_safe(true)
            .thread_parallel(false)
            .node_parallel(false)
            .managed_memory(false)
            .build()
            .expect("every echo capability flag is set");
        Self { caps }
    }
}

impl Default for EchoExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgramExecutor for EchoExecutor {
    fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    fn found(&self, raise_error: bool) -> ExecutorResult<bool> {
        match exec::which("echo") {
            Some(_) => Ok(true),
            None if raise_error => Err(ExecutorError::EnvironmentNotFound {
                program: "echo".into(),
                hint: HINT.into(),
            }),
            None => Ok(false),
        }
    }

    async fn get_version(&self) -> ExecutorResult<String> {
        exec::require("echo", HINT)?;
        exec::probe_version("echo", &["--version"]).await
    }

    fn build_input(
        &self,
        request: &JobRequest,
        config: &JobConfig,
        template: Option<&str>,
    ) -> ExecutorResult<ProgramInput> {
        let message = request
            .get("message")
            .and_then(|value| value.as_str())
            .ok_or_else(|| {
                ExecutorError::Input("request must carry a string `message` field".into())
            })?;
        let rendered = match template {
            Some(template) => template.replace("{message}", message),
            None => message.to_string(),
        };

        let mut input = ProgramInput::from_command(["echo".to_string(), rendered]);
        input.scratch_root = config.scratch_root.clone();
        input.retain_scratch = config.retain_scratch;
        Ok(input)
    }

    async fn execute(
        &self,
        inputs: &ProgramInput,
        extra_outfiles: &[String],
        extra_commands: &[String],
        scratch_name: Option<&str>,
        timeout: Option<Duration>,
    ) -> ExecutorResult<OutputFiles> {
        let scratch = ScratchDir::create(inputs.scratch_root.as_deref(), scratch_name)?;

        let result: ExecutorResult<OutputFiles> = async {
            scratch.write_infiles(&inputs.infiles)?;

            let mut command = RunCommand::new(inputs.command.clone())
                .args(extra_commands.iter().cloned())
                .envs(&inputs.env)
                .current_dir(scratch.path());
            if let Some(stdin) = &inputs.stdin {
                command = command.stdin(stdin.clone());
            }
            if let Some(limit) = timeout {
                command = command.timeout(limit);
            }
            let output = command.run().await?.require_success()?;

            let mut outfiles = scratch.collect_outfiles(extra_outfiles)?;
            outfiles.insert("stdout".to_string(), output.stdout);
            outfiles.insert("stderr".to_string(), output.stderr);
            Ok(outfiles)
        }
        .await;

        // Retention applies to failed runs as well.
        if inputs.retain_scratch {
            let kept = scratch.keep();
            log::info!("retained scratch directory at {}", kept.display());
        }
        result
    }

    fn parse_output(&self, outfiles: &OutputFiles, _request: &JobRequest) -> ExecutorResult<JobResult> {
        let stdout = outfiles.get("stdout").ok_or_else(|| {
            ExecutorError::Input("outfiles is missing the reserved `stdout` capture".into())
        })?;
        Ok(json!({
            "echoed": stdout.trim_end_matches(['\r', '\n']),
            "success": true,
        }))
    }

    /// Chains the three phases: `build_input`, `execute`, `parse_output`.
    async fn compute(&self, request: &JobRequest, config: &JobConfig) -> ExecutorResult<JobResult> {
        self.found(true)?;
        let input = self.build_input(request, config, None)?;
        let timeout = config.timeout().unwrap_or(DEFAULT_TIMEOUT);
        let outfiles = self.execute(&input, &[], &[], None, Some(timeout)).await?;
        self.parse_output(&outfiles, request)
    }
}
