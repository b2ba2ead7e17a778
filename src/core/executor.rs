//! The executor contract.
//!
//! [`ProgramExecutor`] is the seam between the dispatch layer and an
//! arbitrary external computation program. A concrete integration pairs an
//! immutable [`Capabilities`] descriptor with the lifecycle operations the
//! dispatcher drives, and the dispatcher never needs to know how any
//! particular program is invoked.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::capabilities::Capabilities;
use crate::core::config::JobConfig;
use crate::core::error::{ExecutorError, ExecutorResult};
use crate::core::{JobRequest, JobResult, OutputFiles};

/// Structured payload produced by [`build_input`](ProgramExecutor::build_input)
/// and consumed by [`execute`](ProgramExecutor::execute).
///
/// Scratch policy rides along with the invocation data because `execute`
/// owns the scratch directory's lifetime: the build phase copies
/// `scratch_root` and `retain_scratch` over from the job config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramInput {
    /// Full command line, program first.
    pub command: Vec<String>,
    /// Input files written into the working directory before the run,
    /// keyed by file name.
    #[serde(default)]
    pub infiles: HashMap<String, String>,
    /// Extra environment variables for the program.
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Text fed to the program on stdin.
    #[serde(default)]
    pub stdin: Option<String>,
    /// Root under which the scratch directory is created. System temp dir
    /// when unset.
    #[serde(default)]
    pub scratch_root: Option<PathBuf>,
    /// Keep the scratch directory after the run instead of removing it.
    #[serde(default)]
    pub retain_scratch: bool,
}

impl ProgramInput {
    /// Builds an input that just runs `command`, with no files, environment,
    /// or stdin attached.
    pub fn from_command(command: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

/// Contract implemented by every external-program integration.
///
/// A job flows through three phases:
/// 1. **Build**: [`build_input`](Self::build_input) turns the opaque job
///    request plus resource config into a [`ProgramInput`]
/// 2. **Execute**: [`execute`](Self::execute) runs the program and captures
///    its raw output artifacts
/// 3. **Parse**: [`parse_output`](Self::parse_output) turns those artifacts
///    into the opaque result payload
///
/// [`compute`](Self::compute) is the orchestration entry point and the only
/// operation the dispatcher calls for a job. Composing the three phases in
/// order is the usual shape of a `compute`, but it is a convention, not a
/// requirement: an integration that drives a library call instead of a
/// subprocess may skip phases, and each implementation documents its own
/// composition.
///
/// `capabilities`, `found`, `get_version`, and `compute` are required of
/// every implementation. The three phase operations have default bodies
/// that fail with [`ExecutorError::Unsupported`] naming the implementation,
/// which tells the dispatcher this executor cannot be driven through the
/// generic path.
///
/// Implementations must be shareable across tasks (`Send + Sync`); whether
/// two invocations may actually run concurrently in one process is declared
/// by the descriptor's `thread_safe` flag, and honoring it is the
/// dispatcher's job.
#[async_trait]
pub trait ProgramExecutor: Send + Sync {
    /// The immutable capability descriptor for this integration.
    fn capabilities(&self) -> &Capabilities;

    /// Probes whether the external program (and any support tooling) is
    /// installed and discoverable on this host.
    ///
    /// The probe must be cheap, side-effect-free, and idempotent: a PATH
    /// scan, not a subprocess. When `raise_error` is false this never
    /// returns `Err`; when `raise_error` is true an absent program becomes
    /// [`ExecutorError::EnvironmentNotFound`] carrying a remediation hint.
    fn found(&self, raise_error: bool) -> ExecutorResult<bool>;

    /// Queries the external program's version and returns it normalized for
    /// comparison and logging.
    ///
    /// Fails like [`found(true)`](Self::found) when the program is absent,
    /// and with [`ExecutorError::VersionParse`] when the program's output
    /// does not contain a recognizable version. Repeated calls in an
    /// unchanged environment return the same string.
    async fn get_version(&self) -> ExecutorResult<String>;

    /// Translates a job request plus resource config into the structured
    /// payload [`execute`](Self::execute) needs.
    ///
    /// `template` is an optional hook for customizing program-specific
    /// input generation; implementations define its syntax.
    fn build_input(
        &self,
        _request: &JobRequest,
        _config: &JobConfig,
        _template: Option<&str>,
    ) -> ExecutorResult<ProgramInput> {
        Err(ExecutorError::unsupported(
            "build_input",
            self.capabilities().name(),
        ))
    }

    /// Runs the external program and captures its raw output artifacts.
    ///
    /// `extra_outfiles` names artifacts to retrieve beyond the reserved
    /// `"stdout"`/`"stderr"` captures; `extra_commands` is appended to the
    /// command line from `inputs`; `scratch_name` labels the isolated
    /// per-invocation working directory used when the descriptor's
    /// `scratch` flag is true.
    ///
    /// When `timeout` elapses the whole process tree is terminated before
    /// [`ExecutorError::Timeout`] is returned, and no partial artifacts are
    /// kept. The scratch directory is removed on success and failure alike
    /// unless retention was requested through the inputs.
    async fn execute(
        &self,
        _inputs: &ProgramInput,
        _extra_outfiles: &[String],
        _extra_commands: &[String],
        _scratch_name: Option<&str>,
        _timeout: Option<Duration>,
    ) -> ExecutorResult<OutputFiles> {
        Err(ExecutorError::unsupported(
            "execute",
            self.capabilities().name(),
        ))
    }

    /// Converts captured output artifacts into the result payload.
    ///
    /// Borrows its inputs, so neither the artifacts nor the request can be
    /// mutated.
    fn parse_output(
        &self,
        _outfiles: &OutputFiles,
        _request: &JobRequest,
    ) -> ExecutorResult<JobResult> {
        Err(ExecutorError::unsupported(
            "parse_output",
            self.capabilities().name(),
        ))
    }

    /// Runs one job end to end: the only operation the dispatcher calls
    /// directly.
    ///
    /// Returns a well-formed result payload or a typed error; never a
    /// partial result. Retries are the dispatcher's business, not this
    /// method's.
    async fn compute(&self, request: &JobRequest, config: &JobConfig) -> ExecutorResult<JobResult>;
}

/// Identifies an executor trait object by its descriptor name.
impl fmt::Debug for dyn ProgramExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramExecutor")
            .field("name", &self.capabilities().name())
            .finish()
    }
}
