//! Subprocess plumbing shared by concrete executors.
//!
//! [`RunCommand`] spawns the external program in its own process group,
//! drains stdout/stderr while it runs, feeds stdin, and enforces the
//! caller's deadline. On expiry the whole group is signalled (SIGTERM, a
//! grace period, SIGKILL) and reaped before [`ExecutorError::Timeout`] is
//! returned, so no child outlives the call.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use command_group::{AsyncCommandGroup, AsyncGroupChild};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::core::error::{ExecutorError, ExecutorResult};

/// How long a signalled process group gets to exit before SIGKILL.
const KILL_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// One subprocess invocation, assembled fluently and consumed by
/// [`run`](RunCommand::run).
#[derive(Debug, Clone)]
pub struct RunCommand {
    command: Vec<String>,
    env: HashMap<String, String>,
    stdin: Option<String>,
    current_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl RunCommand {
    /// Starts from the full command line, program first.
    pub fn new(command: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            env: HashMap::new(),
            stdin: None,
            current_dir: None,
            timeout: None,
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.command.push(arg.into());
        self
    }

    /// Appends every argument in order.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.command.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds one environment variable visible to the program.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Adds every variable in the map.
    pub fn envs(mut self, vars: &HashMap<String, String>) -> Self {
        for (key, value) in vars {
            self.env.insert(key.clone(), value.clone());
        }
        self
    }

    /// Feeds `input` to the program on stdin.
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Runs the program inside `dir` instead of the caller's directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Caps the whole run at `limit`.
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Spawns the program and waits for it to finish.
    ///
    /// # Returns
    /// The captured [`RunOutput`] whatever the exit status. A program that
    /// cannot be spawned surfaces as [`ExecutorError::Io`]; a blown deadline
    /// surfaces as [`ExecutorError::Timeout`] after the process tree has
    /// been terminated and reaped.
    pub async fn run(self) -> ExecutorResult<RunOutput> {
        let (program, args) = self.command.split_first().ok_or_else(|| {
            ExecutorError::Input("command line must not be empty".to_string())
        })?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        log::debug!("spawning {program} with {} argument(s)", args.len());
        let started = Instant::now();
        let mut child = cmd.group_spawn()?;

        // Drain both pipes while the program runs so it can never block on
        // a full one.
        let stdout_task = spawn_capture(child.inner().stdout.take());
        let stderr_task = spawn_capture(child.inner().stderr.take());

        // Feed stdin from its own task too: a program that never reads must
        // not stall the run past the deadline below.
        if let Some(input) = self.stdin {
            if let Some(mut handle) = child.inner().stdin.take() {
                let program = program.clone();
                tokio::task::spawn(async move {
                    // A program that exits without reading its stdin is not
                    // an error; the closed pipe is enough.
                    if let Err(e) = handle.write_all(input.as_bytes()).await {
                        log::debug!("stdin write to {program} ended early: {e}");
                    }
                });
            }
        }

        let status = match self.timeout {
            Some(limit) => {
                tokio::select! {
                    status = child.wait() => status?,
                    _ = tokio::time::sleep(limit) => {
                        log::warn!(
                            "{program} exceeded its {limit:?} deadline, terminating process group"
                        );
                        terminate_group(&mut child).await;
                        return Err(ExecutorError::Timeout { limit });
                    }
                }
            }
            None => child.wait().await?,
        };

        let (stdout, stderr) = futures::future::join(stdout_task, stderr_task).await;
        Ok(RunOutput {
            status: status.code(),
            success: status.success(),
            stdout: stdout.unwrap_or_default(),
            stderr: stderr.unwrap_or_default(),
            duration: started.elapsed(),
        })
    }
}

/// What came back from one finished subprocess run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Exit code, when the program exited normally rather than by signal.
    pub status: Option<i32>,
    /// Whether the exit status was zero.
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    /// Wall-clock time from spawn to exit.
    pub duration: Duration,
}

impl RunOutput {
    /// Folds a failed status into [`ExecutorError::ExecutionFailure`] with
    /// the captured diagnostics attached; a successful run passes through.
    pub fn require_success(self) -> ExecutorResult<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(ExecutorError::ExecutionFailure {
                status: self.status,
                stdout: self.stdout,
                stderr: self.stderr,
            })
        }
    }
}

fn spawn_capture<R>(stream: Option<R>) -> JoinHandle<String>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::task::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut stream) = stream {
            if let Err(e) = stream.read_to_end(&mut buf).await {
                log::debug!("output capture ended early: {e}");
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// SIGTERM the group, give it [`KILL_GRACE_PERIOD`] to exit, then SIGKILL,
/// then reap. The SIGKILL always goes to the whole group, even when the
/// leader quit during the grace period: a member may have ignored the
/// SIGTERM. Signalling a group that already died is fine.
#[cfg(unix)]
async fn terminate_group(child: &mut AsyncGroupChild) {
    use nix::errno::Errno;
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.inner().id() else {
        return;
    };
    let group = Pid::from_raw(-(pid as i32));

    if let Err(e) = signal::kill(group, Signal::SIGTERM) {
        if e != Errno::ESRCH {
            log::warn!("SIGTERM to process group {pid} failed: {e}");
        }
    }

    let deadline = tokio::time::Instant::now() + KILL_GRACE_PERIOD;
    while tokio::time::Instant::now() < deadline {
        if child.inner().try_wait().ok().flatten().is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    if let Err(e) = signal::kill(group, Signal::SIGKILL) {
        if e != Errno::ESRCH {
            log::warn!("SIGKILL to process group {pid} failed: {e}");
        }
    }
    let _ = child.wait().await;
}

#[cfg(not(unix))]
async fn terminate_group(child: &mut AsyncGroupChild) {
    let _ = child.kill().await;
    let _ = child.wait().await;
}
