//! End-to-end scenarios driving the public API the way a dispatcher would.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crucible::prelude::*;
use serde_json::json;

#[cfg(unix)]
use crucible::exec::{RunCommand, ScratchDir};

#[test]
fn test_descriptor_builds_the_same_from_code_and_json() {
    let built = Capabilities::builder("demo")
        .scratch(true)
        .thread_safe(false)
        .thread_parallel(false)
        .node_parallel(false)
        .managed_memory(false)
        .build()
        .unwrap();
    assert_eq!(built.name(), "demo");
    assert!(built.scratch());
    assert!(!built.thread_safe());
    assert!(!built.thread_parallel());
    assert!(!built.node_parallel());
    assert!(!built.managed_memory());

    let parsed = Capabilities::from_value(json!({
        "name": "demo",
        "scratch": true,
        "thread_safe": false,
        "thread_parallel": false,
        "node_parallel": false,
        "managed_memory": false,
    }))
    .unwrap();
    assert_eq!(parsed, built);
}

/// A complete integration owning all three phases, the shape a real program
/// wrapper takes: `cat` reads the request text from stdin and the captured
/// stdout becomes the result.
#[cfg(unix)]
struct DemoExecutor {
    caps: Capabilities,
}

#[cfg(unix)]
impl DemoExecutor {
    fn new() -> Self {
        let caps = Capabilities::builder("demo")
            .scratch(true)
            .thread_safe(false)
            .thread_parallel(false)
            .node_parallel(false)
            .managed_memory(false)
            .build()
            .unwrap();
        Self { caps }
    }
}

#[cfg(unix)]
#[async_trait]
impl ProgramExecutor for DemoExecutor {
    fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    fn found(&self, raise_error: bool) -> ExecutorResult<bool> {
        match crucible::exec::which("cat") {
            Some(_) => Ok(true),
            None if raise_error => Err(ExecutorError::EnvironmentNotFound {
                program: "cat".into(),
                hint: "cat ships with every POSIX userland.".into(),
            }),
            None => Ok(false),
        }
    }

    async fn get_version(&self) -> ExecutorResult<String> {
        crucible::exec::probe_version("cat", &["--version"]).await
    }

    fn build_input(
        &self,
        request: &JobRequest,
        _config: &JobConfig,
        _template: Option<&str>,
    ) -> ExecutorResult<ProgramInput> {
        let text = request
            .get("text")
            .and_then(|value| value.as_str())
            .ok_or_else(|| {
                ExecutorError::Input("request must carry a string `text` field".into())
            })?;
        let mut input = ProgramInput::from_command(["cat"]);
        input.stdin = Some(text.to_string());
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
        scratch.write_infiles(&inputs.infiles)?;

        let mut command = RunCommand::new(inputs.command.clone())
            .args(extra_commands.iter().cloned())
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
        Ok(outfiles)
    }

    fn parse_output(&self, outfiles: &OutputFiles, _request: &JobRequest) -> ExecutorResult<JobResult> {
        let stdout = outfiles.get("stdout").ok_or_else(|| {
            ExecutorError::Input("outfiles is missing the reserved `stdout` capture".into())
        })?;
        Ok(json!({"text": stdout}))
    }

    async fn compute(&self, request: &JobRequest, config: &JobConfig) -> ExecutorResult<JobResult> {
        self.found(true)?;
        let input = self.build_input(request, config, None)?;
        let outfiles = self.execute(&input, &[], &[], None, config.timeout()).await?;
        self.parse_output(&outfiles, request)
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_demo_compute_round_trips_through_a_subprocess() {
    let executor = DemoExecutor::new();
    let result = executor
        .compute(&json!({"text": "pass-through"}), &JobConfig::default())
        .await
        .unwrap();
    assert_eq!(result["text"], "pass-through");
}

#[cfg(unix)]
#[tokio::test]
async fn test_execute_deadline_interrupts_a_stalled_program() {
    let executor = DemoExecutor::new();
    let input = ProgramInput::from_command(["sh", "-c", "sleep 30"]);

    let started = Instant::now();
    let err = executor
        .execute(&input, &[], &[], None, Some(Duration::from_millis(300)))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "timeout");
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "the deadline did not interrupt the run promptly"
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_registry_drives_echo_end_to_end() {
    let registry = ProgramRegistry::new();
    let echo = registry.get_checked("echo").unwrap();
    let result = echo
        .compute(&json!({"message": "hello round trip"}), &JobConfig::default())
        .await
        .unwrap();
    assert_eq!(result["echoed"], "hello round trip");
    assert_eq!(result["success"], true);
}

#[cfg(unix)]
#[test]
fn test_registry_reports_the_builtin_as_available() {
    let registry = ProgramRegistry::new();
    assert!(registry.list_all().contains(&"echo".to_string()));
    assert!(registry.list_available().contains(&"echo".to_string()));
}

#[tokio::test]
async fn test_unimplemented_phases_surface_as_unsupported() {
    struct Opaque {
        caps: Capabilities,
    }

    #[async_trait]
    impl ProgramExecutor for Opaque {
        fn capabilities(&self) -> &Capabilities {
            &self.caps
        }

        fn found(&self, _raise_error: bool) -> ExecutorResult<bool> {
            Ok(true)
        }

        async fn get_version(&self) -> ExecutorResult<String> {
            Ok("2.1.0".into())
        }

        async fn compute(&self, _request: &JobRequest, _config: &JobConfig) -> ExecutorResult<JobResult> {
            Ok(json!({"ok": true}))
        }
    }

    let executor = Opaque {
        caps: Capabilities::builder("opaque")
            .scratch(false)
            .thread_safe(true)
            .thread_parallel(false)
            .node_parallel(false)
            .managed_memory(false)
            .build()
            .unwrap(),
    };

    let err = executor
        .build_input(&json!({}), &JobConfig::default(), None)
        .unwrap_err();
    assert_eq!(err.code(), "unsupported_operation");
    assert!(err.to_string().contains("opaque"));

    let err = executor
        .execute(&ProgramInput::default(), &[], &[], None, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "unsupported_operation");

    let err = executor
        .parse_output(&OutputFiles::new(), &json!({}))
        .unwrap_err();
    assert_eq!(err.code(), "unsupported_operation");

    // The bespoke compute still works; the generic phases are simply not
    // part of this integration's surface.
    let result = executor
        .compute(&json!({}), &JobConfig::default())
        .await
        .unwrap();
    assert_eq!(result["ok"], true);
}

#[tokio::test]
async fn test_non_thread_safe_executors_are_serialized() {
    struct TimingExecutor {
        caps: Capabilities,
        windows: Mutex<Vec<(Instant, Instant)>>,
    }

    #[async_trait]
    impl ProgramExecutor for TimingExecutor {
        fn capabilities(&self) -> &Capabilities {
            &self.caps
        }

        fn found(&self, _raise_error: bool) -> ExecutorResult<bool> {
            Ok(true)
        }

        async fn get_version(&self) -> ExecutorResult<String> {
            Ok("0.0.0".into())
        }

        async fn compute(&self, _request: &JobRequest, _config: &JobConfig) -> ExecutorResult<JobResult> {
            let entered = Instant::now();
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.windows.lock().unwrap().push((entered, Instant::now()));
            Ok(json!(null))
        }
    }

    let executor = Arc::new(TimingExecutor {
        caps: Capabilities::builder("timing")
            .scratch(false)
            .thread_safe(false)
            .thread_parallel(false)
            .node_parallel(false)
            .managed_memory(false)
            .build()
            .unwrap(),
        windows: Mutex::new(Vec::new()),
    });
    assert!(!executor.capabilities().thread_safe());

    // The dispatcher's side of the contract: one invocation at a time when
    // the descriptor says in-process calls must not overlap.
    let gate = Arc::new(tokio::sync::Mutex::new(()));
    let mut handles = Vec::new();
    for _ in 0..2 {
        let executor = Arc::clone(&executor);
        let gate = Arc::clone(&gate);
        handles.push(tokio::spawn(async move {
            let _serial = gate.lock().await;
            executor.compute(&json!({}), &JobConfig::default()).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let mut windows = executor.windows.lock().unwrap().clone();
    windows.sort();
    assert_eq!(windows.len(), 2);
    assert!(
        windows[0].1 <= windows[1].0,
        "invocations overlapped despite the serialization gate"
    );
}
