//! Typed failures for the executor contract.
//!
//! Every fallible operation in the crate returns [`ExecutorResult`], so the
//! dispatch layer can match on [`ExecutorError`], log the stable [`code`]
//! tag, and decide on retry or fallback itself. Nothing in this crate
//! retries internally.
//!
//! [`code`]: ExecutorError::code

use std::time::Duration;

use thiserror::Error;

/// Convenience alias used across the crate.
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Failure taxonomy for descriptor construction and the lifecycle operations.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// A capability descriptor was built with a missing, unknown, or invalid
    /// field. Fatal to that executor's registration.
    #[error("invalid capability descriptor: {0}")]
    Validation(String),

    /// `found(true)` probed for a program that is absent from this host.
    /// The hint tells an operator what to install.
    #[error("program '{program}' was not found in the runtime environment. {hint}")]
    EnvironmentNotFound { program: String, hint: String },

    /// The program is present but its version output could not be normalized.
    #[error("could not parse a version from {program} output: {output:?}")]
    VersionParse { program: String, output: String },

    /// A lifecycle operation with a default body was invoked on an
    /// implementation that never overrode it.
    #[error("{operation} is not implemented for the '{executor}' executor")]
    Unsupported {
        operation: &'static str,
        executor: String,
    },

    /// The external program outlived its deadline. Its process tree has
    /// already been terminated by the time this is returned.
    #[error("execution exceeded the {limit:?} time limit and was terminated")]
    Timeout { limit: Duration },

    /// The external program exited with a nonzero or signal status.
    #[error("program exited with status {status:?}: {stderr}")]
    ExecutionFailure {
        status: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("invalid input: {0}")]
    Input(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecutorError {
    /// Builds the standard failure for a lifecycle stub that was never
    /// overridden, naming the offending implementation.
    pub fn unsupported(operation: &'static str, executor: impl Into<String>) -> Self {
        Self::Unsupported {
            operation,
            executor: executor.into(),
        }
    }

    /// Stable snake_case tag for dispatcher-side structured logging.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::EnvironmentNotFound { .. } => "environment_not_found",
            Self::VersionParse { .. } => "version_parse_error",
            Self::Unsupported { .. } => "unsupported_operation",
            Self::Timeout { .. } => "timeout",
            Self::ExecutionFailure { .. } => "execution_failure",
            Self::Input(_) => "input_error",
            Self::Io(_) => "io_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_names_the_executor() {
        let err = ExecutorError::unsupported("build_input", "mystic");
        assert_eq!(
            err.to_string(),
            "build_input is not implemented for the 'mystic' executor"
        );
        assert_eq!(err.code(), "unsupported_operation");
    }

    #[test]
    fn test_timeout_display_carries_the_limit() {
        let err = ExecutorError::Timeout {
            limit: Duration::from_secs(30),
        };
        assert!(err.to_string().contains("30s"));
        assert_eq!(err.code(), "timeout");
    }

    #[test]
    fn test_environment_not_found_keeps_the_hint() {
        let err = ExecutorError::EnvironmentNotFound {
            program: "mystic".into(),
            hint: "Install the mystic package.".into(),
        };
        assert!(err.to_string().contains("Install the mystic package."));
    }

    #[test]
    fn test_io_errors_convert() {
        fn touch() -> ExecutorResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))?;
            Ok(())
        }
        assert_eq!(touch().unwrap_err().code(), "io_error");
    }
}
