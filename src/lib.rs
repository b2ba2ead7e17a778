//! # Crucible
//!
//! An async harness for driving external programs: capability discovery,
//! input construction, supervised subprocess execution, and output parsing
//! behind a single trait.
//!
//! ## Features
//!
//! - **One Lifecycle Trait**: `build_input`, `execute`, and `parse_output` phases behind [`ProgramExecutor`]
//! - **Honest Capability Descriptors**: immutable, validated flags a dispatcher can plan around
//! - **Supervised Subprocesses**: process groups, captured pipes, and hard deadlines that leave no orphans behind
//! - **Scratch Hygiene**: per-run working directories that clean themselves up unless told to stay
//! - **Version Probing**: normalized program versions with a semver fast path
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use crucible::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), ExecutorError> {
//!     let registry = ProgramRegistry::new();
//!     let echo = registry.get_checked("echo")?;
//!
//!     let request = json!({"message": "hello"});
//!     let result = echo.compute(&request, &JobConfig::default()).await?;
//!     println!("{result}");
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`exec`]: Subprocess plumbing (process groups, scratch directories, PATH lookup, version probing)
//! - [`programs`]: Built-in program integrations
//! - [`prelude`]: Commonly used types and traits (import with `use crucible::prelude::*`)

// ============================================================================
// Core Module
// ============================================================================

mod core;

pub mod exec;
pub mod programs;

// ============================================================================
// Public Re-exports - Granular Imports
// ============================================================================

// Capability descriptors
pub use crate::core::capabilities::{Capabilities, CapabilitiesBuilder};

// The lifecycle trait and its inputs
pub use crate::core::config::JobConfig;
pub use crate::core::executor::{ProgramExecutor, ProgramInput};
pub use crate::core::{JobRequest, JobResult, OutputFiles};

// Errors
pub use crate::core::error::{ExecutorError, ExecutorResult};

// Registry
pub use crate::core::registry::ProgramRegistry;

// Built-in programs
pub use programs::EchoExecutor;

// Implementors need the same attribute macro the trait is declared with.
pub use async_trait::async_trait;

// ============================================================================
// Prelude Module - Convenient Bulk Imports
// ============================================================================

/// The main prelude: imports everything you need to drive or implement
/// an executor.
///
/// # Example
/// ```rust
/// use crucible::prelude::*;
/// ```
pub mod prelude {
    pub use super::{
        async_trait,
        // Descriptors
        Capabilities,
        CapabilitiesBuilder,
        // Programs
        EchoExecutor,
        ExecutorError,
        ExecutorResult,
        JobConfig,
        JobRequest,
        JobResult,
        OutputFiles,
        // Lifecycle
        ProgramExecutor,
        ProgramInput,
        ProgramRegistry,
    };
}

// ============================================================================
// Re-export commonly used external types for convenience
// ============================================================================

pub use serde_json::Value as JsonValue;

// ============================================================================
// Library Metadata
// ============================================================================

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of this crate.
pub const NAME: &str = env!("CARGO_PKG_NAME");
