//! Host-side plumbing for driving external programs.
//!
//! Concrete executors build their `execute` and `get_version` on these
//! pieces: [`locate`] finds the binary, [`scratch`] gives each invocation an
//! isolated working directory, [`runner`] spawns and supervises the
//! subprocess, and [`version`] turns whatever the program prints into a
//! comparable version string.

pub mod locate;
pub mod runner;
pub mod scratch;
pub mod version;

pub use locate::{require, which};
pub use runner::{RunCommand, RunOutput};
pub use scratch::ScratchDir;
pub use version::{normalize_version, probe_version};
