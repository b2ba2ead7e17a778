//! Per-job resource configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Resource and environment settings the dispatcher attaches to one job.
///
/// Executors read their allotment from here instead of sizing themselves:
/// `ncores` matters when the descriptor advertises `thread_parallel`,
/// `memory_gib` when it advertises `managed_memory`. Unset optional fields
/// mean "no constraint communicated".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// CPU threads granted to the program.
    #[serde(default = "default_ncores")]
    pub ncores: usize,
    /// Compute nodes granted to the program.
    #[serde(default = "default_nnodes")]
    pub nnodes: usize,
    /// Memory ceiling, in GiB, the program must stay under.
    #[serde(default)]
    pub memory_gib: Option<f64>,
    /// Root under which scratch directories are created. System temp dir
    /// when unset.
    #[serde(default)]
    pub scratch_root: Option<PathBuf>,
    /// Keep the scratch directory after the run instead of removing it.
    #[serde(default)]
    pub retain_scratch: bool,
    /// Wall-clock limit for the execute phase, in seconds. No deadline
    /// when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_ncores() -> usize {
    1
}

fn default_nnodes() -> usize {
    1
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            ncores: 1,
            nnodes: 1,
            memory_gib: None,
            scratch_root: None,
            retain_scratch: false,
            timeout_secs: None,
        }
    }
}

impl JobConfig {
    /// The execute-phase deadline as a [`Duration`], when one was set.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
