//! Immutable capability descriptors.
//!
//! A [`Capabilities`] value is the contract between one executor
//! implementation and the dispatch layer: six fields, fixed at construction,
//! that tell the dispatcher how the program may be scheduled. The field set
//! is closed. Both construction paths, the typed [`CapabilitiesBuilder`] and
//! the loose-JSON [`Capabilities::from_value`], reject anything missing or
//! unrecognized before a descriptor can exist.

use serde::{Deserialize, Serialize};

use crate::core::error::{ExecutorError, ExecutorResult};

/// What one executor implementation can do, and how it may be run.
///
/// The dispatcher caches and shares a descriptor across calls, so there are
/// no setters: once built, a descriptor never changes. Scheduling decisions
/// (serialize or not, how many cores to grant, whether to cap memory) are
/// made from these flags alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Capabilities {
    name: String,
    scratch: bool,
    thread_safe: bool,
    thread_parallel: bool,
    node_parallel: bool,
    managed_memory: bool,
}

impl Capabilities {
    /// Starts a builder for the descriptor of the executor called `name`.
    ///
    /// Every flag must be supplied before [`CapabilitiesBuilder::build`]
    /// will produce a descriptor.
    pub fn builder(name: impl Into<String>) -> CapabilitiesBuilder {
        CapabilitiesBuilder {
            name: name.into(),
            scratch: None,
            thread_safe: None,
            thread_parallel: None,
            node_parallel: None,
            managed_memory: None,
        }
    }

    /// Decodes a descriptor from loose JSON.
    ///
    /// Missing fields and unrecognized fields are both rejected, so a
    /// descriptor loaded from configuration obeys the same closed field set
    /// as one built in code.
    ///
    /// # Returns
    /// The descriptor, or [`ExecutorError::Validation`] describing what was
    /// missing or unknown.
    pub fn from_value(value: serde_json::Value) -> ExecutorResult<Self> {
        let caps: Self =
            serde_json::from_value(value).map_err(|e| ExecutorError::Validation(e.to_string()))?;
        if caps.name.trim().is_empty() {
            return Err(ExecutorError::Validation(
                "field `name` must not be empty".to_string(),
            ));
        }
        Ok(caps)
    }

    /// Unique identifier used for registry lookup and logging.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the program needs an isolated scratch directory for its I/O.
    pub fn scratch(&self) -> bool {
        self.scratch
    }

    /// Whether invocations may run concurrently within one process.
    /// When false the dispatcher must serialize calls to this executor.
    pub fn thread_safe(&self) -> bool {
        self.thread_safe
    }

    /// Whether the program can use more than one thread internally.
    /// The dispatcher grants the allotment through the job config.
    pub fn thread_parallel(&self) -> bool {
        self.thread_parallel
    }

    /// Whether the program can fan out across compute nodes.
    pub fn node_parallel(&self) -> bool {
        self.node_parallel
    }

    /// Whether the dispatcher must enforce a memory ceiling for this
    /// program rather than letting it size itself.
    pub fn managed_memory(&self) -> bool {
        self.managed_memory
    }
}

/// Builder for [`Capabilities`]. Created via [`Capabilities::builder`].
#[derive(Debug)]
pub struct CapabilitiesBuilder {
    name: String,
    scratch: Option<bool>,
    thread_safe: Option<bool>,
    thread_parallel: Option<bool>,
    node_parallel: Option<bool>,
    managed_memory: Option<bool>,
}

impl CapabilitiesBuilder {
    /// Sets whether the program needs a scratch directory.
    pub fn scratch(mut self, value: bool) -> Self {
        self.scratch = Some(value);
        self
    }

    /// Sets whether concurrent in-process invocations are safe.
    pub fn thread_safe(mut self, value: bool) -> Self {
        self.thread_safe = Some(value);
        self
    }

    /// Sets whether the program can use multiple threads internally.
    pub fn thread_parallel(mut self, value: bool) -> Self {
        self.thread_parallel = Some(value);
        self
    }

    /// Sets whether the program can span multiple compute nodes.
    pub fn node_parallel(mut self, value: bool) -> Self {
        self.node_parallel = Some(value);
        self
    }

    /// Sets whether the dispatcher must enforce a memory ceiling.
    pub fn managed_memory(mut self, value: bool) -> Self {
        self.managed_memory = Some(value);
        self
    }

    /// Validates the closed field set and produces the descriptor.
    ///
    /// # Returns
    /// The descriptor, or [`ExecutorError::Validation`] naming every field
    /// that was never set.
    pub fn build(self) -> ExecutorResult<Capabilities> {
        if self.name.trim().is_empty() {
            return Err(ExecutorError::Validation(
                "field `name` must not be empty".to_string(),
            ));
        }

        let mut missing = Vec::new();
        if self.scratch.is_none() {
            missing.push("scratch");
        }
        if self.thread_safe.is_none() {
            missing.push("thread_safe");
        }
        if self.thread_parallel.is_none() {
            missing.push("thread_parallel");
        }
        if self.node_parallel.is_none() {
            missing.push("node_parallel");
        }
        if self.managed_memory.is_none() {
            missing.push("managed_memory");
        }
        if !missing.is_empty() {
            return Err(ExecutorError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        Ok(Capabilities {
            name: self.name,
            scratch: self.scratch.unwrap_or_default(),
            thread_safe: self.thread_safe.unwrap_or_default(),
            thread_parallel: self.thread_parallel.unwrap_or_default(),
            node_parallel: self.node_parallel.unwrap_or_default(),
            managed_memory: self.managed_memory.unwrap_or_default(),
        })
    }
}
