//! Lookup table of executor implementations.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::error::{ExecutorError, ExecutorResult};
use crate::core::executor::ProgramExecutor;
use crate::programs::echo::EchoExecutor;

/// Maps program names to the executor implementations that drive them.
///
/// Names are case-insensitive: entries are keyed by the lowercased
/// descriptor name, and lookups lowercase their argument. Registering a
/// name twice replaces the earlier implementation.
pub struct ProgramRegistry {
    executors: HashMap<String, Arc<dyn ProgramExecutor>>,
}

impl ProgramRegistry {
    /// Creates a registry with the built-in programs registered.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(EchoExecutor::new()));
        registry
    }

    /// Creates a registry with nothing in it, for embedders that bring
    /// their own set.
    pub fn empty() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    /// Registers `executor` under its descriptor name.
    pub fn register(&mut self, executor: Arc<dyn ProgramExecutor>) {
        let name = executor.capabilities().name().to_ascii_lowercase();
        if self.executors.contains_key(&name) {
            log::warn!("executor '{name}' was already registered, replacing it");
        }
        self.executors.insert(name, executor);
    }

    /// Removes and returns the named executor, if it was registered.
    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn ProgramExecutor>> {
        self.executors.remove(&name.to_ascii_lowercase())
    }

    /// Looks up an executor by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ProgramExecutor>> {
        self.executors.get(&name.to_ascii_lowercase()).cloned()
    }

    /// Like [`get`](Self::get), but an unknown name is a typed error and
    /// the executor's program must actually be present on this host.
    ///
    /// # Returns
    /// The executor, [`ExecutorError::Input`] for an unregistered name, or
    /// [`ExecutorError::EnvironmentNotFound`] from the executor's own probe.
    pub fn get_checked(&self, name: &str) -> ExecutorResult<Arc<dyn ProgramExecutor>> {
        let executor = self
            .get(name)
            .ok_or_else(|| ExecutorError::Input(format!("program '{name}' is not registered")))?;
        executor.found(true)?;
        Ok(executor)
    }

    /// Every registered name, sorted.
    pub fn list_all(&self) -> Vec<String> {
        let mut names: Vec<String> = self.executors.keys().cloned().collect();
        names.sort();
        names
    }

    /// Every registered name whose program is actually present on this
    /// host, sorted.
    pub fn list_available(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .executors
            .iter()
            .filter(|(_, executor)| matches!(executor.found(false), Ok(true)))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

impl Default for ProgramRegistry {
    fn default() -> Self {
        Self::new()
    }
}
