pub mod capabilities;
pub mod config;
pub mod error;
pub mod executor;
pub mod registry;

/// Opaque job request payload owned by the surrounding dispatch system.
pub type JobRequest = serde_json::Value;

/// Opaque result payload produced by the parse phase.
pub type JobResult = serde_json::Value;

/// Captured output artifacts keyed by name. `"stdout"` and `"stderr"` are
/// reserved keys, always present after a successful execute phase.
pub type OutputFiles = std::collections::HashMap<String, String>;
