//! Runtime engine configuration.
//!
//! Unlike the teacher's `config/` module — a two-tier compile-time-feature
//! plus cold-path-TOML design built to protect a hot trading loop from
//! branch overhead — this core has no such hot/cold split to protect, so
//! configuration is a plain runtime struct constructed with `Default` plus
//! builder-style setters, in the shape of the pack's `OmsConfig`-style
//! structs and the teacher's own `RiskLimits`. It still derives
//! `Serialize`/`Deserialize` the way the teacher's `config/types.rs` does,
//! so an operator can load it from the same TOML/JSON bootstrap layer that
//! is otherwise out of scope for this core.

use serde::{Deserialize, Serialize};

/// What the engine does with `check_residuals()` findings at shutdown.
/// §9's open question resolves this as log-only, matching the source; a
/// durable variant may choose to escalate instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResidualPolicy {
    LogOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bound on the `mpsc` channel strategies submit commands through.
    pub command_queue_capacity: usize,
    /// Bound on the `mpsc` channel the execution client returns events
    /// through.
    pub event_queue_capacity: usize,
    pub residual_policy: ResidualPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command_queue_capacity: 1_024,
            event_queue_capacity: 4_096,
            residual_policy: ResidualPolicy::LogOnly,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_command_queue_capacity(mut self, capacity: usize) -> Self {
        self.command_queue_capacity = capacity;
        self
    }

    pub fn with_event_queue_capacity(mut self, capacity: usize) -> Self {
        self.event_queue_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let config = EngineConfig::new().with_command_queue_capacity(64).with_event_queue_capacity(256);
        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized: EngineConfig = serde_json::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }
}
