use std::path::PathBuf;

use serde::Deserialize;

use crate::error::EngineError;

/// Engine configuration — parsed from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Per-partition memory budget for the open feedback epoch, in bytes.
    /// Zero spills every record eagerly.
    #[serde(default = "default_memory_budget")]
    pub memory_budget_bytes: usize,

    /// Directory for spilled feedback epochs. Spills stay in memory when
    /// unset (no recovery across process restarts).
    #[serde(default)]
    pub spill_dir: Option<PathBuf>,

    /// Capacity of the loop-back queue between write-back and merge.
    #[serde(default = "default_feedback_capacity")]
    pub feedback_capacity: usize,
}

fn default_memory_budget() -> usize {
    32 * 1024 * 1024
}

fn default_feedback_capacity() -> usize {
    1024
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            memory_budget_bytes: default_memory_budget(),
            spill_dir: None,
            feedback_capacity: default_feedback_capacity(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{path}: {e}")))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = EngineConfig::parse("").unwrap();
        assert_eq!(config.memory_budget_bytes, 32 * 1024 * 1024);
        assert_eq!(config.feedback_capacity, 1024);
        assert!(config.spill_dir.is_none());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = EngineConfig::parse(
            r#"
            memory_budget_bytes = 0
            spill_dir = "/var/lib/reflux/spill"
            feedback_capacity = 16
            "#,
        )
        .unwrap();
        assert_eq!(config.memory_budget_bytes, 0);
        assert_eq!(config.spill_dir, Some(PathBuf::from("/var/lib/reflux/spill")));
        assert_eq!(config.feedback_capacity, 16);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = EngineConfig::parse("memory_budget_bytes = []").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
