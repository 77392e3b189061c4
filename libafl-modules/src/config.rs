use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::MutatorError;

/// Tunables of the mutation engine and its libafl adapters.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MutatorConfig {
    /// Satisfaction-critical fields are skipped when the per-call bias (0..100) exceeds this
    pub satisfaction_threshold: u32,
    /// Attempts the scalar length loop makes before keeping the original bytes
    pub scalar_retry_limit: usize,
    /// Allow delete/duplicate/shuffle/retag on the packet's own children
    pub packet_structural: bool,
    pub max_packet_size: usize,
    /// Percent chance that the Interest/Data adapter appends an answering Data
    pub data_response_percent: u32,
    /// Capacity of the recent-Interest ring
    pub recent_capacity: usize,
}

impl Default for MutatorConfig {
    fn default() -> Self {
        Self {
            satisfaction_threshold: 10,
            scalar_retry_limit: 64,
            packet_structural: false,
            max_packet_size: 8800,
            data_response_percent: 10,
            recent_capacity: 1000,
        }
    }
}

impl MutatorConfig {
    pub fn from_json(json: &str) -> Result<Self, MutatorError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, MutatorError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| MutatorError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), MutatorError> {
        if self.satisfaction_threshold > 100 {
            return Err(MutatorError::Config(format!(
                "satisfaction_threshold {} is above 100",
                self.satisfaction_threshold
            )));
        }
        if self.data_response_percent > 100 {
            return Err(MutatorError::Config(format!(
                "data_response_percent {} is above 100",
                self.data_response_percent
            )));
        }
        if self.scalar_retry_limit == 0 {
            return Err(MutatorError::Config("scalar_retry_limit must be at least 1".into()));
        }
        if self.recent_capacity == 0 {
            return Err(MutatorError::Config("recent_capacity must be at least 1".into()));
        }
        if self.max_packet_size == 0 {
            return Err(MutatorError::Config("max_packet_size must be positive".into()));
        }
        Ok(())
    }
}
