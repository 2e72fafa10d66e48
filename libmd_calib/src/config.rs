use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::ConfigError;

/// Structure representing the application configuration. Contains pathing and run information
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub event_path: PathBuf,
    pub report_path: PathBuf,
    pub seed: Option<u64>,
    pub n_threads: i32,
}

impl Default for Config {
    /// Generate a new Config object. All paths will be empty/invalid
    fn default() -> Self {
        Self {
            event_path: PathBuf::from("None"),
            report_path: PathBuf::from("None"),
            seed: None,
            n_threads: 1,
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Write the configuration to a YAML file
    pub fn write_config_file(&self, config_path: &Path) -> Result<(), ConfigError> {
        std::fs::write(config_path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Check that the event file exists, the report can be written and the thread count is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.event_path.exists() {
            return Err(ConfigError::BadFilePath(self.event_path.clone()));
        }
        if let Some(parent) = self.report_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(ConfigError::BadFilePath(parent.to_path_buf()));
            }
        }
        if !self.is_n_threads_valid() {
            return Err(ConfigError::BadThreadCount(self.n_threads));
        }
        Ok(())
    }

    pub fn is_n_threads_valid(&self) -> bool {
        self.n_threads >= 1
    }

    /// Seed for a given worker. Workers get consecutive seeds so each has its own stream.
    pub fn worker_seed(&self, worker_id: usize) -> Option<u64> {
        self.seed.map(|s| s.wrapping_add(worker_id as u64))
    }
}
