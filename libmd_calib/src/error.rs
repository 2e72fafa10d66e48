use std::path::PathBuf;
use thiserror::Error;

use super::worker_status::WorkerStatus;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Config requested {0} threads; at least 1 is required")]
    BadThreadCount(i32),
}

#[derive(Debug, Error)]
pub enum EventSourceError {
    #[error("EventSource could not find the event file {0:?}")]
    BadFilePath(PathBuf),
    #[error("EventSource failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("EventSource failed to parse YAML event records: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("RunReport failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("RunReport failed to convert to yaml: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to EventSource error: {0}")]
    SourceError(#[from] EventSourceError),
    #[error("Processor failed due to RunReport error: {0}")]
    ReportError(#[from] ReportError),
    #[error("Processor failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
    #[error("Processor lost contact with crate worker {0}")]
    WorkerDisconnected(usize),
    #[error("Processor failed to join crate worker {0}")]
    WorkerPanicked(usize),
}
