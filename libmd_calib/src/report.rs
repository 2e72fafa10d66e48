use rand::Rng;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use super::constants::NCRATE;
use super::error::ReportError;
use super::flash_stats::{tube_stats, TubeStats};
use super::pipeline::FlashPipeline;

/// This is the version of the report format
const FORMAT_VERSION: &str = "1.0";

/// End of run summary for a single crate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrateReport {
    #[serde(rename = "crate")]
    pub crate_id: usize,
    pub flashes: usize,
    pub rejected: u64,
    pub dropped_entries: u64,
    pub saturated_tubes: Vec<usize>,
    pub tubes: Vec<TubeStats>,
}

/// RunReport is the diagnostic summary written at the end of a run.
///
/// It holds the counts and tube statistics of every crate, not the flashes themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub version: String,
    pub total_flashes: usize,
    pub total_rejected: u64,
    pub invalid_crate_events: u64,
    pub crates: Vec<CrateReport>,
}

impl RunReport {
    /// Summarize the current state of a pipeline
    pub fn from_pipeline<R: Rng>(pipeline: &FlashPipeline<R>) -> Self {
        let flags = pipeline.saturation_flags();
        let crates = (0..NCRATE)
            .filter_map(|crate_idx| {
                pipeline
                    .crate_accumulator(crate_idx)
                    .map(|acc| CrateReport {
                        crate_id: crate_idx,
                        flashes: acc.len(),
                        rejected: pipeline.rejection_count(crate_idx),
                        dropped_entries: acc.dropped_entries(),
                        saturated_tubes: flags.faulty_tubes(crate_idx),
                        tubes: tube_stats(crate_idx, acc, flags),
                    })
            })
            .collect();

        Self {
            version: format!("{}:{}", env!("CARGO_PKG_NAME"), FORMAT_VERSION),
            total_flashes: pipeline.total_flashes(),
            total_rejected: pipeline.rejection_counts().total(),
            invalid_crate_events: pipeline.invalid_crate_events(),
            crates,
        }
    }

    /// Write the report as YAML
    pub fn write(&self, path: &Path) -> Result<(), ReportError> {
        let mut report_file = std::fs::File::create(path)?;
        report_file.write_all(serde_yaml::to_string(self)?.as_bytes())?;
        Ok(())
    }

    /// Log a short summary of the run
    pub fn log_summary(&self) {
        spdlog::info!(
            "{} flashes accumulated, {} events rejected, {} events with invalid crate ids.",
            self.total_flashes,
            self.total_rejected,
            self.invalid_crate_events
        );
        for crate_report in self.crates.iter() {
            if crate_report.flashes == 0 && crate_report.rejected == 0 {
                continue;
            }
            spdlog::info!(
                "Crate {:02}: {} flashes, {} bad flashes, {} saturated tubes",
                crate_report.crate_id,
                crate_report.flashes,
                crate_report.rejected,
                crate_report.saturated_tubes.len()
            );
            if crate_report.dropped_entries > 0 {
                spdlog::warn!(
                    "Crate {:02} dropped {} entries with invalid tube ids",
                    crate_report.crate_id,
                    crate_report.dropped_entries
                );
            }
        }
    }
}
