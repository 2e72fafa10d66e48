use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use super::accumulator::CrateAccumulator;
use super::constants::FLASH_SENTINEL;
use super::flash::FlashVector;
use super::saturation::SaturationFlags;

/// Entries, mean and RMS of a set of amplitudes.
///
/// RMS here is the spread about the mean (as for a histogram), not the root of the mean square.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FlashStats {
    pub entries: usize,
    pub mean: f64,
    pub rms: f64,
}

impl FlashStats {
    /// Compute the statistics of the non-sentinel values. Empty input gives all zeros.
    pub fn from_values(values: ArrayView1<'_, f64>) -> Self {
        let mut entries: usize = 0;
        let mut sum = 0.0;
        for value in values.iter().filter(|v| **v != FLASH_SENTINEL) {
            entries += 1;
            sum += value;
        }
        if entries == 0 {
            return Self::default();
        }
        let mean = sum / entries as f64;
        let variance = values
            .iter()
            .filter(|v| **v != FLASH_SENTINEL)
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / entries as f64;
        Self {
            entries,
            mean,
            rms: variance.sqrt(),
        }
    }

    /// Statistics over the hit tubes of a single flash
    pub fn for_flash(flash: &FlashVector) -> Self {
        Self::from_values(flash.values())
    }
}

/// Statistics of one tube over every flash of its crate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TubeStats {
    pub tube: usize,
    pub saturated: bool,
    #[serde(flatten)]
    pub stats: FlashStats,
}

/// Per tube statistics for a crate. Tubes that were never hit are left out.
pub fn tube_stats(
    crate_idx: usize,
    accumulator: &CrateAccumulator,
    flags: &SaturationFlags,
) -> Vec<TubeStats> {
    let matrix = accumulator.to_matrix();
    matrix
        .columns()
        .into_iter()
        .enumerate()
        .map(|(tube, column)| TubeStats {
            tube,
            saturated: flags.is_faulty(crate_idx, tube),
            stats: FlashStats::from_values(column),
        })
        .filter(|ts| ts.stats.entries > 0)
        .collect()
}

/// Per flash statistics for a crate, in flash order
pub fn cluster_stats(accumulator: &CrateAccumulator) -> Vec<FlashStats> {
    accumulator
        .flashes()
        .iter()
        .map(FlashStats::for_flash)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dequantizer::Dequantizer;
    use crate::event::EventRecord;
    use ndarray::array;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_stats_skip_sentinel() {
        let values = array![2.0, FLASH_SENTINEL, 4.0, FLASH_SENTINEL];
        let stats = FlashStats::from_values(values.view());
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.rms, 1.0);
    }

    #[test]
    fn test_empty_stats() {
        let values = array![FLASH_SENTINEL, FLASH_SENTINEL];
        assert_eq!(
            FlashStats::from_values(values.view()),
            FlashStats::default()
        );
    }

    #[test]
    fn test_tube_and_cluster_stats() {
        let mut acc = CrateAccumulator::new();
        let mut flags = SaturationFlags::new();
        let mut deq = Dequantizer::new(StepRng::new(0, 0));
        acc.accumulate(
            4,
            &EventRecord::new(4, vec![0, 1], vec![10, 4000]),
            &mut flags,
            &mut deq,
        );
        acc.accumulate(4, &EventRecord::new(4, vec![0], vec![20]), &mut flags, &mut deq);

        let tubes = tube_stats(4, &acc, &flags);
        assert_eq!(tubes.len(), 2);
        assert_eq!(tubes[0].tube, 0);
        assert_eq!(tubes[0].stats.entries, 2);
        assert_eq!(tubes[0].stats.mean, 15.0);
        assert_eq!(tubes[0].stats.rms, 5.0);
        assert!(!tubes[0].saturated);
        assert_eq!(tubes[1].tube, 1);
        assert!(tubes[1].saturated);

        let clusters = cluster_stats(&acc);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].entries, 2);
        assert_eq!(clusters[0].mean, 2005.0);
        assert_eq!(clusters[1].entries, 1);
    }
}
