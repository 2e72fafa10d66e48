use ndarray::Array2;
use rand::Rng;

use super::constants::NTUBE;
use super::dequantizer::Dequantizer;
use super::event::{tube_index, EventRecord};
use super::flash::{FlashBuilder, FlashVector};
use super::saturation::SaturationFlags;

/// CrateAccumulator collects the flashes of one crate in the order their events were processed.
///
/// It only ever grows. Later calibration stages rely on the flashes being time ordered.
#[derive(Debug, Clone, Default)]
pub struct CrateAccumulator {
    flashes: Vec<FlashVector>,
    dropped_entries: u64,
}

impl CrateAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a FlashVector from an accepted event and append it.
    ///
    /// Every entry is first checked for saturation on its raw amplitude, then dequantized
    /// into the tube's slot (a repeated tube keeps the last value). Entries whose tube id is
    /// out of range are dropped and counted; the rest of the event is still used.
    ///
    /// Returns the number of entries dropped from this event.
    pub fn accumulate<R: Rng>(
        &mut self,
        crate_idx: usize,
        event: &EventRecord,
        flags: &mut SaturationFlags,
        dequantizer: &mut Dequantizer<R>,
    ) -> u64 {
        let mut builder = FlashBuilder::new();
        let mut dropped: u64 = 0;
        for (tube_id, qdc) in event.entries() {
            let tube_idx = match tube_index(tube_id) {
                Some(t) => t,
                None => {
                    dropped += 1;
                    continue;
                }
            };
            flags.record(crate_idx, tube_idx, qdc);
            builder.set(tube_idx, dequantizer.dequantize(qdc));
        }
        self.flashes.push(builder.finish());
        self.dropped_entries += dropped;
        dropped
    }

    pub fn flashes(&self) -> &[FlashVector] {
        &self.flashes
    }

    pub fn len(&self) -> usize {
        self.flashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flashes.is_empty()
    }

    /// Number of entries thrown out of accepted events for bad tube ids
    pub fn dropped_entries(&self) -> u64 {
        self.dropped_entries
    }

    /// Move the flashes of another accumulator onto the end of this one
    pub fn append(&mut self, mut other: CrateAccumulator) {
        self.flashes.append(&mut other.flashes);
        self.dropped_entries += other.dropped_entries;
    }

    /// Lay the flashes out as a (flash, tube) matrix, one row per flash
    pub fn to_matrix(&self) -> Array2<f64> {
        let mut matrix = Array2::<f64>::zeros([self.flashes.len(), NTUBE]);
        for (mut row, flash) in matrix.rows_mut().into_iter().zip(self.flashes.iter()) {
            row.assign(&flash.values());
        }
        matrix
    }
}
