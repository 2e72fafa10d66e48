use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::accumulator::CrateAccumulator;
use super::constants::NCRATE;
use super::dequantizer::Dequantizer;
use super::event::{crate_index, EventRecord};
use super::flash::FlashVector;
use super::rejection::RejectionCounts;
use super::saturation::SaturationFlags;

/// What happened to a record handed to [`FlashPipeline::process`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Appended to its crate's accumulator; carries the number of entries dropped for bad tube ids
    Accumulated { dropped_entries: u64 },
    /// Turned away by the validity filter and counted
    Rejected,
    /// Crate id outside the detector; the record was not used
    InvalidCrate,
}

/// FlashPipeline takes event records one at a time and builds the calibration flashes.
///
/// Each record is filtered; accepted records are saturation checked, dequantized and
/// appended to their crate's accumulator, rejected records are counted. All state lives in
/// the pipeline, so a fresh pipeline is a fresh run. Stopping between two calls to
/// `process` always leaves a consistent result for the records seen so far.
#[derive(Debug)]
pub struct FlashPipeline<R: Rng = ChaCha8Rng> {
    accumulators: Vec<CrateAccumulator>,
    flags: SaturationFlags,
    rejections: RejectionCounts,
    invalid_crate_events: u64,
    dequantizer: Dequantizer<R>,
}

impl FlashPipeline<ChaCha8Rng> {
    /// Create a pipeline with the run random source. See [`Dequantizer::seeded`].
    pub fn seeded(seed: Option<u64>) -> Self {
        Self::new(Dequantizer::seeded(seed))
    }
}

impl<R: Rng> FlashPipeline<R> {
    pub fn new(dequantizer: Dequantizer<R>) -> Self {
        Self::with_flags(dequantizer, SaturationFlags::new())
    }

    /// Create a pipeline starting from an existing flag matrix
    pub fn with_flags(dequantizer: Dequantizer<R>, flags: SaturationFlags) -> Self {
        Self {
            accumulators: vec![CrateAccumulator::new(); NCRATE],
            flags,
            rejections: RejectionCounts::new(),
            invalid_crate_events: 0,
            dequantizer,
        }
    }

    /// Ingest a single event record
    pub fn process(&mut self, event: &EventRecord) -> EventOutcome {
        let crate_idx = match crate_index(event.crate_id) {
            Some(c) => c,
            None => {
                spdlog::warn!(
                    "Event record has crate id {} outside of 0..{}; dropping it",
                    event.crate_id,
                    NCRATE
                );
                self.invalid_crate_events += 1;
                return EventOutcome::InvalidCrate;
            }
        };

        if !event.is_calibration_flash() {
            spdlog::debug!(
                "Bad flash in crate {}: {} active tubes, {:?} packet",
                crate_idx,
                event.ntubes,
                event.packet_type
            );
            self.rejections.increment(crate_idx);
            return EventOutcome::Rejected;
        }

        let dropped_entries = self.accumulators[crate_idx].accumulate(
            crate_idx,
            event,
            &mut self.flags,
            &mut self.dequantizer,
        );
        if dropped_entries > 0 {
            spdlog::warn!(
                "Dropped {} entries with invalid tube ids from a crate {} flash",
                dropped_entries,
                crate_idx
            );
        }
        EventOutcome::Accumulated { dropped_entries }
    }

    /// The flashes of a crate in processing order. Empty for crates outside the detector.
    pub fn accumulator_for(&self, crate_idx: usize) -> &[FlashVector] {
        self.accumulators
            .get(crate_idx)
            .map(|acc| acc.flashes())
            .unwrap_or(&[])
    }

    pub fn crate_accumulator(&self, crate_idx: usize) -> Option<&CrateAccumulator> {
        self.accumulators.get(crate_idx)
    }

    pub fn saturation_flags(&self) -> &SaturationFlags {
        &self.flags
    }

    pub fn rejection_count(&self, crate_idx: usize) -> u64 {
        self.rejections.get(crate_idx)
    }

    pub fn rejection_counts(&self) -> &RejectionCounts {
        &self.rejections
    }

    pub fn invalid_crate_events(&self) -> u64 {
        self.invalid_crate_events
    }

    /// Total flashes accumulated over all crates
    pub fn total_flashes(&self) -> usize {
        self.accumulators.iter().map(|acc| acc.len()).sum()
    }

    /// Fold in the results of another pipeline.
    ///
    /// The other pipeline's flashes are appended after this one's for each crate, so crate
    /// ordering is only kept if the two pipelines saw disjoint crates (or the other saw later
    /// events). This is how per-crate workers are joined at the end of a run.
    pub fn merge<R2: Rng>(&mut self, other: FlashPipeline<R2>) {
        self.flags.merge(&other.flags);
        self.rejections.merge(&other.rejections);
        self.invalid_crate_events += other.invalid_crate_events;
        for (mine, theirs) in self.accumulators.iter_mut().zip(other.accumulators) {
            mine.append(theirs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{FLASH_SENTINEL, NTUBE, TUBE_FAULTY, TUBE_HEALTHY};
    use crate::event::PacketType;
    use rand::rngs::mock::StepRng;

    fn calibration_flash(crate_id: i32, ntubes: usize, qdc: u32) -> EventRecord {
        EventRecord::new(crate_id, (0..ntubes as i32).collect(), vec![qdc; ntubes])
    }

    #[test]
    fn test_accepted_flash_with_saturated_tube() {
        let mut pipeline = FlashPipeline::seeded(Some(11));
        let mut qdc = vec![100; 241];
        qdc[5] = 4000;
        let event = EventRecord::new(3, (0..241).collect(), qdc.clone());

        let outcome = pipeline.process(&event);
        assert_eq!(outcome, EventOutcome::Accumulated { dropped_entries: 0 });
        assert!(pipeline.saturation_flags().is_faulty(3, 5));
        assert_eq!(pipeline.saturation_flags().faulty_tubes(3), vec![5]);

        let flashes = pipeline.accumulator_for(3);
        assert_eq!(flashes.len(), 1);
        let flash = &flashes[0];
        assert_eq!(flash.len(), NTUBE);
        assert_eq!(flash.n_hits(), 241);
        for (tube, value) in flash.values().iter().enumerate() {
            if tube < 241 {
                let raw = qdc[tube] as f64;
                assert!(*value >= raw && *value < raw + 1.0);
            } else {
                assert_eq!(*value, FLASH_SENTINEL);
            }
        }
        assert_eq!(pipeline.rejection_count(3), 0);
    }

    #[test]
    fn test_rejected_flash_counted_only() {
        let mut pipeline = FlashPipeline::seeded(Some(11));
        let event = calibration_flash(7, 100, 4000);

        assert_eq!(pipeline.process(&event), EventOutcome::Rejected);
        assert_eq!(pipeline.rejection_count(7), 1);
        assert!(pipeline.accumulator_for(7).is_empty());
        assert!(pipeline.saturation_flags().faulty_tubes(7).is_empty());
        assert!(pipeline
            .saturation_flags()
            .matrix()
            .row(7)
            .iter()
            .all(|f| *f == TUBE_HEALTHY));
    }

    #[test]
    fn test_boundary_and_packet_type() {
        let mut pipeline = FlashPipeline::seeded(Some(2));
        pipeline.process(&calibration_flash(0, 240, 10));
        pipeline.process(&calibration_flash(0, 241, 10));
        pipeline.process(&calibration_flash(0, 256, 10).with_packet_type(PacketType::Threshold));
        assert_eq!(pipeline.rejection_count(0), 2);
        assert_eq!(pipeline.accumulator_for(0).len(), 1);
    }

    #[test]
    fn test_crate_order_matches_input() {
        let mut pipeline = FlashPipeline::seeded(Some(5));
        let crates = [2, 4, 2, 2, 4, 9, 2];
        for (n, crate_id) in crates.iter().enumerate() {
            pipeline.process(&calibration_flash(*crate_id, 250, n as u32 * 10));
        }
        for crate_id in [2usize, 4, 9] {
            let expected: Vec<u32> = crates
                .iter()
                .enumerate()
                .filter(|(_, c)| **c as usize == crate_id)
                .map(|(n, _)| n as u32 * 10)
                .collect();
            let flashes = pipeline.accumulator_for(crate_id);
            assert_eq!(flashes.len(), expected.len());
            for (flash, qdc) in flashes.iter().zip(expected) {
                assert_eq!(flash.get(0).map(|v| v.floor() as u32), Some(qdc));
            }
        }
        assert_eq!(pipeline.total_flashes(), crates.len());
    }

    #[test]
    fn test_flags_are_monotonic_across_events() {
        let mut pipeline = FlashPipeline::seeded(Some(5));
        pipeline.process(&calibration_flash(1, 250, 3950));
        for _ in 0..5 {
            pipeline.process(&calibration_flash(1, 250, 10));
            pipeline.process(&calibration_flash(1, 20, 10));
        }
        assert_eq!(pipeline.saturation_flags().faulty_tubes(1).len(), 250);
        assert_eq!(pipeline.saturation_flags().matrix()[[1, 249]], TUBE_FAULTY);
    }

    #[test]
    fn test_repeated_tube_last_write_wins() {
        let mut pipeline = FlashPipeline::new(Dequantizer::new(StepRng::new(0, 0)));
        let mut tubes: Vec<i32> = (0..245).collect();
        let mut qdc = vec![1; 245];
        tubes[0] = 5;
        qdc[0] = 4000;
        tubes[1] = 5;
        qdc[1] = 20;
        tubes[5] = 5;
        qdc[5] = 30;
        pipeline.process(&EventRecord::new(6, tubes, qdc));

        let flash = &pipeline.accumulator_for(6)[0];
        assert_eq!(flash.get(5), Some(30.0));
        assert!(pipeline.saturation_flags().is_faulty(6, 5));
    }

    #[test]
    fn test_invalid_ids() {
        let mut pipeline = FlashPipeline::seeded(Some(5));
        assert_eq!(
            pipeline.process(&calibration_flash(15, 250, 10)),
            EventOutcome::InvalidCrate
        );
        assert_eq!(
            pipeline.process(&calibration_flash(-2, 10, 10)),
            EventOutcome::InvalidCrate
        );
        assert_eq!(pipeline.invalid_crate_events(), 2);
        assert_eq!(pipeline.rejection_counts().total(), 0);
        assert!(pipeline.accumulator_for(15).is_empty());

        let mut tubes: Vec<i32> = (0..250).collect();
        tubes[3] = 300;
        let outcome = pipeline.process(&EventRecord::new(0, tubes, vec![4000; 250]));
        assert_eq!(outcome, EventOutcome::Accumulated { dropped_entries: 1 });
        assert_eq!(pipeline.accumulator_for(0)[0].n_hits(), 249);
        assert!(!pipeline.saturation_flags().is_faulty(0, 3));
    }

    #[test]
    fn test_merge_disjoint_crates() {
        let mut a = FlashPipeline::seeded(Some(1));
        let mut b = FlashPipeline::seeded(Some(2));
        a.process(&calibration_flash(0, 250, 4000));
        a.process(&calibration_flash(0, 10, 1));
        b.process(&calibration_flash(1, 250, 10));
        b.process(&calibration_flash(1, 250, 20));
        b.process(&calibration_flash(99, 250, 20));

        a.merge(b);
        assert_eq!(a.accumulator_for(0).len(), 1);
        assert_eq!(a.accumulator_for(1).len(), 2);
        assert_eq!(a.rejection_count(0), 1);
        assert_eq!(a.invalid_crate_events(), 1);
        assert_eq!(a.saturation_flags().faulty_tubes(0).len(), 250);
        assert!(a.saturation_flags().faulty_tubes(1).is_empty());
    }
}
