use ndarray::Array2;

use super::constants::{NCRATE, NTUBE, SATURATION_THRESHOLD, TUBE_FAULTY, TUBE_HEALTHY};

/// SaturationFlags is the crate x tube fault matrix for a run.
///
/// Every cell starts as `TUBE_HEALTHY` (0). The first reading above `SATURATION_THRESHOLD`
/// for a tube sets its cell to `TUBE_FAULTY` (-1), and nothing ever sets it back.
#[derive(Debug, Clone, PartialEq)]
pub struct SaturationFlags {
    flags: Array2<i8>,
}

impl Default for SaturationFlags {
    fn default() -> Self {
        Self::new()
    }
}

impl SaturationFlags {
    /// All tubes healthy
    pub fn new() -> Self {
        Self {
            flags: Array2::from_elem((NCRATE, NTUBE), TUBE_HEALTHY),
        }
    }

    /// Check a raw (not dequantized) reading and flag the tube if it saturated.
    ///
    /// Returns true if the reading was above threshold. Indices outside the matrix are ignored.
    pub fn record(&mut self, crate_idx: usize, tube_idx: usize, qdc: u32) -> bool {
        if qdc <= SATURATION_THRESHOLD {
            return false;
        }
        match self.flags.get_mut((crate_idx, tube_idx)) {
            Some(cell) => {
                *cell = TUBE_FAULTY;
                true
            }
            None => false,
        }
    }

    pub fn is_faulty(&self, crate_idx: usize, tube_idx: usize) -> bool {
        self.flags.get((crate_idx, tube_idx)) == Some(&TUBE_FAULTY)
    }

    /// The raw NCRATE x NTUBE matrix of 0 / -1 values
    pub fn matrix(&self) -> &Array2<i8> {
        &self.flags
    }

    /// Tubes of a crate that have been flagged, in tube order
    pub fn faulty_tubes(&self, crate_idx: usize) -> Vec<usize> {
        if crate_idx >= NCRATE {
            return Vec::new();
        }
        self.flags
            .row(crate_idx)
            .iter()
            .enumerate()
            .filter(|(_, flag)| **flag == TUBE_FAULTY)
            .map(|(tube, _)| tube)
            .collect()
    }

    /// Fold in the flags of another matrix. A tube faulty in either stays faulty.
    pub fn merge(&mut self, other: &SaturationFlags) {
        self.flags.zip_mut_with(&other.flags, |mine, theirs| {
            if *theirs == TUBE_FAULTY {
                *mine = TUBE_FAULTY;
            }
        });
    }
}
