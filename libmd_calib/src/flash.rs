use ndarray::{Array1, ArrayView1};

use super::constants::{FLASH_SENTINEL, NTUBE};

/// FlashVector holds the dequantized amplitude of every tube in a crate for a single event.
///
/// It always has `NTUBE` slots. Tubes that were not hit keep `FLASH_SENTINEL`. A FlashVector
/// can only be made through a [`FlashBuilder`] and is read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct FlashVector {
    values: Array1<f64>,
}

impl FlashVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value of a tube, or None if the tube was not hit (or does not exist)
    pub fn get(&self, tube_idx: usize) -> Option<f64> {
        self.values
            .get(tube_idx)
            .copied()
            .filter(|v| *v != FLASH_SENTINEL)
    }

    /// All slots, sentinels included
    pub fn values(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    /// Iterate over (tube, value) of the hit tubes only
    pub fn hits(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, v)| *v != FLASH_SENTINEL)
    }

    pub fn n_hits(&self) -> usize {
        self.hits().count()
    }
}

/// Mutable staging area for a FlashVector while an event is being read
#[derive(Debug)]
pub struct FlashBuilder {
    values: Array1<f64>,
}

impl Default for FlashBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashBuilder {
    pub fn new() -> Self {
        Self {
            values: Array1::from_elem(NTUBE, FLASH_SENTINEL),
        }
    }

    /// Set the value for a tube. A later write to the same tube replaces the earlier one.
    pub fn set(&mut self, tube_idx: usize, value: f64) {
        if let Some(slot) = self.values.get_mut(tube_idx) {
            *slot = value;
        }
    }

    pub fn finish(self) -> FlashVector {
        FlashVector {
            values: self.values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_flash_is_all_sentinel() {
        let flash = FlashBuilder::new().finish();
        assert_eq!(flash.len(), NTUBE);
        assert!(flash.values().iter().all(|v| *v == FLASH_SENTINEL));
        assert_eq!(flash.n_hits(), 0);
    }

    #[test]
    fn test_last_write_wins() {
        let mut builder = FlashBuilder::new();
        builder.set(5, 10.5);
        builder.set(5, 20.25);
        builder.set(NTUBE, 1.0);
        let flash = builder.finish();
        assert_eq!(flash.get(5), Some(20.25));
        assert_eq!(flash.get(6), None);
        assert_eq!(flash.get(NTUBE), None);
        assert_eq!(flash.hits().collect::<Vec<_>>(), vec![(5, 20.25)]);
    }
}
