use super::constants::NCRATE;

/// Per crate tally of events turned away by the validity filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectionCounts {
    counts: [u64; NCRATE],
}

impl RejectionCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one rejected event. Crate indices outside the detector are ignored.
    pub fn increment(&mut self, crate_idx: usize) {
        if let Some(count) = self.counts.get_mut(crate_idx) {
            *count += 1;
        }
    }

    pub fn get(&self, crate_idx: usize) -> u64 {
        self.counts.get(crate_idx).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn merge(&mut self, other: &RejectionCounts) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine += theirs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_and_merge() {
        let mut a = RejectionCounts::new();
        a.increment(7);
        a.increment(7);
        a.increment(NCRATE);
        let mut b = RejectionCounts::new();
        b.increment(0);
        a.merge(&b);
        assert_eq!(a.get(7), 2);
        assert_eq!(a.get(0), 1);
        assert_eq!(a.get(NCRATE), 0);
        assert_eq!(a.total(), 3);
    }
}
