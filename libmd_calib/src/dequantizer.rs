use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Dequantizer turns the truncated integer amplitude of a QDC back into a continuous value.
///
/// The QDC only reports the integer part of the collected charge, so a uniform jitter in
/// `[0, 1)` is added to spread each reading back over the interval it came from. This
/// removes the discretization spikes when the values are later histogrammed.
///
/// The random source is injected. A run creates it once and never reseeds it.
#[derive(Debug, Clone)]
pub struct Dequantizer<R: Rng = ChaCha8Rng> {
    rng: R,
}

impl Dequantizer<ChaCha8Rng> {
    /// Create the run dequantizer. With no seed the generator is seeded from OS entropy.
    pub fn seeded(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        Self { rng }
    }
}

impl<R: Rng> Dequantizer<R> {
    /// Wrap an existing random source
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Returns `qdc + u` with `u` uniform in `[0, 1)`
    pub fn dequantize(&mut self, qdc: u32) -> f64 {
        let value = qdc as f64 + self.rng.gen::<f64>();
        let upper = qdc as f64 + 1.0;
        if value < upper {
            value
        } else {
            // Draws just below 1 can round up onto the next integer
            f64::from_bits(upper.to_bits() - 1)
        }
    }
}
