//! Injectable random sources.
//!
//! Every generator and sampler in the crate takes `&mut impl RandomSource`
//! instead of reaching for a global RNG, so a seeded source makes a whole line
//! clear reproducible.  Any [`rand::RngCore`] works directly (`StdRng`,
//! `ThreadRng`, ...); [`FixedRandom`] and [`SequenceRandom`] pin exact draws
//! in tests.

use rand::{Rng, RngCore};

/// A source of uniform samples in `[0, 1)`.
pub trait RandomSource {
    /// Next uniform sample in `[0, 1)`.
    fn next_unit(&mut self) -> f32;

    /// Uniform sample in `[min, max]` (linear interpolation of one draw).
    fn range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_unit()
    }

    /// Uniform integer in `[min, max]` inclusive.
    fn range_u32(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f32;
        let offset = (self.next_unit() * span).floor() as u32;
        min + offset.min(max - min)
    }

    /// `true` with probability `p`.
    fn chance(&mut self, p: f32) -> bool {
        self.next_unit() < p
    }
}

impl<R: RngCore + ?Sized> RandomSource for R {
    fn next_unit(&mut self) -> f32 {
        self.gen::<f32>()
    }
}

/// Always returns the same value.  Values are clamped into `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRandom(pub f32);

impl RandomSource for FixedRandom {
    fn next_unit(&mut self) -> f32 {
        self.0.clamp(0.0, 1.0)
    }
}

/// Cycles through a fixed list of values.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceRandom {
    values: Vec<f32>,
    index: usize,
}

impl SequenceRandom {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values, index: 0 }
    }
}

impl RandomSource for SequenceRandom {
    fn next_unit(&mut self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.index % self.values.len()];
        self.index = self.index.wrapping_add(1);
        value.clamp(0.0, 1.0)
    }
}
