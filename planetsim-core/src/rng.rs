use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The single random stream a world draws from. Every algorithm that consumes
/// randomness takes it from here so a seed reproduces a world exactly.
#[derive(Clone, Debug)]
pub struct WorldRng {
    inner: ChaCha8Rng,
}

impl WorldRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// A stream derived from `seed` that does not overlap the main one.
    pub fn derived(seed: u64, stream: u64) -> Self {
        Self::new(seed_offset(seed, stream))
    }

    /// Uniform integer in `lo..=hi`; returns `lo` when the range is empty.
    #[inline]
    pub fn uniform_int(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        self.inner.gen_range(lo..=hi)
    }

    #[inline]
    pub fn uniform_usize(&mut self, lo: usize, hi: usize) -> usize {
        if hi <= lo {
            return lo;
        }
        self.inner.gen_range(lo..=hi)
    }

    #[inline]
    pub fn uniform_f64(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        self.inner.gen_range(lo..=hi)
    }

    #[inline]
    pub fn chance(&mut self, p: f64) -> bool {
        self.inner.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Uniform index into a collection of `len` items.
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.inner.gen_range(0..len)
    }

    /// Samples an index with probability proportional to its weight. `None`
    /// when no weight is positive.
    pub fn weighted_index(&mut self, weights: &[f64]) -> Option<usize> {
        let dist = WeightedIndex::new(weights.iter().map(|w| w.max(0.0))).ok()?;
        Some(dist.sample(&mut self.inner))
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }
}

#[inline]
pub fn hash_u64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

#[inline]
pub fn seed_offset(seed: u64, offset: u64) -> u64 {
    hash_u64(seed ^ offset.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}
