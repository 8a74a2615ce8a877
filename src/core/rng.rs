//! Named, seedable randomness.
//!
//! Every decision point draws from its own labelled stream. Streams are
//! ChaCha8 generators sharing the iteration seed and selecting the stream by
//! a stable hash of the label, so adding a new roll somewhere never shifts the
//! sequence seen by another decision point.

use ahash::AHashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const SPLITMIX64_GOLDEN: u64 = 0x9e3779b97f4a7c15;
const SPLITMIX64_M1: u64 = 0xbf58476d1ce4e5b9;
const SPLITMIX64_M2: u64 = 0x94d049bb133111eb;

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Seed for iteration `index` of a batch started with `base`.
///
/// SplitMix64 finalizer over `base + (index + 1) * golden`, so neighbouring
/// iterations get uncorrelated seeds.
pub fn derive_seed(base: u64, index: u64) -> u64 {
    let mut z = base.wrapping_add(SPLITMIX64_GOLDEN.wrapping_mul(index.wrapping_add(1)));
    z = (z ^ (z >> 30)).wrapping_mul(SPLITMIX64_M1);
    z = (z ^ (z >> 27)).wrapping_mul(SPLITMIX64_M2);
    z ^ (z >> 31)
}

/// FNV-1a; stable across processes, unlike the hasher behind `AHashMap`.
fn stream_id(label: &str) -> u64 {
    label
        .bytes()
        .fold(FNV_OFFSET, |hash, byte| (hash ^ byte as u64).wrapping_mul(FNV_PRIME))
}

#[derive(Debug, Clone)]
pub struct RandomSource {
    seed: u64,
    streams: AHashMap<String, ChaCha8Rng>,
    draws: u64,
}

impl RandomSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            streams: AHashMap::new(),
            draws: 0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Total draws across all streams.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Uniform float in `[0, 1)` from the stream named `label`.
    pub fn random_float(&mut self, label: &str) -> f64 {
        let value: f64 = match self.streams.get_mut(label) {
            Some(stream) => stream.gen(),
            None => {
                let mut stream = ChaCha8Rng::seed_from_u64(self.seed);
                stream.set_stream(stream_id(label));
                let value = stream.gen();
                self.streams.insert(label.to_string(), stream);
                value
            }
        };
        self.draws += 1;
        tracing::trace!(label, value, "rng draw");
        value
    }

    /// Uniform float in `[min, max)`; returns `min` without drawing when the
    /// range is empty.
    pub fn uniform(&mut self, label: &str, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        min + self.random_float(label) * (max - min)
    }
}
