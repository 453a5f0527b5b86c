//! MT19937-64 pseudo-random number generator
//!
//! The 64-bit Mersenne Twister of Matsumoto and Nishimura. A generator is
//! keyed by a 256-bit [`Seed`] and a 32-bit stream index; the pair is fed to
//! the reference `init_by_array64` initialisation, so identical seed and
//! stream always reproduce the identical sequence.
//!
//! # Example
//!
//! ```
//! use mre_random::{MersenneTwister64, Seed};
//!
//! let seed = Seed::new([1, 2, 3, 4]);
//! let mut a = MersenneTwister64::new(seed, 7);
//! let mut b = MersenneTwister64::new(seed, 7);
//! assert_eq!(a.random_integer64(), b.random_integer64());
//! ```

use std::fmt;

use rand_core::{impls, Error, RngCore, SeedableRng};

const NN: usize = 312;
const MM: usize = 156;
const MATRIX_A: u64 = 0xB502_6F5A_A966_19E9;
const UPPER_MASK: u64 = 0xFFFF_FFFF_8000_0000;
const LOWER_MASK: u64 = 0x7FFF_FFFF;

/// 2^-53 scaled so that the largest 53-bit value maps to exactly 1.0.
const INCLUSIVE_SCALE: f64 = 1.0 / 9_007_199_254_740_991.0;
/// 2^-52.
const EXCLUSIVE_SCALE: f64 = 1.0 / 4_503_599_627_370_496.0;

/// A 256-bit generator seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Seed {
    words: [u64; 4],
}

impl Seed {
    /// The seed used when nothing else has been configured.
    pub const DEFAULT: Self = Self {
        words: [
            0x0123_4567_89AB_CDEF,
            0xFEDC_BA98_7654_3210,
            0x0F1E_2D3C_4B5A_6978,
            0x8796_A5B4_C3D2_E1F0,
        ],
    };

    /// Build a seed from four 64-bit words.
    #[must_use]
    pub const fn new(words: [u64; 4]) -> Self {
        Self { words }
    }

    /// The four seed words.
    #[must_use]
    pub const fn words(&self) -> [u64; 4] {
        self.words
    }

    /// Build a seed from 32 little-endian bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        let mut words = [0u64; 4];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut le = [0u8; 8];
            le.copy_from_slice(chunk);
            *word = u64::from_le_bytes(le);
        }
        Self { words }
    }
}

impl From<[u64; 4]> for Seed {
    fn from(words: [u64; 4]) -> Self {
        Self::new(words)
    }
}

/// The MT19937-64 generator.
#[derive(Clone)]
pub struct MersenneTwister64 {
    state: [u64; NN],
    index: usize,
    seed: Seed,
    stream: u32,
    pub(crate) spare_normal: Option<f64>,
}

impl MersenneTwister64 {
    /// Create a generator for `seed` and `stream`.
    #[must_use]
    pub fn new(seed: Seed, stream: u32) -> Self {
        let mut rng = Self {
            state: [0; NN],
            index: NN,
            seed,
            stream,
            spare_normal: None,
        };
        rng.reseed(seed, stream);
        rng
    }

    /// Create a generator keyed by an arbitrary word array.
    ///
    /// This is the reference `init_by_array64` entry point; it is exposed so
    /// the generator can be checked against published test vectors.
    #[must_use]
    pub fn from_key(key: &[u64]) -> Self {
        let mut rng = Self {
            state: [0; NN],
            index: NN,
            seed: Seed::default(),
            stream: 0,
            spare_normal: None,
        };
        rng.init_by_array(key);
        rng
    }

    /// Re-initialise the generator in place.
    pub fn reseed(&mut self, seed: Seed, stream: u32) {
        let w = seed.words();
        self.init_by_array(&[w[0], w[1], w[2], w[3], u64::from(stream)]);
        self.seed = seed;
        self.stream = stream;
    }

    /// The seed this generator was created with.
    #[must_use]
    pub fn seed(&self) -> Seed {
        self.seed
    }

    /// The stream index this generator was created with.
    #[must_use]
    pub fn stream(&self) -> u32 {
        self.stream
    }

    fn init_scalar(&mut self, seed: u64) {
        self.state[0] = seed;
        for i in 1..NN {
            let prev = self.state[i - 1];
            self.state[i] = 6_364_136_223_846_793_005u64
                .wrapping_mul(prev ^ (prev >> 62))
                .wrapping_add(i as u64);
        }
        self.index = NN;
    }

    fn init_by_array(&mut self, key: &[u64]) {
        self.init_scalar(19_650_218);
        self.spare_normal = None;
        if key.is_empty() {
            return;
        }

        let mut i = 1usize;
        let mut j = 0usize;
        for _ in 0..NN.max(key.len()) {
            let prev = self.state[i - 1];
            self.state[i] = (self.state[i]
                ^ (prev ^ (prev >> 62)).wrapping_mul(3_935_559_000_370_003_845))
            .wrapping_add(key[j])
            .wrapping_add(j as u64);
            i += 1;
            j += 1;
            if i >= NN {
                self.state[0] = self.state[NN - 1];
                i = 1;
            }
            if j >= key.len() {
                j = 0;
            }
        }
        for _ in 0..NN - 1 {
            let prev = self.state[i - 1];
            self.state[i] = (self.state[i]
                ^ (prev ^ (prev >> 62)).wrapping_mul(2_862_933_555_777_941_757))
            .wrapping_sub(i as u64);
            i += 1;
            if i >= NN {
                self.state[0] = self.state[NN - 1];
                i = 1;
            }
        }
        self.state[0] = 1 << 63;
        self.index = NN;
    }

    fn twist(&mut self) {
        let mag = |x: u64| if x & 1 == 0 { 0 } else { MATRIX_A };
        for i in 0..NN - MM {
            let x = (self.state[i] & UPPER_MASK) | (self.state[i + 1] & LOWER_MASK);
            self.state[i] = self.state[i + MM] ^ (x >> 1) ^ mag(x);
        }
        for i in NN - MM..NN - 1 {
            let x = (self.state[i] & UPPER_MASK) | (self.state[i + 1] & LOWER_MASK);
            self.state[i] = self.state[i + MM - NN] ^ (x >> 1) ^ mag(x);
        }
        let x = (self.state[NN - 1] & UPPER_MASK) | (self.state[0] & LOWER_MASK);
        self.state[NN - 1] = self.state[MM - 1] ^ (x >> 1) ^ mag(x);
        self.index = 0;
    }

    /// Next 64 uniformly distributed bits.
    pub fn random_integer64(&mut self) -> u64 {
        if self.index >= NN {
            self.twist();
        }
        let mut x = self.state[self.index];
        self.index += 1;

        x ^= (x >> 29) & 0x5555_5555_5555_5555;
        x ^= (x << 17) & 0x71D6_7FFF_EDA6_0000;
        x ^= (x << 37) & 0xFFF7_EEE0_0000_0000;
        x ^= x >> 43;
        x
    }

    /// Next 32 uniformly distributed bits (the high half of a 64-bit draw).
    pub fn random_integer32(&mut self) -> u32 {
        (self.random_integer64() >> 32) as u32
    }

    /// Uniform deviate on the closed interval `[0, 1]`.
    pub fn uniform_inclusive(&mut self) -> f64 {
        (self.random_integer64() >> 11) as f64 * INCLUSIVE_SCALE
    }

    /// Uniform deviate on the open interval `(0, 1)`.
    pub fn uniform_exclusive(&mut self) -> f64 {
        ((self.random_integer64() >> 12) as f64 + 0.5) * EXCLUSIVE_SCALE
    }

    /// Uniform integer in `[0, bound)` without modulo bias.
    ///
    /// Returns 0 when `bound` is 0.
    pub fn bounded(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        let zone = u64::MAX - (u64::MAX - bound + 1) % bound;
        loop {
            let x = self.random_integer64();
            if x <= zone {
                return x % bound;
            }
        }
    }
}

impl fmt::Debug for MersenneTwister64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MersenneTwister64")
            .field("seed", &self.seed)
            .field("stream", &self.stream)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl RngCore for MersenneTwister64 {
    fn next_u32(&mut self) -> u32 {
        self.random_integer32()
    }

    fn next_u64(&mut self) -> u64 {
        self.random_integer64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for MersenneTwister64 {
    type Seed = [u8; 32];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(Seed::from_bytes(seed), 0)
    }
}
