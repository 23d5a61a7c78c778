//! xorshift64* random number generator
//!
//! # Algorithm
//!
//! xorshift64* is a variant of xorshift that passes TestU01's BigCrush
//! statistical tests. It uses 64-bit state and produces 64-bit output.
//!
//! # Determinism
//!
//! Same seed → same sequence of random numbers. The acceptance test and the
//! target draw consume this stream, so a fixed seed reproduces an event sample
//! bit for bit.
//!
//! # Independent streams
//!
//! Drivers running in parallel threads must not share a stream. Use
//! [`RngManager::for_stream`] to derive one generator per driver instance from a
//! common run seed.

use serde::{Deserialize, Serialize};

/// Multiplier of the xorshift64* output scrambler
const SCRAMBLE: u64 = 0x2545_F491_4F6C_DD1D;

/// Golden-ratio increment used to decorrelate derived streams (splitmix64)
const STREAM_INCREMENT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use mc_job_driver_core_rs::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let u = rng.next_f64();
/// assert!((0.0..1.0).contains(&u));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngManager {
    /// Internal state (64-bit, never zero)
    state: u64,
}

impl RngManager {
    /// Create a new RNG with given seed
    ///
    /// A zero seed is replaced by 1 (xorshift has an all-zero fixed point).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Derive an independent generator for one of several parallel drivers
    ///
    /// The run seed and stream id are mixed through splitmix64 so that
    /// neighbouring stream ids start far apart in the xorshift sequence.
    ///
    /// # Example
    /// ```
    /// use mc_job_driver_core_rs::RngManager;
    ///
    /// let mut a = RngManager::for_stream(42, 0);
    /// let mut b = RngManager::for_stream(42, 1);
    /// assert_ne!(a.next(), b.next());
    /// ```
    pub fn for_stream(seed: u64, stream_id: u64) -> Self {
        let mut z = seed.wrapping_add(STREAM_INCREMENT.wrapping_mul(stream_id.wrapping_add(1)));
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        Self::new(z)
    }

    /// Generate next random u64 value
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(SCRAMBLE)
    }

    /// Get current RNG state (for replaying a stream from a known point)
    ///
    /// # Example
    /// ```
    /// use mc_job_driver_core_rs::RngManager;
    ///
    /// let mut rng = RngManager::new(7);
    /// rng.next();
    /// let mut replay = RngManager::new(rng.get_state());
    /// assert_eq!(rng.next(), replay.next());
    /// ```
    pub fn get_state(&self) -> u64 {
        self.state
    }

    /// Generate random f64 in range [0.0, 1.0)
    ///
    /// Uses the top 53 bits so every representable value is equally likely.
    pub fn next_f64(&mut self) -> f64 {
        let value = self.next();
        (value >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }
}
