//! Random number generation.

use std::num::NonZeroU32;

pub use rand_core::{CryptoRng, RngCore};
use ring::rand::SecureRandom;

const RAND_ERROR_CODE: NonZeroU32 =
    NonZeroU32::new(rand_core::Error::CUSTOM_START).unwrap();

/// A succinct trait alias for a cryptographically secure PRNG.
pub trait Crng: RngCore + CryptoRng {}

impl<R: RngCore + CryptoRng> Crng for R {}

/// A compatibility wrapper so we can use `ring`'s PRG with `rand` traits.
#[derive(Clone, Debug)]
pub struct SysRng(ring::rand::SystemRandom);

impl SysRng {
    pub fn new() -> Self {
        Self(ring::rand::SystemRandom::new())
    }
}

impl Default for SysRng {
    fn default() -> Self {
        Self::new()
    }
}

/// [`ring::rand::SystemRandom`] is a cryptographically secure PRG.
impl CryptoRng for SysRng {}

impl RngCore for SysRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        rand_core::impls::next_u32_via_fill(self)
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_fill(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.try_fill_bytes(dest).expect("ring SystemRandom failed")
    }

    fn try_fill_bytes(
        &mut self,
        dest: &mut [u8],
    ) -> Result<(), rand_core::Error> {
        self.0
            .fill(dest)
            .map_err(|_| rand_core::Error::from(RAND_ERROR_CODE))
    }
}

/// Extension methods for quickly sampling primitives off a [`Crng`].
pub trait RngExt: Crng {
    fn gen_u32(&mut self) -> u32 {
        self.next_u32()
    }

    fn gen_u64(&mut self) -> u64 {
        self.next_u64()
    }

    /// Samples a uniform `u64` in `[low, high)`. Used for the mixing delay
    /// jitter and hop-count/obfuscation-factor sampling.
    fn gen_range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "gen_range_u64: empty range");
        let span = high - low;
        low + (self.gen_u64() % span)
    }
}

impl<R: Crng> RngExt for R {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sysrng_fills_distinct_bytes() {
        let mut rng = SysRng::new();
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        rng.fill_bytes(&mut a);
        rng.fill_bytes(&mut b);
        assert_ne!(a, b);
    }

    #[test]
    fn gen_range_u64_stays_in_bounds() {
        let mut rng = SysRng::new();
        for _ in 0..1000 {
            let x = rng.gen_range_u64(10, 20);
            assert!((10..20).contains(&x));
        }
    }
}
