/*!
    Deterministic RNG helpers for reproducible payloads

    Salts and IVs are always drawn from the OS; only test *inputs* come from here.
*/

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_TEST_SEED: u64 = 42;

pub fn test_rng_with_seed(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Reproducible pseudo-random bytes
pub fn deterministic_bytes_with_seed(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = test_rng_with_seed(seed);
    (0..len).map(|_| rng.random()).collect()
}

pub fn deterministic_bytes(len: usize) -> Vec<u8> {
    deterministic_bytes_with_seed(len, DEFAULT_TEST_SEED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_bytes_reproducible() {
        assert_eq!(deterministic_bytes(64), deterministic_bytes(64));
        assert_ne!(
            deterministic_bytes_with_seed(64, 1),
            deterministic_bytes_with_seed(64, 2)
        );
    }
}
