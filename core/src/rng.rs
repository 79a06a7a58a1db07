//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through SimRng instances derived
//! from the single master seed stored on the run record.
//!
//! Each synthetic user gets its own RNG stream, seeded deterministically
//! from (master_seed XOR user_id * golden-ratio). This means:
//!   - A user's draws never depend on how many users ran before it.
//!   - Sequential and parallel runs produce identical rows.

use crate::types::UserId;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

const STREAM_MIX: u64 = 0x9e37_79b9_7f4a_7c15;

/// A named, deterministic RNG stream.
pub struct SimRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SimRng {
    pub fn new(master_seed: u64, stream: u64) -> Self {
        let derived_seed = master_seed ^ stream.wrapping_mul(STREAM_MIX);
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

// Lets rand_distr samplers draw from the same stream.
impl RngCore for SimRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

/// All RNG streams for a single run.
#[derive(Debug, Clone, Copy)]
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// The stream owned by one synthetic user for its whole year.
    pub fn for_user(&self, user_id: UserId) -> SimRng {
        SimRng::new(self.master_seed, user_id).with_name("user")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_user_same_stream() {
        let bank = RngBank::new(12345);
        let a: Vec<f64> = {
            let mut rng = bank.for_user(7);
            (0..16).map(|_| rng.next_f64()).collect()
        };
        let b: Vec<f64> = {
            let mut rng = bank.for_user(7);
            (0..16).map(|_| rng.next_f64()).collect()
        };
        assert_eq!(a, b, "Same seed and user should replay the same draws");
    }

    #[test]
    fn distinct_users_get_distinct_streams() {
        let bank = RngBank::new(12345);
        let mut a = bank.for_user(1);
        let mut b = bank.for_user(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn uniform_draws_stay_in_unit_interval() {
        let mut rng = RngBank::new(9).for_user(1);
        for _ in 0..10_000 {
            let u = rng.next_f64();
            assert!((0.0..1.0).contains(&u), "draw {u} out of [0,1)");
        }
    }
}
