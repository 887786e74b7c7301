/*
This code is part of the MOLASSES lava flow simulation library.
Authors: Dr. John Lindsay
Created: 18/05/2023
Last Modified: 14/11/2023
License: MIT
*/
use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::Normal;
use std::time::{SystemTime, UNIX_EPOCH};

/// The process-wide pseudo-random generator. One instance is created at
/// program start, seeded from the wall clock unless the configuration fixes
/// a seed, and threaded through every component that draws random numbers.
pub struct SimRng {
    rng: SmallRng,
    seed: u64,
}

impl SimRng {
    pub fn from_clock() -> SimRng {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        SimRng::with_seed(seed)
    }

    pub fn with_seed(seed: u64) -> SimRng {
        SimRng {
            rng: SmallRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// A uniform draw from the closed interval `[low, high]`.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if low >= high {
            return low;
        }
        self.rng.gen_range(low..=high)
    }

    pub fn uniform_int(&mut self, low: i64, high: i64) -> i64 {
        if low >= high {
            return low;
        }
        self.rng.gen_range(low..=high)
    }

    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        let dist = Normal::new(mean, std_dev)
            .expect("The standard deviation of a normal draw must be finite and positive.");
        dist.sample(&mut self.rng)
    }

    /// In-place Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, values: &mut [T]) {
        for i in (1..values.len()).rev() {
            let j = self.uniform_int(0, i as i64) as usize;
            values.swap(i, j);
        }
    }
}
