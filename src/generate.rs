use rand::Rng;
use rand_seeder::{Seeder, SipRng};
use serde::{Deserialize, Serialize};

use crate::process::ProcessControlBlock;
use crate::utils::logging::prelude::*;

/// Shape of a random workload, the `generate` config section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateConfig {
    pub count: u32,
    /// same seed, same workload
    pub seed: String,
    /// bursts are drawn from `1..=max_burst`
    pub max_burst: u32,
    pub max_priority: u32,
    pub max_arrival: u32,
}

/// Draw a random but reproducible set of descriptors
#[instrument(level = "debug", skip(cfg), fields(count = cfg.count, seed = %cfg.seed))]
pub fn generate(cfg: &GenerateConfig) -> Vec<ProcessControlBlock> {
    let mut rng: SipRng = Seeder::from(cfg.seed.as_str()).make_rng();
    let max_burst = cfg.max_burst.max(1);

    (0..cfg.count)
        .map(|pid| {
            let burst = rng.gen_range(1..=max_burst);
            let priority = rng.gen_range(0..=cfg.max_priority);
            let arrival = rng.gen_range(0..=cfg.max_arrival);
            ProcessControlBlock::new(pid, burst, priority, arrival)
        })
        .collect()
}
