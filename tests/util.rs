#![allow(dead_code)]
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

use voxel_persistence::{algs::reduction::PersistencePair, topology::grid::ScalarGrid};

pub fn pairs(raw: &[(u32, u32)]) -> Vec<PersistencePair> {
    raw.iter().copied().map(PersistencePair::from).collect()
}

/// 2×2×2 grid of zeros with the far corner (1,1,1) set to 255.
pub fn lit_corner_cube() -> ScalarGrid {
    let mut grid = ScalarGrid::filled([2, 2, 2], 0).unwrap();
    grid.set_sample(1, 1, 1, 255).unwrap();
    grid
}

/// Grid with samples drawn uniformly from `0..=max`, reproducible per seed.
pub fn random_grid(resolution: [u32; 3], max: u8, seed: u64) -> ScalarGrid {
    let mut rng = SmallRng::seed_from_u64(seed);
    let n: usize = resolution.iter().map(|&a| a as usize).product();
    let data = (0..n).map(|_| rng.gen_range(0..=max)).collect();
    ScalarGrid::try_new(resolution, data).unwrap()
}

/// Cell-id pairs fresh from reduction: `birth < death`, no id reused on
/// either side.
pub fn assert_well_formed(pairs: &[PersistencePair]) {
    let mut births = HashSet::new();
    let mut deaths = HashSet::new();
    for p in pairs {
        assert!(p.birth < p.death, "pair {:?} is not ordered", p);
        assert!(births.insert(p.birth), "birth {} repeated", p.birth);
        assert!(deaths.insert(p.death), "death {} repeated", p.death);
    }
}
