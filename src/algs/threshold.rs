//! Persistence filters over pair sequences.
//!
//! Every filter is pure and keeps the surviving pairs in input order.

use crate::algs::reduction::PersistencePair;

/// Pairs whose persistence (`death - birth`, clamped to 0) is at least
/// `threshold`.
///
/// `threshold == 0` keeps every pair.
pub fn threshold_cut(pairs: &[PersistencePair], threshold: u32) -> Vec<PersistencePair> {
    pairs
        .iter()
        .copied()
        .filter(|p| p.persistence() >= threshold)
        .collect()
}

/// Pairs whose distance from the diagonal of the persistence diagram,
/// `persistence / √2`, is at least `min_distance`.
pub fn diagonal_distance_cut(pairs: &[PersistencePair], min_distance: f32) -> Vec<PersistencePair> {
    pairs
        .iter()
        .copied()
        .filter(|p| p.persistence() as f32 / std::f32::consts::SQRT_2 >= min_distance)
        .collect()
}

/// Pairs with `death > birth + min_persistence`.
///
/// Unlike [`threshold_cut`] the bound is strict, so `min_persistence == 0`
/// drops exactly the zero-persistence pairs.
pub fn filter_non_degenerate(pairs: &[PersistencePair], min_persistence: u32) -> Vec<PersistencePair> {
    pairs
        .iter()
        .copied()
        .filter(|p| u64::from(p.death) > u64::from(p.birth) + u64::from(min_persistence))
        .collect()
}
