//! End-to-end feature extraction: grid → complex → pairs → merge tree.
//!
//! Phases run in order `build`, `reduce`, `filter`, `merge_tree`. Before
//! each one the optional cancellation flag is polled; a raised flag aborts
//! with [`TopoError::Cancelled`] naming the phase that did not start.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::algs::cubical_builder::build_complex_with_mode;
use crate::algs::merge_tree::{MergeTree, build_merge_tree_with_tolerance};
use crate::algs::reduction::{PersistencePair, ReductionStats, reduce_with_stats};
use crate::algs::threshold::threshold_cut;
use crate::topo_error::TopoError;
use crate::topology::cubical::CellCounts;
use crate::topology::filtration::FiltrationMode;
use crate::topology::grid::ScalarGrid;

/// Knobs of [`extract_features`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Death values at most this far apart are chained in the merge tree.
    pub tolerance: u32,
    /// Minimum value persistence a pair needs to reach the merge tree.
    pub threshold: u32,
    /// Filtration direction; upper-star values are `255 - sample`.
    pub mode: FiltrationMode,
}

/// Sizes observed while extracting features.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeatureStats {
    pub cells: CellCounts,
    pub reduction: ReductionStats,
    pub selected: usize,
    pub tree_nodes: usize,
}

/// Everything [`extract_features`] produces.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureSet {
    /// Reduction output as cell ids, in emission order.
    pub cell_pairs: Vec<PersistencePair>,
    /// `cell_pairs` mapped to filtration values, same order.
    pub value_pairs: Vec<PersistencePair>,
    /// `value_pairs` that passed the threshold.
    pub selected: Vec<PersistencePair>,
    pub merge_tree: MergeTree,
    pub stats: FeatureStats,
}

/// Run every phase on `grid` without a cancellation flag.
pub fn extract_features(grid: &ScalarGrid, config: &FeatureConfig) -> Result<FeatureSet, TopoError> {
    run(grid, config, None)
}

/// Like [`extract_features`], polling `cancel` before every phase.
pub fn extract_features_with_cancel(
    grid: &ScalarGrid,
    config: &FeatureConfig,
    cancel: &AtomicBool,
) -> Result<FeatureSet, TopoError> {
    run(grid, config, Some(cancel))
}

fn checkpoint(cancel: Option<&AtomicBool>, phase: &'static str) -> Result<(), TopoError> {
    match cancel {
        Some(flag) if flag.load(Ordering::Acquire) => {
            log::debug!("feature extraction cancelled before `{phase}`");
            Err(TopoError::Cancelled(phase))
        }
        _ => Ok(()),
    }
}

fn run(
    grid: &ScalarGrid,
    config: &FeatureConfig,
    cancel: Option<&AtomicBool>,
) -> Result<FeatureSet, TopoError> {
    checkpoint(cancel, "build")?;
    let (complex, mut matrix, filtration) = build_complex_with_mode(grid, config.mode)?.into_parts();

    checkpoint(cancel, "reduce")?;
    let reduction = reduce_with_stats(&mut matrix)?;

    checkpoint(cancel, "filter")?;
    let value_pairs = filtration.value_pairs(&reduction.pairs)?;
    let selected = threshold_cut(&value_pairs, config.threshold);
    log::debug!(
        "threshold {} kept {} of {} pairs",
        config.threshold,
        selected.len(),
        value_pairs.len()
    );
    if selected.is_empty() && !value_pairs.is_empty() {
        log::warn!(
            "threshold {} discarded all {} persistence pairs",
            config.threshold,
            value_pairs.len()
        );
    }

    checkpoint(cancel, "merge_tree")?;
    let merge_tree = build_merge_tree_with_tolerance(&selected, config.tolerance)?;

    let stats = FeatureStats {
        cells: complex.counts(),
        reduction: reduction.stats,
        selected: selected.len(),
        tree_nodes: merge_tree.len(),
    };
    log::info!(
        "extracted features from {:?}: {} cells, {} pairs, {} selected, {} tree nodes",
        grid.resolution(),
        stats.cells.total(),
        stats.reduction.pairs,
        stats.selected,
        stats.tree_nodes
    );
    Ok(FeatureSet {
        cell_pairs: reduction.pairs,
        value_pairs,
        selected,
        merge_tree,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit_corner() -> ScalarGrid {
        let mut grid = ScalarGrid::filled([2, 2, 2], 0).unwrap();
        grid.set_sample(1, 1, 1, 255).unwrap();
        grid
    }

    #[test]
    fn unit_cube_runs_every_phase() {
        let out = extract_features(&lit_corner(), &FeatureConfig::default()).unwrap();
        assert_eq!(out.stats.cells.total(), 27);
        assert_eq!(out.cell_pairs.len(), out.value_pairs.len());
        assert_eq!(out.selected, out.value_pairs, "threshold 0 keeps everything");
        assert_eq!(out.merge_tree.len(), 2 * out.selected.len());
        assert!(out.cell_pairs.iter().all(|p| p.birth < p.death));
    }

    #[test]
    fn high_threshold_leaves_empty_tree() {
        let config = FeatureConfig {
            threshold: 1,
            ..FeatureConfig::default()
        };
        let out = extract_features(&lit_corner(), &config).unwrap();
        assert!(!out.value_pairs.is_empty());
        assert!(out.selected.is_empty());
        assert!(out.merge_tree.is_empty());
        assert_eq!(out.merge_tree.root_id(), None);
    }

    #[test]
    fn raised_flag_stops_before_build() {
        let cancel = AtomicBool::new(true);
        let err = extract_features_with_cancel(&lit_corner(), &FeatureConfig::default(), &cancel)
            .unwrap_err();
        assert_eq!(err, TopoError::Cancelled("build"));
    }

    #[test]
    fn config_fills_missing_fields_with_defaults() {
        let config: FeatureConfig = serde_json::from_str(r#"{ "threshold": 12 }"#).unwrap();
        assert_eq!(
            config,
            FeatureConfig {
                tolerance: 0,
                threshold: 12,
                mode: FiltrationMode::LowerStar,
            }
        );
        let upper: FeatureConfig = serde_json::from_str(r#"{ "mode": "UpperStar" }"#).unwrap();
        assert_eq!(upper.mode, FiltrationMode::UpperStar);
    }

    #[test]
    fn upper_star_mode_flows_into_values() {
        let config = FeatureConfig {
            mode: FiltrationMode::UpperStar,
            ..FeatureConfig::default()
        };
        let lower = extract_features(&lit_corner(), &FeatureConfig::default()).unwrap();
        let upper = extract_features(&lit_corner(), &config).unwrap();
        assert_eq!(upper.cell_pairs, lower.cell_pairs, "same matrix, same pairs");
        // vertex 7 (sample 255) enters first at 0, the dark vertices at 255
        assert!(upper.value_pairs.iter().all(|p| p.birth == 255 || p.birth == 0));
        assert_ne!(upper.value_pairs, lower.value_pairs);
    }
}
