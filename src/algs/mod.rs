//! Re-export public algorithms.

pub mod boundary_matrix;
pub mod cubical_builder;
pub mod merge_tree;
pub mod pipeline;
pub mod reduction;
pub mod threshold;

pub use boundary_matrix::BoundaryMatrix;
pub use cubical_builder::{FilteredComplex, build_complex, build_complex_with_mode};
pub use merge_tree::{MergeTree, MergeTreeNode, build_merge_tree_with_tolerance};
pub use pipeline::{
    FeatureConfig, FeatureSet, FeatureStats, extract_features, extract_features_with_cancel,
};
pub use reduction::{
    ExtendedReduction, PersistencePair, Reduction, ReductionStats, reduce, reduce_extended,
    reduce_with_stats,
};
pub use threshold::{diagonal_distance_cut, filter_non_degenerate, threshold_cut};
