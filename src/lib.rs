#![cfg_attr(docsrs, feature(doc_cfg))]
//! # voxel-persistence
//!
//! voxel-persistence extracts topological features from 3D scalar volumes. It
//! builds the cubical complex of a `u8` grid, filters it by sample value,
//! reduces the boundary matrix into persistence pairs and organizes the
//! surviving pairs into a merge tree.
//!
//! ## Features
//! - Cubical complex builder with lower- or upper-star filtration over a [`ScalarGrid`](topology::ScalarGrid)
//! - Sparse mod-2 [`BoundaryMatrix`](algs::BoundaryMatrix) and standard column reduction
//! - Persistence filters (`threshold_cut`, diagonal distance, non-degenerate)
//! - Arena-backed merge tree with tolerance chaining and union-find
//! - An end-to-end pipeline with cooperative cancellation
//! - Optional `rayon` feature for the filtration pass (`cargo test --features rayon`
//!   exercises it against a sequential reference)
//!
//! ## Determinism
//!
//! Cell ids, reduction order and merge-tree node ids depend only on the
//! input grid and configuration; parallel filtration yields identical values.
//!
//! ## Usage
//!
//! ```
//! use voxel_persistence::prelude::*;
//!
//! let grid = ScalarGrid::nested_cubes(8);
//! let config = FeatureConfig { tolerance: 2, ..FeatureConfig::default() };
//! let features = extract_features(&grid, &config)?;
//! assert_eq!(features.cell_pairs.len(), features.value_pairs.len());
//! # Ok::<(), voxel_persistence::topo_error::TopoError>(())
//! ```
//!
//! The library logs through the `log` facade and never installs a logger.

pub mod algs;
pub mod debug_invariants;
pub mod topo_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;
pub use topo_error::TopoError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::boundary_matrix::BoundaryMatrix;
    pub use crate::algs::cubical_builder::{FilteredComplex, build_complex, build_complex_with_mode};
    pub use crate::algs::merge_tree::{MergeTree, MergeTreeNode, build_merge_tree_with_tolerance};
    pub use crate::algs::pipeline::{
        FeatureConfig, FeatureSet, extract_features, extract_features_with_cancel,
    };
    pub use crate::algs::reduction::{PersistencePair, reduce, reduce_extended};
    pub use crate::algs::threshold::threshold_cut;
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::topo_error::TopoError;
    pub use crate::topology::{CellDim, CellId, CubicalComplex, Filtration, FiltrationMode, ScalarGrid};
}
