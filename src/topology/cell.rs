//! Cell identifiers and dimension tags for cubical complexes.
//!
//! Cells are never materialized as objects: a cell is just its [`CellId`],
//! and everything else (dimension, boundary, filtration value) is looked up
//! in the structures that own that information.

use serde::{Deserialize, Serialize};

/// Identifier of a cell in a cubical complex.
///
/// Ids are dense in `0..N` and grouped by dimension: vertices first, then
/// edges, faces and voxels.
pub type CellId = u32;

/// Topological dimension of a cubical cell.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum CellDim {
    /// 0D grid sample.
    #[default]
    Vertex,
    /// 1D axis-aligned segment between two grid-adjacent samples.
    Edge,
    /// 2D axis-aligned square spanned by four samples.
    Face,
    /// 3D unit cube spanned by eight samples.
    Voxel,
}

impl CellDim {
    /// All dimensions in id order.
    pub const ALL: [CellDim; 4] = [CellDim::Vertex, CellDim::Edge, CellDim::Face, CellDim::Voxel];

    /// Returns the topological dimension as an integer.
    pub fn dimension(self) -> u8 {
        match self {
            CellDim::Vertex => 0,
            CellDim::Edge => 1,
            CellDim::Face => 2,
            CellDim::Voxel => 3,
        }
    }

    /// Number of grid vertices incident to a cell of this dimension.
    pub fn vertex_count(self) -> usize {
        1 << self.dimension()
    }

    /// Inverse of [`dimension`](Self::dimension).
    pub fn from_dimension(d: u8) -> Option<Self> {
        CellDim::ALL.get(usize::from(d)).copied()
    }
}
