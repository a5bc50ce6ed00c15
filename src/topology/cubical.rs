//! Id layout of the cubical complex spanned by a regular 3D grid.
//!
//! Cells are grouped in eight blocks, one per orientation, in this id order:
//!
//! | block | dim | spans |
//! |-------|-----|-------|
//! | 0 | vertex | none |
//! | 1 | edge | x |
//! | 2 | edge | y |
//! | 3 | edge | z |
//! | 4 | face | x, y |
//! | 5 | face | x, z |
//! | 6 | face | y, z |
//! | 7 | voxel | x, y, z |
//!
//! Inside a block cells are enumerated z outermost, x innermost, by the
//! grid coordinate of their minimal corner. Along a spanned axis a block has
//! `n - 1` cells (0 when `n <= 1`), along the others `n`.

use std::ops::Range;

use crate::topo_error::TopoError;
use crate::topology::cell::{CellDim, CellId};

const ORIENTATIONS: [(CellDim, [bool; 3]); 8] = [
    (CellDim::Vertex, [false, false, false]),
    (CellDim::Edge, [true, false, false]),
    (CellDim::Edge, [false, true, false]),
    (CellDim::Edge, [false, false, true]),
    (CellDim::Face, [true, true, false]),
    (CellDim::Face, [true, false, true]),
    (CellDim::Face, [false, true, true]),
    (CellDim::Voxel, [true, true, true]),
];

fn extent(resolution: [u32; 3], axes: [bool; 3]) -> [u64; 3] {
    let mut out = [0u64; 3];
    for a in 0..3 {
        let n = u64::from(resolution[a]);
        out[a] = if axes[a] { n.saturating_sub(1) } else { n };
    }
    out
}

/// Number of cells of each dimension for a grid resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellCounts {
    pub vertices: u64,
    pub edges: u64,
    pub faces: u64,
    pub voxels: u64,
}

impl CellCounts {
    /// Closed-form counts: `X·Y·Z` vertices, `X⁻YZ + XY⁻Z + XYZ⁻` edges,
    /// `X⁻Y⁻Z + X⁻YZ⁻ + XY⁻Z⁻` faces and `X⁻Y⁻Z⁻` voxels, with `a⁻ = max(a-1, 0)`.
    pub fn from_resolution(resolution: [u32; 3]) -> Self {
        let mut counts = CellCounts::default();
        for (dim, axes) in ORIENTATIONS {
            let [ex, ey, ez] = extent(resolution, axes);
            let n = ex.saturating_mul(ey).saturating_mul(ez);
            let slot = match dim {
                CellDim::Vertex => &mut counts.vertices,
                CellDim::Edge => &mut counts.edges,
                CellDim::Face => &mut counts.faces,
                CellDim::Voxel => &mut counts.voxels,
            };
            *slot = slot.saturating_add(n);
        }
        counts
    }

    pub fn count(&self, dim: CellDim) -> u64 {
        match dim {
            CellDim::Vertex => self.vertices,
            CellDim::Edge => self.edges,
            CellDim::Face => self.faces,
            CellDim::Voxel => self.voxels,
        }
    }

    pub fn total(&self) -> u64 {
        self.vertices
            .saturating_add(self.edges)
            .saturating_add(self.faces)
            .saturating_add(self.voxels)
    }
}

/// A contiguous id range of equally oriented cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellBlock {
    pub dim: CellDim,
    /// Axes the cells extend along.
    pub axes: [bool; 3],
    /// Number of cells along each axis.
    pub extent: [u32; 3],
    /// First id of the block.
    pub start: CellId,
    pub len: u32,
}

impl CellBlock {
    #[inline]
    pub fn ids(&self) -> Range<CellId> {
        self.start..self.start + self.len
    }

    #[inline]
    fn contains(&self, id: CellId) -> bool {
        id >= self.start && id - self.start < self.len
    }
}

/// Cell layout of a cubical complex; holds no per-cell data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CubicalComplex {
    resolution: [u32; 3],
    counts: CellCounts,
    blocks: [CellBlock; 8],
    /// Vertex id strides along x, y and z.
    strides: [u32; 3],
}

impl CubicalComplex {
    /// Lay out the complex of a grid with the given resolution.
    ///
    /// Fails with [`TopoError::TooManyCells`] when the total does not fit
    /// `u32` ids.
    pub fn new(resolution: [u32; 3]) -> Result<Self, TopoError> {
        let counts = CellCounts::from_resolution(resolution);
        let total = counts.total();
        if total > u64::from(u32::MAX) {
            return Err(TopoError::TooManyCells(total));
        }

        let mut blocks = [CellBlock {
            dim: CellDim::Vertex,
            axes: [false; 3],
            extent: [0; 3],
            start: 0,
            len: 0,
        }; 8];
        let mut next: u32 = 0;
        for (slot, (dim, axes)) in blocks.iter_mut().zip(ORIENTATIONS) {
            // Every extent is bounded by the checked total.
            let [ex, ey, ez] = extent(resolution, axes);
            let len = (ex * ey * ez) as u32;
            *slot = CellBlock {
                dim,
                axes,
                extent: [ex as u32, ey as u32, ez as u32],
                start: next,
                len,
            };
            next += len;
        }

        let [nx, ny, _] = resolution;
        Ok(Self {
            resolution,
            counts,
            blocks,
            strides: [1, nx, nx.saturating_mul(ny)],
        })
    }

    #[inline]
    pub fn resolution(&self) -> [u32; 3] {
        self.resolution
    }

    #[inline]
    pub fn counts(&self) -> CellCounts {
        self.counts
    }

    /// Total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.counts.total() as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The eight orientation blocks in id order.
    pub fn blocks(&self) -> &[CellBlock] {
        &self.blocks
    }

    /// Ids of all cells of dimension `dim`.
    pub fn id_range(&self, dim: CellDim) -> Range<CellId> {
        let mut of_dim = self.blocks.iter().filter(|b| b.dim == dim);
        match of_dim.next() {
            Some(first) => {
                let end = of_dim.last().unwrap_or(first).ids().end;
                first.start..end
            }
            None => 0..0,
        }
    }

    /// Block holding `id`.
    pub fn block_of(&self, id: CellId) -> Result<&CellBlock, TopoError> {
        self.blocks
            .iter()
            .find(|b| b.contains(id))
            .ok_or_else(|| TopoError::out_of_range(id, self.len()))
    }

    /// Dimension of cell `id`.
    pub fn dim_of(&self, id: CellId) -> Result<CellDim, TopoError> {
        Ok(self.block_of(id)?.dim)
    }

    /// Grid coordinate of the minimal corner of cell `id`.
    pub fn anchor(&self, id: CellId) -> Result<[u32; 3], TopoError> {
        let block = self.block_of(id)?;
        Ok(Self::decode(block, id))
    }

    fn decode(block: &CellBlock, id: CellId) -> [u32; 3] {
        let local = id - block.start;
        let [ex, ey, _] = block.extent;
        [local % ex, (local / ex) % ey, local / (ex * ey)]
    }

    /// Corner vertex ids of cell `id` in ascending order (a vertex is its
    /// own single corner).
    pub fn corners(&self, id: CellId) -> Result<Vec<CellId>, TopoError> {
        let block = self.block_of(id)?;
        let [x, y, z] = Self::decode(block, id);
        let [sx, sy, sz] = self.strides;
        let base = x * sx + y * sy + z * sz;
        let mut out = Vec::with_capacity(block.dim.vertex_count());
        for mask in 0u32..8 {
            let fits = (0..3).all(|a| mask & (1 << a) == 0 || block.axes[a]);
            if !fits {
                continue;
            }
            let offset: u32 = (0..3)
                .filter(|a| mask & (1 << a) != 0)
                .map(|a| self.strides[a])
                .sum();
            out.push(base + offset);
        }
        out.sort_unstable();
        Ok(out)
    }
}
