//! Build the filtered cubical complex of a scalar grid.
//!
//! One pass over the id layout of [`CubicalComplex`] fills a
//! [`BoundaryMatrix`] whose columns are the corner vertices of each cell
//! (two for edges, four for faces, eight for voxels) and tags every column
//! with its dimension. The [`Filtration`] (lower- or upper-star) is
//! computed from the same corners.

use crate::algs::boundary_matrix::BoundaryMatrix;
use crate::debug_invariants::DebugInvariants;
use crate::topo_error::TopoError;
use crate::topology::cell::CellDim;
use crate::topology::cubical::{CellCounts, CubicalComplex};
use crate::topology::filtration::{Filtration, FiltrationMode};
use crate::topology::grid::ScalarGrid;

/// Complex layout, boundary matrix and filtration of one grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilteredComplex {
    pub complex: CubicalComplex,
    pub matrix: BoundaryMatrix,
    pub filtration: Filtration,
}

impl FilteredComplex {
    #[inline]
    pub fn counts(&self) -> CellCounts {
        self.complex.counts()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.matrix.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    pub fn into_parts(self) -> (CubicalComplex, BoundaryMatrix, Filtration) {
        (self.complex, self.matrix, self.filtration)
    }
}

/// Build the boundary matrix and lower-star filtration of `grid`.
///
/// Axes of length 0 or 1 are legal and simply produce no cells that need a
/// neighbour along them. Fails with [`TopoError::TooManyCells`] when the
/// cell count does not fit `u32` ids.
pub fn build_complex(grid: &ScalarGrid) -> Result<FilteredComplex, TopoError> {
    build_complex_with_mode(grid, FiltrationMode::LowerStar)
}

/// [`build_complex`] with the filtration direction chosen by `mode`.
pub fn build_complex_with_mode(
    grid: &ScalarGrid,
    mode: FiltrationMode,
) -> Result<FilteredComplex, TopoError> {
    let complex = CubicalComplex::new(grid.resolution())?;
    let mut matrix = BoundaryMatrix::new(complex.len());

    for block in complex.blocks() {
        if block.dim == CellDim::Vertex {
            continue;
        }
        for id in block.ids() {
            matrix.set_dim(id, block.dim)?;
            matrix.set_column(id, complex.corners(id)?)?;
        }
    }

    let filtration = Filtration::with_mode(grid, &complex, mode)?;
    let counts = complex.counts();
    log::debug!(
        "built {mode:?} complex {:?}: {} vertices, {} edges, {} faces, {} voxels, {} boundary entries",
        grid.resolution(),
        counts.vertices,
        counts.edges,
        counts.faces,
        counts.voxels,
        matrix.nnz()
    );

    crate::debug_invariants!(matrix.validate_invariants(), "build_complex");
    crate::debug_invariants!(matrix.check_complex_shape(), "build_complex");
    crate::debug_invariants!(matrix.check_filtration(&filtration), "build_complex");
    Ok(FilteredComplex {
        complex,
        matrix,
        filtration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_cube_columns() {
        let grid = ScalarGrid::filled([2, 2, 2], 0).unwrap();
        let fc = build_complex(&grid).unwrap();
        assert_eq!(fc.len(), 27);
        assert!(fc.matrix.column(3).unwrap().is_empty());
        assert_eq!(fc.matrix.column(8).unwrap(), &[0, 1]);
        assert_eq!(fc.matrix.column(20).unwrap(), &[0, 1, 2, 3]);
        assert_eq!(fc.matrix.column(26).unwrap().len(), 8);
        assert_eq!(fc.matrix.dim(26).unwrap(), CellDim::Voxel);
        assert_eq!(fc.matrix.dim(22).unwrap(), CellDim::Face);
        assert_eq!(fc.matrix.nnz(), 12 * 2 + 6 * 4 + 8);
    }

    #[test]
    fn lower_star_values_follow_corners() {
        let mut grid = ScalarGrid::filled([2, 2, 2], 0).unwrap();
        grid.set_sample(1, 1, 1, 255).unwrap();
        let fc = build_complex(&grid).unwrap();
        let f = &fc.filtration;
        assert_eq!(f.value(7).unwrap(), 255);
        assert_eq!(f.value(8).unwrap(), 0, "edge {{0,1}}");
        assert_eq!(f.value(11).unwrap(), 255, "edge {{6,7}}");
        assert_eq!(f.value(26).unwrap(), 255);
        assert!(fc.matrix.check_filtration(f).is_ok());
    }

    #[test]
    fn upper_star_keeps_columns_and_stays_monotone() {
        let mut grid = ScalarGrid::filled([2, 2, 2], 0).unwrap();
        grid.set_sample(1, 1, 1, 255).unwrap();
        let lower = build_complex(&grid).unwrap();
        let upper = build_complex_with_mode(&grid, FiltrationMode::UpperStar).unwrap();
        assert_eq!(upper.matrix, lower.matrix);
        assert_eq!(upper.filtration.value(7).unwrap(), 0);
        assert_eq!(upper.filtration.value(11).unwrap(), 255, "edge {{6,7}}");
        assert_eq!(upper.filtration.value(26).unwrap(), 255);
        assert!(upper.matrix.check_filtration(&upper.filtration).is_ok());
    }

    #[test]
    fn single_slice_has_no_voxels() {
        let grid = ScalarGrid::filled([3, 3, 1], 4).unwrap();
        let fc = build_complex(&grid).unwrap();
        let counts = fc.counts();
        assert_eq!(counts.voxels, 0);
        assert_eq!(counts.faces, 4);
        assert_eq!(fc.len() as u64, counts.total());
    }

    #[test]
    fn empty_grid_builds_empty_complex() {
        let grid = ScalarGrid::filled([0, 4, 4], 0).unwrap();
        let fc = build_complex(&grid).unwrap();
        assert!(fc.is_empty());
        assert!(fc.filtration.is_empty());
    }
}
