//! Per-cell filtration values.
//!
//! The lower-star filtration gives every cell the largest sample among its
//! corner vertices, which makes it monotone along the boundary relation:
//! a cell never enters before the cells on its boundary.
//!
//! The upper-star filtration sweeps from bright to dark: a cell takes the
//! smallest corner sample, stored inverted as `255 - min` so values still
//! grow along the boundary relation.

use serde::{Deserialize, Serialize};

use crate::algs::reduction::PersistencePair;
use crate::debug_invariants::{DebugInvariants, ensure};
use crate::topo_error::TopoError;
use crate::topology::cell::CellId;
use crate::topology::cubical::CubicalComplex;
use crate::topology::grid::ScalarGrid;

/// Direction in which samples enter the filtration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FiltrationMode {
    /// Dark to bright: a cell enters with its largest corner sample.
    #[default]
    LowerStar,
    /// Bright to dark: a cell enters with `255 -` its smallest corner sample.
    UpperStar,
}

/// Filtration value of every cell, indexed by [`CellId`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filtration {
    values: Vec<u32>,
}

impl Filtration {
    pub fn from_values(values: Vec<u32>) -> Self {
        Self { values }
    }

    /// Lower-star filtration of `complex` over the samples of `grid`.
    pub fn lower_star(grid: &ScalarGrid, complex: &CubicalComplex) -> Result<Self, TopoError> {
        Self::with_mode(grid, complex, FiltrationMode::LowerStar)
    }

    /// Upper-star filtration of `complex` over the samples of `grid`.
    pub fn upper_star(grid: &ScalarGrid, complex: &CubicalComplex) -> Result<Self, TopoError> {
        Self::with_mode(grid, complex, FiltrationMode::UpperStar)
    }

    pub fn with_mode(
        grid: &ScalarGrid,
        complex: &CubicalComplex,
        mode: FiltrationMode,
    ) -> Result<Self, TopoError> {
        if complex.resolution() != grid.resolution() {
            return Err(TopoError::ShapeMismatch {
                expected: complex.counts().vertices as usize,
                actual: grid.len(),
            });
        }
        let samples = grid.data();
        let value_of = |id: CellId| -> Result<u32, TopoError> {
            let corners = complex.corners(id)?;
            let (mut lo, mut hi) = (u8::MAX, 0u8);
            for v in corners {
                let s = *samples
                    .get(v as usize)
                    .ok_or_else(|| TopoError::out_of_range(v, samples.len()))?;
                lo = lo.min(s);
                hi = hi.max(s);
            }
            Ok(match mode {
                FiltrationMode::LowerStar => u32::from(hi),
                FiltrationMode::UpperStar => u32::from(u8::MAX - lo),
            })
        };

        let n = complex.len() as CellId;
        #[cfg(feature = "rayon")]
        let values = {
            use rayon::prelude::*;
            (0..n)
                .into_par_iter()
                .map(value_of)
                .collect::<Result<Vec<_>, _>>()?
        };
        #[cfg(not(feature = "rayon"))]
        let values = (0..n).map(value_of).collect::<Result<Vec<_>, _>>()?;

        let filtration = Self { values };
        crate::debug_invariants!(filtration.validate_invariants(), "Filtration::with_mode");
        Ok(filtration)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.values
    }

    /// Filtration value of cell `id`.
    pub fn value(&self, id: CellId) -> Result<u32, TopoError> {
        self.values
            .get(id as usize)
            .copied()
            .ok_or_else(|| TopoError::out_of_range(id, self.values.len()))
    }

    /// `filtration(death) - filtration(birth)`, clamped at 0.
    pub fn persistence(&self, pair: &PersistencePair) -> Result<u32, TopoError> {
        Ok(self.value(pair.death)?.saturating_sub(self.value(pair.birth)?))
    }

    /// Map a cell-id pair to the pair of its filtration values.
    pub fn value_pair(&self, pair: &PersistencePair) -> Result<PersistencePair, TopoError> {
        Ok(PersistencePair::new(
            self.value(pair.birth)?,
            self.value(pair.death)?,
        ))
    }

    /// [`value_pair`](Self::value_pair) over a sequence, preserving order.
    pub fn value_pairs(&self, pairs: &[PersistencePair]) -> Result<Vec<PersistencePair>, TopoError> {
        pairs.iter().map(|p| self.value_pair(p)).collect()
    }

    /// Check that every cell is at least as late as each of its `faces`.
    pub fn check_monotone<'a, I>(&self, cell: CellId, faces: I) -> Result<(), TopoError>
    where
        I: IntoIterator<Item = &'a CellId>,
    {
        let v = self.value(cell)?;
        for &face in faces {
            if self.value(face)? > v {
                return Err(TopoError::NonMonotoneFiltration { cell, face });
            }
        }
        Ok(())
    }
}

impl DebugInvariants for Filtration {
    fn validate_invariants(&self) -> Result<(), TopoError> {
        ensure(u32::try_from(self.values.len()).is_ok(), || {
            format!("{} values exceed the u32 id space", self.values.len())
        })
    }
}
