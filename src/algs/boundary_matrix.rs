//! Sparse mod-2 boundary matrix stored by column.
//!
//! Column `c` holds the row ids of the cells on the boundary of cell `c`.
//! Columns are kept sorted and deduplicated so the pivot (maximum row) is
//! the last entry and column addition is a linear merge.

use itertools::{EitherOrBoth, Itertools};

use crate::debug_invariants::{DebugInvariants, ensure};
use crate::topo_error::TopoError;
use crate::topology::cell::{CellDim, CellId};
use crate::topology::filtration::Filtration;

/// Column-oriented boundary matrix over Z/2.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoundaryMatrix {
    columns: Vec<Vec<CellId>>,
    dims: Vec<CellDim>,
}

impl BoundaryMatrix {
    /// Matrix with `num_cols` empty vertex columns.
    pub fn new(num_cols: usize) -> Self {
        Self {
            columns: vec![Vec::new(); num_cols],
            dims: vec![CellDim::Vertex; num_cols],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[inline]
    fn check(&self, id: CellId) -> Result<usize, TopoError> {
        let idx = id as usize;
        if idx < self.columns.len() {
            Ok(idx)
        } else {
            Err(TopoError::out_of_range(idx, self.columns.len()))
        }
    }

    pub fn set_dim(&mut self, id: CellId, dim: CellDim) -> Result<(), TopoError> {
        let idx = self.check(id)?;
        self.dims[idx] = dim;
        Ok(())
    }

    pub fn dim(&self, id: CellId) -> Result<CellDim, TopoError> {
        Ok(self.dims[self.check(id)?])
    }

    /// Replace the membership of column `id`.
    ///
    /// Order and repetition in `entries` are irrelevant; every entry must be
    /// a valid row id.
    pub fn set_column<I>(&mut self, id: CellId, entries: I) -> Result<(), TopoError>
    where
        I: IntoIterator<Item = CellId>,
    {
        let idx = self.check(id)?;
        let mut col: Vec<CellId> = entries.into_iter().collect();
        if let Some(&bad) = col.iter().find(|&&r| r as usize >= self.columns.len()) {
            return Err(TopoError::out_of_range(bad, self.columns.len()));
        }
        col.sort_unstable();
        col.dedup();
        self.columns[idx] = col;
        Ok(())
    }

    /// Current membership of column `id`, ascending.
    pub fn column(&self, id: CellId) -> Result<&[CellId], TopoError> {
        Ok(&self.columns[self.check(id)?])
    }

    /// Maximum row of column `id`, or `None` when the column is empty.
    pub fn pivot(&self, id: CellId) -> Result<Option<CellId>, TopoError> {
        Ok(self.columns[self.check(id)?].last().copied())
    }

    /// `target ^= source`: rows in both columns cancel, rows only in
    /// `source` are inserted. Only `target` changes.
    pub fn add_to(&mut self, source: CellId, target: CellId) -> Result<(), TopoError> {
        let s = self.check(source)?;
        let t = self.check(target)?;
        if s == t {
            // x + x = 0 over Z/2
            self.columns[t].clear();
            return Ok(());
        }
        if self.columns[s].is_empty() {
            return Ok(());
        }
        let merged: Vec<CellId> = self.columns[t]
            .iter()
            .merge_join_by(self.columns[s].iter(), |a, b| a.cmp(b))
            .filter_map(|pair| match pair {
                EitherOrBoth::Left(&r) | EitherOrBoth::Right(&r) => Some(r),
                EitherOrBoth::Both(..) => None,
            })
            .collect();
        self.columns[t] = merged;
        Ok(())
    }

    /// Iterate `(id, column)` in id order.
    pub fn columns(&self) -> impl Iterator<Item = (CellId, &[CellId])> + '_ {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, c)| (i as CellId, c.as_slice()))
    }

    /// Number of stored non-zero entries.
    pub fn nnz(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    /// Verify that `filtration` never lets a cell precede its boundary.
    pub fn check_filtration(&self, filtration: &Filtration) -> Result<(), TopoError> {
        if filtration.len() != self.len() {
            return Err(TopoError::ShapeMismatch {
                expected: self.len(),
                actual: filtration.len(),
            });
        }
        for (id, col) in self.columns() {
            filtration.check_monotone(id, col)?;
        }
        Ok(())
    }
}

impl BoundaryMatrix {
    /// Check the shape of a cell-complex boundary: every entry precedes its
    /// column and vertex columns are empty.
    ///
    /// Matrices assembled by hand need not satisfy this; reduction accepts
    /// them as long as [`validate_invariants`](DebugInvariants::validate_invariants) holds.
    pub fn check_complex_shape(&self) -> Result<(), TopoError> {
        for (id, col) in self.columns() {
            if let Some(&last) = col.last() {
                ensure(last < id, || {
                    format!("column {id} references row {last} not before it")
                })?;
            }
            if self.dims[id as usize] == CellDim::Vertex {
                ensure(col.is_empty(), || format!("vertex column {id} is not empty"))?;
            }
        }
        Ok(())
    }

    /// Check that no two non-empty columns share a pivot.
    pub fn check_reduced(&self) -> Result<(), TopoError> {
        let mut owner: Vec<Option<CellId>> = vec![None; self.len()];
        for (id, col) in self.columns() {
            let Some(&pivot) = col.last() else {
                continue;
            };
            if let Some(first) = owner[pivot as usize].replace(id) {
                return Err(TopoError::InvariantViolation(format!(
                    "columns {first} and {id} share pivot {pivot}"
                )));
            }
        }
        Ok(())
    }
}

impl DebugInvariants for BoundaryMatrix {
    /// Every column is strictly ascending and carries a dimension tag.
    fn validate_invariants(&self) -> Result<(), TopoError> {
        ensure(self.columns.len() == self.dims.len(), || {
            format!(
                "{} columns but {} dimension tags",
                self.columns.len(),
                self.dims.len()
            )
        })?;
        for (id, col) in self.columns() {
            ensure(col.windows(2).all(|w| w[0] < w[1]), || {
                format!("column {id} is not strictly ascending")
            })?;
        }
        Ok(())
    }
}
