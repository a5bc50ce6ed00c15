//! Standard persistent-homology column reduction.
//!
//! Columns are processed in increasing id order. While the current column's
//! pivot is already owned by an earlier column, that column is added to it.
//! A column left non-empty claims its pivot and emits the pair
//! `(pivot, column)`; a column reduced to zero emits nothing, so essential
//! (never-dying) classes are not reported.
//!
//! Pivot ties are broken purely by processing order. Any reordering of the
//! column loop changes which pairs come out and is not allowed here.
//!
//! # Complexity
//! - Time: `O(N²)` column additions in the worst case, each linear in the
//!   column lengths.
//! - Memory: one `Option<CellId>` pivot slot per column.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::algs::boundary_matrix::BoundaryMatrix;
use crate::debug_invariants::DebugInvariants;
use crate::topo_error::TopoError;
use crate::topology::cell::CellId;

/// A `(birth, death)` pair emitted by [`reduce`].
///
/// Fresh from reduction both fields are cell ids with `birth < death`;
/// [`Filtration::value_pairs`](crate::topology::filtration::Filtration::value_pairs)
/// maps them to filtration values. The layout is plain old data so pairs
/// can be copied into GPU buffers as-is.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    bytemuck::Pod,
    bytemuck::Zeroable,
)]
#[repr(C)]
pub struct PersistencePair {
    pub birth: u32,
    pub death: u32,
}

impl PersistencePair {
    #[inline]
    pub const fn new(birth: u32, death: u32) -> Self {
        Self { birth, death }
    }

    /// `death - birth`, clamped to 0 when `death <= birth`.
    #[inline]
    pub const fn persistence(&self) -> u32 {
        self.death.saturating_sub(self.birth)
    }
}

impl From<(u32, u32)> for PersistencePair {
    fn from((birth, death): (u32, u32)) -> Self {
        Self { birth, death }
    }
}

/// Counters collected by [`reduce_with_stats`].
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct ReductionStats {
    /// Columns visited.
    pub columns: usize,
    /// `add_to` calls performed.
    pub column_additions: usize,
    /// Pairs emitted.
    pub pairs: usize,
    /// Columns that ended up empty.
    pub empty_columns: usize,
}

/// Pairs plus statistics of one reduction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reduction {
    /// Pairs in emission order (increasing death id).
    pub pairs: Vec<PersistencePair>,
    pub stats: ReductionStats,
}

/// Reduce `matrix` in place and report pairs with counters.
///
/// Running it again on an already reduced matrix returns the same pairs and
/// performs no column additions.
pub fn reduce_with_stats(matrix: &mut BoundaryMatrix) -> Result<Reduction, TopoError> {
    reduce_columns(matrix, |_, _| {})
}

/// Column loop shared by every entry point; `on_absorb(col, owner)` runs
/// before `owner` is added into `col`.
fn reduce_columns<F>(matrix: &mut BoundaryMatrix, mut on_absorb: F) -> Result<Reduction, TopoError>
where
    F: FnMut(CellId, CellId),
{
    let n = matrix.len();
    let mut pivot_owner: Vec<Option<CellId>> = vec![None; n];
    let mut out = Reduction::default();

    for col in 0..n as CellId {
        out.stats.columns += 1;
        let mut pivot = matrix.pivot(col)?;
        while let Some(row) = pivot {
            let Some(owner) = pivot_owner[row as usize] else {
                break;
            };
            on_absorb(col, owner);
            matrix.add_to(owner, col)?;
            out.stats.column_additions += 1;
            pivot = matrix.pivot(col)?;
        }
        match pivot {
            Some(row) => {
                pivot_owner[row as usize] = Some(col);
                out.pairs.push(PersistencePair::new(row, col));
            }
            None => out.stats.empty_columns += 1,
        }
    }
    out.stats.pairs = out.pairs.len();

    log::debug!(
        "reduced {} columns: {} pairs, {} column additions, {} empty",
        out.stats.columns,
        out.stats.pairs,
        out.stats.column_additions,
        out.stats.empty_columns
    );
    crate::debug_invariants!(matrix.validate_invariants(), "reduce_with_stats");
    crate::debug_invariants!(matrix.check_reduced(), "reduce_with_stats");
    Ok(out)
}

/// Reduction result plus the absorption history of every column.
///
/// A column is absorbed by the pivot owner that gets added into it.
/// Columns linked by absorption form one component, labelled by its
/// smallest column id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedReduction {
    pub reduction: Reduction,
    /// Column → last column added into it during reduction.
    pub absorptions: BTreeMap<CellId, CellId>,
    component: Vec<CellId>,
}

impl ExtendedReduction {
    /// Label (smallest member) of the component holding `col`.
    pub fn component_of(&self, col: CellId) -> Result<CellId, TopoError> {
        self.component
            .get(col as usize)
            .copied()
            .ok_or_else(|| TopoError::out_of_range(col, self.component.len()))
    }

    /// Components keyed by label, members ascending.
    pub fn components(&self) -> BTreeMap<CellId, Vec<CellId>> {
        let mut out: BTreeMap<CellId, Vec<CellId>> = BTreeMap::new();
        for (col, &label) in self.component.iter().enumerate() {
            out.entry(label).or_default().push(col as CellId);
        }
        out
    }
}

fn find_label(parent: &mut [CellId], mut x: CellId) -> CellId {
    while parent[x as usize] != x {
        let up = parent[x as usize];
        parent[x as usize] = parent[up as usize];
        x = up;
    }
    x
}

/// [`reduce_with_stats`] that also records which column absorbed which.
///
/// Pairs and stats are exactly those of [`reduce_with_stats`].
pub fn reduce_extended(matrix: &mut BoundaryMatrix) -> Result<ExtendedReduction, TopoError> {
    let n = matrix.len();
    let mut absorptions = BTreeMap::new();
    let mut parent: Vec<CellId> = (0..n as CellId).collect();

    let reduction = reduce_columns(matrix, |col, owner| {
        absorptions.insert(col, owner);
        let a = find_label(&mut parent, col);
        let b = find_label(&mut parent, owner);
        if a != b {
            let (keep, join) = if a < b { (a, b) } else { (b, a) };
            parent[join as usize] = keep;
        }
    })?;

    let component = (0..n as CellId)
        .map(|c| find_label(&mut parent, c))
        .collect();
    log::debug!("{} columns absorbed during reduction", absorptions.len());
    Ok(ExtendedReduction {
        reduction,
        absorptions,
        component,
    })
}

/// Reduce `matrix` in place and return its persistence pairs in emission order.
pub fn reduce(matrix: &mut BoundaryMatrix) -> Result<Vec<PersistencePair>, TopoError> {
    Ok(reduce_with_stats(matrix)?.pairs)
}

impl BoundaryMatrix {
    /// See [`reduce`].
    pub fn reduce(&mut self) -> Result<Vec<PersistencePair>, TopoError> {
        reduce(self)
    }
}

#[cfg(test)]
mod layout_tests {
    use super::*;
    use static_assertions::assert_eq_size;

    assert_eq_size!(PersistencePair, u64);
}
