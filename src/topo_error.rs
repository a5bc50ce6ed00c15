//! TopoError: Unified error type for voxel-persistence public APIs
//!
//! Every fallible operation in the crate (grid construction, complex building,
//! boundary-matrix access, merge-tree manipulation, the feature pipeline)
//! reports through this enum instead of panicking or silently ignoring bad ids.

use thiserror::Error;

/// Unified error type for voxel-persistence operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopoError {
    /// A column, row, or cell id fell outside `0..len`.
    #[error("index {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },
    /// Sample buffer length does not match the product of the grid resolution.
    #[error("grid shape mismatch: resolution implies {expected} samples, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    /// The cubical complex would have more cells than a `u32` id can address.
    #[error("cubical complex needs {0} cells, more than u32 ids can address")]
    TooManyCells(u64),
    /// A merge-tree operation referenced an id that is not in the tree.
    #[error("merge tree node {0} not found")]
    NodeNotFound(u32),
    /// `add_node` was called with an id that already exists.
    #[error("merge tree node {0} already exists")]
    DuplicateNode(u32),
    /// Attaching `child` under `parent` would close a cycle.
    #[error("attaching node {child} under node {parent} would create a cycle")]
    CycleDetected { parent: u32, child: u32 },
    /// The merge-tree builder ran out of `u32` node ids.
    #[error("merge tree node ids exhausted")]
    NodeIdOverflow,
    /// A cell enters the filtration before one of its boundary cells.
    #[error("filtration not monotone: cell {cell} precedes boundary cell {face}")]
    NonMonotoneFiltration { cell: u32, face: u32 },
    /// A structural invariant check failed.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    /// The feature pipeline observed its cancellation flag.
    #[error("cancelled before phase `{0}`")]
    Cancelled(&'static str),
}

impl TopoError {
    pub(crate) fn out_of_range(index: impl TryInto<usize>, len: usize) -> Self {
        TopoError::OutOfRange {
            index: index.try_into().unwrap_or(usize::MAX),
            len,
        }
    }
}
