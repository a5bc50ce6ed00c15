//! Structural self-checks for the engine's containers.
//!
//! [`BoundaryMatrix`](crate::algs::boundary_matrix::BoundaryMatrix),
//! [`Filtration`](crate::topology::filtration::Filtration) and
//! [`MergeTree`](crate::algs::merge_tree::MergeTree) implement
//! [`DebugInvariants`]. Checks that only hold for a subset of values, such
//! as [`BoundaryMatrix::check_complex_shape`](crate::algs::boundary_matrix::BoundaryMatrix::check_complex_shape)
//! and [`BoundaryMatrix::check_reduced`](crate::algs::boundary_matrix::BoundaryMatrix::check_reduced),
//! are separate methods run only by the phase that guarantees them. Whole-structure checks run at phase boundaries
//! (after building, after reducing, after tree construction), never inside
//! the per-column loops.

use crate::topo_error::TopoError;

/// Trait for validating data structure invariants.
pub trait DebugInvariants {
    /// Panic on the first violated invariant when invariant checking is enabled.
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "debug_assert_invariants");
    }
    /// Validate invariants and return the first error encountered.
    fn validate_invariants(&self) -> Result<(), TopoError>;
}

/// Turn a failed condition into [`TopoError::InvariantViolation`].
#[inline]
pub(crate) fn ensure(cond: bool, describe: impl FnOnce() -> String) -> Result<(), TopoError> {
    if cond {
        Ok(())
    } else {
        Err(TopoError::InvariantViolation(describe()))
    }
}

/// Run a fallible check and panic on error when invariant checking is
/// enabled (`debug_assertions`, `strict-invariants` or `check-invariants`).
///
/// The context is one or more string literals naming the phase, e.g.
/// `debug_invariants!(m.check_reduced(), "reduce_with_stats")`; they are
/// concatenated into the panic message ahead of the [`TopoError`].
#[macro_export]
macro_rules! debug_invariants {
    ($check:expr, $($phase:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(err) = $check {
            panic!(concat!("invariant check failed in ", $($phase)*, ": {}"), err);
        }
    };
}
