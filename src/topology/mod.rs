//! Top-level module for the cubical-complex side of the engine.
//!
//! This module provides:
//! - [`ScalarGrid`]: the validated 3D `u8` volume the engine consumes
//! - [`CubicalComplex`]: the id layout of vertices, edges, faces and voxels
//! - [`Filtration`]: per-cell lower- or upper-star values ([`FiltrationMode`])
//! - [`CellId`] / [`CellDim`]: cell handles and dimension tags
//!
//! Boundary matrices and everything computed from them live in [`crate::algs`].

pub mod cell;
pub mod cubical;
pub mod filtration;
pub mod grid;

pub use cell::{CellDim, CellId};
pub use cubical::{CellBlock, CellCounts, CubicalComplex};
pub use filtration::{Filtration, FiltrationMode};
pub use grid::{GridStats, ScalarGrid};
