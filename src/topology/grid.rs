//! Regular 3D grids of `u8` samples, the input of the complex builder.
//!
//! Samples are stored x-fastest: the sample at `(x, y, z)` lives at
//! `x + X * (y + Y * z)`. A grid whose buffer length disagrees with its
//! resolution can never be constructed, so downstream code indexes without
//! re-checking the shape.

use serde::{Deserialize, Serialize};

use crate::topo_error::TopoError;

/// A validated 3D scalar volume.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridParts", into = "GridParts")]
pub struct ScalarGrid {
    resolution: [u32; 3],
    data: Vec<u8>,
}

/// Unvalidated wire form of [`ScalarGrid`].
#[derive(Clone, Debug, Serialize, Deserialize)]
struct GridParts {
    resolution: [u32; 3],
    data: Vec<u8>,
}

impl TryFrom<GridParts> for ScalarGrid {
    type Error = TopoError;

    fn try_from(parts: GridParts) -> Result<Self, Self::Error> {
        ScalarGrid::try_new(parts.resolution, parts.data)
    }
}

impl From<ScalarGrid> for GridParts {
    fn from(grid: ScalarGrid) -> Self {
        GridParts {
            resolution: grid.resolution,
            data: grid.data,
        }
    }
}

/// Summary statistics of a grid's samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridStats {
    pub min: u8,
    pub max: u8,
    pub mean: f64,
    pub non_zero: usize,
}

fn sample_count(resolution: [u32; 3]) -> Option<usize> {
    resolution
        .iter()
        .try_fold(1usize, |acc, &axis| acc.checked_mul(usize::try_from(axis).ok()?))
}

impl ScalarGrid {
    /// Build a grid, failing with [`TopoError::ShapeMismatch`] unless
    /// `data.len() == X * Y * Z`.
    ///
    /// Axis lengths of 0 or 1 are accepted.
    pub fn try_new(resolution: [u32; 3], data: Vec<u8>) -> Result<Self, TopoError> {
        let expected = sample_count(resolution).ok_or(TopoError::ShapeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;
        if expected != data.len() {
            return Err(TopoError::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { resolution, data })
    }

    /// Grid of the given resolution with every sample set to `value`.
    pub fn filled(resolution: [u32; 3], value: u8) -> Result<Self, TopoError> {
        let n = sample_count(resolution).ok_or(TopoError::ShapeMismatch {
            expected: usize::MAX,
            actual: 0,
        })?;
        Self::try_new(resolution, vec![value; n])
    }

    #[inline]
    pub fn resolution(&self) -> [u32; 3] {
        self.resolution
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Linear sample index of `(x, y, z)`; the caller guarantees bounds.
    #[inline]
    pub fn index(&self, x: u32, y: u32, z: u32) -> usize {
        let [nx, ny, _] = self.resolution;
        x as usize + nx as usize * (y as usize + ny as usize * z as usize)
    }

    /// Sample at `(x, y, z)`.
    pub fn sample(&self, x: u32, y: u32, z: u32) -> Result<u8, TopoError> {
        let [nx, ny, nz] = self.resolution;
        if x >= nx || y >= ny || z >= nz {
            return Err(TopoError::OutOfRange {
                index: self.index(x.min(nx), y.min(ny), z.min(nz)),
                len: self.len(),
            });
        }
        Ok(self.data[self.index(x, y, z)])
    }

    pub fn set_sample(&mut self, x: u32, y: u32, z: u32, value: u8) -> Result<(), TopoError> {
        self.sample(x, y, z)?;
        let idx = self.index(x, y, z);
        self.data[idx] = value;
        Ok(())
    }

    /// Min, max, mean and non-zero count; `None` for an empty grid.
    pub fn stats(&self) -> Option<GridStats> {
        let min = *self.data.iter().min()?;
        let max = *self.data.iter().max()?;
        let sum: u64 = self.data.iter().map(|&v| u64::from(v)).sum();
        Some(GridStats {
            min,
            max,
            mean: sum as f64 / self.data.len() as f64,
            non_zero: self.data.iter().filter(|&&v| v != 0).count(),
        })
    }

    /// `n³` volume of three nested cubes: a 128 shell, a 230 middle cube
    /// spanning `[n/4, 3n/4)` and a 255 core spanning `[3n/8, 5n/8)`.
    pub fn nested_cubes(n: u32) -> Self {
        let len = (n as usize).pow(3);
        let mut grid = Self {
            resolution: [n; 3],
            data: vec![128; len],
        };
        let middle = n / 4..(3 * n) / 4;
        let core = (3 * n) / 8..(5 * n) / 8;
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    let inside = |r: &std::ops::Range<u32>| {
                        r.contains(&x) && r.contains(&y) && r.contains(&z)
                    };
                    let idx = grid.index(x, y, z);
                    if inside(&core) {
                        grid.data[idx] = 255;
                    } else if inside(&middle) {
                        grid.data[idx] = 230;
                    }
                }
            }
        }
        grid
    }

    /// `n³` volume ramping linearly from 0 at `x = 0` to 255 at `x = n - 1`.
    pub fn gradient_x(n: u32) -> Self {
        let denom = u64::from(n.saturating_sub(1).max(1));
        let mut data = Vec::with_capacity((n as usize).pow(3));
        for _z in 0..n {
            for _y in 0..n {
                data.extend((0..n).map(|x| (u64::from(x) * 255 / denom) as u8));
            }
        }
        Self {
            resolution: [n; 3],
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_is_rejected() {
        let err = ScalarGrid::try_new([2, 2, 2], vec![0; 7]).unwrap_err();
        assert_eq!(
            err,
            TopoError::ShapeMismatch {
                expected: 8,
                actual: 7
            }
        );
    }

    #[test]
    fn zero_axis_means_empty_buffer() {
        let g = ScalarGrid::try_new([4, 0, 3], Vec::new()).unwrap();
        assert!(g.is_empty());
        assert!(g.stats().is_none());
    }

    #[test]
    fn x_is_fastest_axis() {
        let g = ScalarGrid::try_new([2, 2, 2], (0..8).collect()).unwrap();
        assert_eq!(g.sample(1, 0, 0).unwrap(), 1);
        assert_eq!(g.sample(0, 1, 0).unwrap(), 2);
        assert_eq!(g.sample(0, 0, 1).unwrap(), 4);
        assert!(matches!(
            g.sample(2, 0, 0),
            Err(TopoError::OutOfRange { .. })
        ));
    }

    #[test]
    fn nested_cubes_matches_sixteen_cubed_layout() {
        let g = ScalarGrid::nested_cubes(16);
        assert_eq!(g.sample(0, 0, 0).unwrap(), 128);
        assert_eq!(g.sample(4, 4, 4).unwrap(), 230);
        assert_eq!(g.sample(11, 11, 11).unwrap(), 230);
        assert_eq!(g.sample(12, 12, 12).unwrap(), 128);
        assert_eq!(g.sample(6, 6, 6).unwrap(), 255);
        assert_eq!(g.sample(9, 9, 9).unwrap(), 255);
        let stats = g.stats().unwrap();
        assert_eq!((stats.min, stats.max), (128, 255));
        assert_eq!(stats.non_zero, 16 * 16 * 16);
    }

    #[test]
    fn gradient_spans_full_range() {
        let g = ScalarGrid::gradient_x(16);
        assert_eq!(g.sample(0, 3, 5).unwrap(), 0);
        assert_eq!(g.sample(15, 3, 5).unwrap(), 255);
        let stats = g.stats().unwrap();
        assert_eq!(stats.non_zero, 15 * 16 * 16);
    }

    #[test]
    fn serde_rejects_inconsistent_shape() {
        let bad = r#"{"resolution":[2,1,1],"data":[1]}"#;
        assert!(serde_json::from_str::<ScalarGrid>(bad).is_err());
        let good = ScalarGrid::try_new([2, 1, 1], vec![3, 4]).unwrap();
        let text = serde_json::to_string(&good).unwrap();
        assert_eq!(serde_json::from_str::<ScalarGrid>(&text).unwrap(), good);
    }
}
