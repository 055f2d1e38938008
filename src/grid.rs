//! Coverage grid: the receiver locations a placement is scored against.
//!
//! The grid is a flat rectangle of sample points at a fixed height. The
//! oracle reports one signal strength per cell; `GridArray` holds per-cell
//! values in row-major order so samples can be normalized to a stable
//! ordering regardless of the order the oracle returned them in.

use crate::error::{Error, Result};
use crate::site::Point3;
use serde::{Deserialize, Serialize};

/// Rectangular grid of receiver sample points.
///
/// Cells are `resolution` meters on a side. Cell centers start half a
/// resolution step in from the minimum corner, all at `sample_height`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoverageGrid {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    /// Cell edge length in meters.
    pub resolution: f64,
    /// Receiver height in meters.
    pub sample_height: f64,
}

impl CoverageGrid {
    pub fn new(
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        resolution: f64,
        sample_height: f64,
    ) -> Result<Self> {
        let grid = CoverageGrid {
            min_x,
            min_y,
            max_x,
            max_y,
            resolution,
            sample_height,
        };
        grid.validate()?;
        Ok(grid)
    }

    /// Validate grid parameters. Also called on deserialized configs.
    pub fn validate(&self) -> Result<()> {
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(Error::Config(format!(
                "grid resolution must be positive, got {}",
                self.resolution
            )));
        }
        if self.max_x <= self.min_x || self.max_y <= self.min_y {
            return Err(Error::Config(format!(
                "grid extent is empty: x [{}, {}], y [{}, {}]",
                self.min_x, self.max_x, self.min_y, self.max_y
            )));
        }
        Ok(())
    }

    pub fn cols(&self) -> usize {
        (((self.max_x - self.min_x) / self.resolution).ceil() as usize).max(1)
    }

    pub fn rows(&self) -> usize {
        (((self.max_y - self.min_y) / self.resolution).ceil() as usize).max(1)
    }

    pub fn cell_count(&self) -> usize {
        self.cols() * self.rows()
    }

    /// Center of the cell at (col, row), at sample height.
    pub fn cell_center(&self, col: usize, row: usize) -> Point3 {
        Point3::new(
            self.min_x + (col as f64 + 0.5) * self.resolution,
            self.min_y + (row as f64 + 0.5) * self.resolution,
            self.sample_height,
        )
    }

    /// All cell centers in row-major order (row 0 first, col varying fastest).
    pub fn cells(&self) -> impl DoubleEndedIterator<Item = Point3> + ExactSizeIterator + '_ {
        let cols = self.cols();
        let rows = self.rows();
        (0..rows * cols).map(move |i| self.cell_center(i % cols, i / cols))
    }

    /// Map a point back to its (col, row) cell, or `None` if outside the grid.
    pub fn cell_of(&self, point: Point3) -> Option<(usize, usize)> {
        if point.x < self.min_x || point.y < self.min_y {
            return None;
        }
        let col = ((point.x - self.min_x) / self.resolution) as usize;
        let row = ((point.y - self.min_y) / self.resolution) as usize;
        if col < self.cols() && row < self.rows() {
            Some((col, row))
        } else {
            None
        }
    }
}

/// One receiver measurement reported by the oracle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoverageSample {
    pub location: Point3,
    pub strength_dbm: f64,
}

/// A row-major array of per-cell data sized to a grid.
#[derive(Clone)]
pub struct GridArray<T: Copy> {
    cols: usize,
    data: Vec<T>,
}

impl<T: Copy> GridArray<T> {
    pub fn new(cols: usize, rows: usize, initial: T) -> Self {
        GridArray {
            cols,
            data: vec![initial; cols * rows],
        }
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> &T {
        &self.data[row * self.cols + col]
    }

    #[inline]
    pub fn get_mut(&mut self, col: usize, row: usize) -> &mut T {
        &mut self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, col: usize, row: usize, value: T) {
        *self.get_mut(col, row) = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        self.data.iter().enumerate().map(|(i, v)| {
            let col = i % self.cols;
            let row = i / self.cols;
            ((col, row), v)
        })
    }
}
