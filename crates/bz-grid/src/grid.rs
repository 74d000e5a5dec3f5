//! Dense cell storage and observation blocks.
//!
//! Both types are row-major: cell `(row, col)` lives at `row * cols + col`.
//! Out-of-range coordinates panic; they indicate a caller bug, not a
//! recoverable condition.

use crate::sensor::Observation;
use crate::{GridError, GridResult};

// ── OccupancyGrid ─────────────────────────────────────────────────────────────

/// Per-cell obstacle probabilities.
#[derive(Clone, Debug, PartialEq)]
pub struct OccupancyGrid {
    rows:  usize,
    cols:  usize,
    cells: Vec<f64>,
}

impl OccupancyGrid {
    /// A `rows × cols` grid with every cell set to `prior`.
    pub fn uniform(rows: usize, cols: usize, prior: f64) -> GridResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(GridError::EmptyGrid { rows, cols });
        }
        if !(prior > 0.0 && prior < 1.0) {
            return Err(GridError::InvalidPrior(prior));
        }
        Ok(Self { rows, cols, cells: vec![prior; rows * cols] })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Probability stored at `(row, col)`.
    ///
    /// # Panics
    /// Panics if the cell is outside the grid.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cells[self.index(row, col)]
    }

    #[inline]
    pub(crate) fn set(&mut self, row: usize, col: usize, p: f64) {
        let i = self.index(row, col);
        self.cells[i] = p;
    }

    /// All cells in row-major order.
    pub fn as_slice(&self) -> &[f64] {
        &self.cells
    }

    /// One row of cells.
    pub fn row(&self, row: usize) -> &[f64] {
        assert!(row < self.rows, "row {row} out of range for {}-row grid", self.rows);
        &self.cells[row * self.cols..(row + 1) * self.cols]
    }

    /// `((row, col), probability)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &p)| ((i / cols, i % cols), p))
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.rows && col < self.cols,
            "cell ({row}, {col}) out of range for {}x{} grid",
            self.rows,
            self.cols,
        );
        row * self.cols + col
    }
}

// ── ObservationBlock ──────────────────────────────────────────────────────────

/// A rectangular patch of observations, fused at an offset into the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct ObservationBlock {
    rows:  usize,
    cols:  usize,
    cells: Vec<Observation>,
}

impl ObservationBlock {
    /// Wrap a row-major cell vector.  `cells.len()` must equal `rows * cols`.
    pub fn new(rows: usize, cols: usize, cells: Vec<Observation>) -> GridResult<Self> {
        if cells.len() != rows * cols {
            return Err(GridError::BlockShape { expected: rows * cols, got: cells.len() });
        }
        Ok(Self { rows, cols, cells })
    }

    /// Every cell holds the same observation.
    pub fn filled(rows: usize, cols: usize, observation: Observation) -> Self {
        Self { rows, cols, cells: vec![observation; rows * cols] }
    }

    /// Build from nested rows; all rows must have equal length.
    pub fn from_rows(rows: Vec<Vec<Observation>>) -> GridResult<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|r| r.len() != n_cols) {
            return Err(GridError::BlockShape { expected: n_cols, got: bad.len() });
        }
        let cells: Vec<Observation> = rows.into_iter().flatten().collect();
        Self::new(n_rows, n_cols, cells)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// # Panics
    /// Panics if the cell is outside the block.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Observation {
        assert!(row < self.rows && col < self.cols, "block cell ({row}, {col}) out of range");
        self.cells[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, observation: Observation) {
        assert!(row < self.rows && col < self.cols, "block cell ({row}, {col}) out of range");
        self.cells[row * self.cols + col] = observation;
    }
}
