//! `OccupancyGridFusion` — the single writer of the occupancy grid.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::grid::{ObservationBlock, OccupancyGrid};
use crate::sensor::{Classification, Observation, SensorModel};
use crate::{GridConfig, GridResult};

/// Cell totals per classification.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassCounts {
    pub obstacle:     usize,
    pub not_obstacle: usize,
    pub unknown:      usize,
}

struct FusionState {
    grid:  OccupancyGrid,
    model: SensorModel,
}

/// Fuses sensor observations into a shared occupancy grid.
///
/// All methods take `&self`; share it across threads behind an `Arc`.  Every
/// method holds the internal lock for its whole duration, which makes each
/// call atomic with respect to every other.
pub struct OccupancyGridFusion {
    state: Mutex<FusionState>,
}

impl OccupancyGridFusion {
    /// A `rows × cols` grid at the configured uniform prior.
    pub fn new(rows: usize, cols: usize, config: &GridConfig) -> GridResult<Self> {
        config.validate()?;
        let grid = OccupancyGrid::uniform(rows, cols, config.prior)?;
        let model = SensorModel::new(config.true_positive, config.true_negative)?;
        info!(rows, cols, prior = config.prior, "occupancy grid initialised");
        Ok(Self { state: Mutex::new(FusionState { grid, model }) })
    }

    /// Replace the sensor model.  Rejected rates leave the current one in place.
    pub fn set_sensor_model(&self, true_positive: f64, true_negative: f64) -> GridResult<()> {
        let model = SensorModel::new(true_positive, true_negative)?;
        debug!(
            true_positive,
            true_negative,
            obstacle_threshold = model.obstacle_threshold(),
            not_obstacle_threshold = model.not_obstacle_threshold(),
            "sensor model updated"
        );
        self.lock().model = model;
        Ok(())
    }

    pub fn sensor_model(&self) -> SensorModel {
        self.lock().model
    }

    /// Apply one observation to one cell.
    ///
    /// # Panics
    /// Panics if the cell is outside the grid.
    pub fn observe(&self, row: usize, col: usize, observation: Observation) {
        let mut state = self.lock();
        let p = state.model.posterior(state.grid.get(row, col), observation);
        state.grid.set(row, col, p);
    }

    /// Apply `block` with its top-left cell at `(corner_row, corner_col)`.
    ///
    /// The bounds check happens before any cell changes, so a rejected block
    /// leaves the grid untouched.
    ///
    /// # Panics
    /// Panics if any part of the block falls outside the grid.
    pub fn fuse_block(&self, corner_row: usize, corner_col: usize, block: &ObservationBlock) {
        let mut state = self.lock();
        let FusionState { grid, model } = &mut *state;
        assert!(
            corner_row + block.rows() <= grid.rows() && corner_col + block.cols() <= grid.cols(),
            "{}x{} block at ({corner_row}, {corner_col}) exceeds {}x{} grid",
            block.rows(),
            block.cols(),
            grid.rows(),
            grid.cols(),
        );
        for i in 0..block.rows() {
            for j in 0..block.cols() {
                let (r, c) = (corner_row + i, corner_col + j);
                let p = model.posterior(grid.get(r, c), block.get(i, j));
                grid.set(r, c, p);
            }
        }
    }

    pub fn probability(&self, row: usize, col: usize) -> f64 {
        self.lock().grid.get(row, col)
    }

    pub fn classify(&self, row: usize, col: usize) -> Classification {
        let state = self.lock();
        state.model.classify(state.grid.get(row, col))
    }

    pub fn class_counts(&self) -> ClassCounts {
        let state = self.lock();
        let mut counts = ClassCounts::default();
        for &p in state.grid.as_slice() {
            match state.model.classify(p) {
                Classification::Obstacle    => counts.obstacle += 1,
                Classification::NotObstacle => counts.not_obstacle += 1,
                Classification::Unknown     => counts.unknown += 1,
            }
        }
        counts
    }

    /// Copy of the current grid, taken under the lock.
    pub fn snapshot(&self) -> OccupancyGrid {
        self.lock().grid.clone()
    }

    /// Run `f` against the grid while holding the lock.  Keep `f` short.
    pub fn with_grid<R>(&self, f: impl FnOnce(&OccupancyGrid) -> R) -> R {
        f(&self.lock().grid)
    }

    pub fn rows(&self) -> usize {
        self.lock().grid.rows()
    }

    pub fn cols(&self) -> usize {
        self.lock().grid.cols()
    }

    // A panic inside one of our own methods can only come from a bounds
    // assertion that fires before any cell is written, so the state behind a
    // poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, FusionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
