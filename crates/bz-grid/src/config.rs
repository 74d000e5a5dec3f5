//! Grid configuration.

use crate::sensor::SensorModel;
use crate::{GridError, GridResult};

/// Initial belief and sensor rates for an [`OccupancyGridFusion`][crate::OccupancyGridFusion].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GridConfig {
    /// Uniform prior probability that any cell is an obstacle.
    pub prior:         f64,
    pub true_positive: f64,
    pub true_negative: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            prior:         0.7,
            true_positive: 0.97,
            true_negative: 0.9,
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> GridResult<()> {
        if !(self.prior > 0.0 && self.prior < 1.0) {
            return Err(GridError::InvalidPrior(self.prior));
        }
        SensorModel::new(self.true_positive, self.true_negative).map(|_| ())
    }
}
