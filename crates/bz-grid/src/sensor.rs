//! Sensor model and the per-cell Bayes update.
//!
//! # Update rule
//!
//! With prior `p = P(obstacle)`, true-positive rate `TP` and true-negative
//! rate `TN`:
//!
//! ```text
//!   observed obstacle:      p' = TP·p / (TP·p + (1−TN)·(1−p))
//!   observed free:          p' = (1−TP)·p / ((1−TP)·p + TN·(1−p))
//!   no observation:         p' = p
//! ```
//!
//! The result is clamped to `[PROBABILITY_FLOOR, PROBABILITY_CEILING]`.  A cell
//! that reached exactly 0 or 1 could never be revised again, and with both
//! rates at an extreme the denominators above would vanish.

use crate::{GridError, GridResult};

/// Smallest probability a fused cell may hold.
pub const PROBABILITY_FLOOR: f64 = 1e-6;
/// Largest probability a fused cell may hold.
pub const PROBABILITY_CEILING: f64 = 1.0 - PROBABILITY_FLOOR;

/// One sensor reading for one cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Observation {
    Obstacle,
    NotObstacle,
    /// The cell was not covered by this reading.
    #[default]
    None,
}

impl Observation {
    /// Map a binary sensor hit onto an observation.
    #[inline]
    pub fn from_reading(hit: bool) -> Self {
        if hit { Observation::Obstacle } else { Observation::NotObstacle }
    }
}

impl From<Option<bool>> for Observation {
    fn from(reading: Option<bool>) -> Self {
        reading.map_or(Observation::None, Observation::from_reading)
    }
}

/// Thresholded belief about one cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Classification {
    Obstacle,
    NotObstacle,
    Unknown,
}

/// Sensor accuracy plus the classification thresholds derived from it.
///
/// Invariant: `obstacle_threshold >= not_obstacle_threshold`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SensorModel {
    true_positive:          f64,
    true_negative:          f64,
    obstacle_threshold:     f64,
    not_obstacle_threshold: f64,
}

impl SensorModel {
    /// Validate both rates and derive thresholds.
    ///
    /// The obstacle threshold is `TP` and the free threshold is `1 − TN`; if
    /// that puts them in the wrong order they are swapped.
    pub fn new(true_positive: f64, true_negative: f64) -> GridResult<Self> {
        check_rate("true-positive", true_positive)?;
        check_rate("true-negative", true_negative)?;

        let mut obstacle_threshold = true_positive;
        let mut not_obstacle_threshold = 1.0 - true_negative;
        if obstacle_threshold < not_obstacle_threshold {
            std::mem::swap(&mut obstacle_threshold, &mut not_obstacle_threshold);
        }
        Ok(Self {
            true_positive,
            true_negative,
            obstacle_threshold,
            not_obstacle_threshold,
        })
    }

    #[inline]
    pub fn true_positive(&self) -> f64 {
        self.true_positive
    }

    #[inline]
    pub fn true_negative(&self) -> f64 {
        self.true_negative
    }

    #[inline]
    pub fn obstacle_threshold(&self) -> f64 {
        self.obstacle_threshold
    }

    #[inline]
    pub fn not_obstacle_threshold(&self) -> f64 {
        self.not_obstacle_threshold
    }

    /// Posterior obstacle probability after `observation`, clamped.
    pub fn posterior(&self, prior: f64, observation: Observation) -> f64 {
        let (tp, tn) = (self.true_positive, self.true_negative);
        let (hit, miss) = match observation {
            Observation::None        => return prior,
            Observation::Obstacle    => (tp * prior, (1.0 - tn) * (1.0 - prior)),
            Observation::NotObstacle => ((1.0 - tp) * prior, tn * (1.0 - prior)),
        };
        let denom = hit + miss;
        if denom <= 0.0 {
            return prior;
        }
        (hit / denom).clamp(PROBABILITY_FLOOR, PROBABILITY_CEILING)
    }

    pub fn classify(&self, probability: f64) -> Classification {
        if probability >= self.obstacle_threshold {
            Classification::Obstacle
        } else if probability <= self.not_obstacle_threshold {
            Classification::NotObstacle
        } else {
            Classification::Unknown
        }
    }
}

fn check_rate(what: &'static str, value: f64) -> GridResult<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(GridError::InvalidRate { what, value })
    }
}
