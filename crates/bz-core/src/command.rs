//! Motion commands sent to the protocol sink.

use crate::UnitId;

/// One unit's order for one tick.
///
/// Produced once per tick per agent, submitted, then dropped.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Command {
    pub unit:             UnitId,
    /// Forward speed as a fraction of maximum, in `[0, 1]`.
    pub speed:            f64,
    /// Angular velocity as a fraction of maximum; sign gives direction.
    pub angular_velocity: f64,
    pub fire:             bool,
}

impl Command {
    /// Stop in place, no turning, no firing.
    pub fn hold(unit: UnitId) -> Self {
        Self {
            unit,
            speed: 0.0,
            angular_velocity: 0.0,
            fire: false,
        }
    }

    #[inline]
    pub fn is_hold(&self) -> bool {
        self.speed == 0.0 && self.angular_velocity == 0.0 && !self.fire
    }
}
