//! Per-game constants reported once by the protocol at connect time.

use crate::{Base, TeamColor};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvConstants {
    /// The color this client plays for.
    pub team:        TeamColor,
    /// Length of a tank; field radii are expressed in multiples of it.
    pub unit_length: f64,
    /// Side length of the square world, centered on the origin.
    pub world_size:  f64,
    /// Our home base, where captured flags are returned.
    pub home_base:   Base,
}

impl EnvConstants {
    /// Half the world side: coordinates lie in `[-half, half]`.
    #[inline]
    pub fn half_world(&self) -> f64 {
        self.world_size * 0.5
    }
}
