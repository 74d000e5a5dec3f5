//! Strongly typed unit identifier.
//!
//! The protocol addresses units by their zero-based index within the team,
//! so the inner integer doubles as a `Vec` index via `.index()`.

use std::fmt;

/// Index of a unit within its own team.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitId(pub u32);

impl UnitId {
    /// Sentinel meaning "no valid unit", equal to `u32::MAX`.
    pub const INVALID: UnitId = UnitId(u32::MAX);

    /// Cast to `usize` for direct use as a `Vec` index.
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Default for UnitId {
    /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
    #[inline(always)]
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitId({})", self.0)
    }
}

impl From<UnitId> for usize {
    #[inline(always)]
    fn from(id: UnitId) -> usize {
        id.0 as usize
    }
}

impl TryFrom<usize> for UnitId {
    type Error = std::num::TryFromIntError;
    fn try_from(n: usize) -> Result<UnitId, Self::Error> {
        u32::try_from(n).map(UnitId)
    }
}
