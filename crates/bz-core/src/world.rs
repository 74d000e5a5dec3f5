//! The world snapshot handed to every agent each tick.
//!
//! # Ownership
//!
//! A `WorldSnapshot` is produced once per tick by the team coordinator and is
//! immutable afterwards.  The coordinator wraps it in an `Arc` and hands the
//! same instance to every agent, so all agents observe identical content for
//! a given tick.

use std::time::Duration;

use crate::{TeamColor, UnitId, Vec2};

// ── Unit ──────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum UnitStatus {
    #[default]
    Alive,
    Dead,
}

/// One tank, ours or an enemy's.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Unit {
    /// Index of the unit within its own team.
    pub id:       UnitId,
    pub team:     TeamColor,
    pub position: Vec2,
    /// Heading in radians, counter-clockwise from the +x axis.
    pub heading:  f64,
    pub status:   UnitStatus,
    /// Color of the flag this unit is carrying, if any.
    pub flag:     Option<TeamColor>,
}

impl Unit {
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.status == UnitStatus::Alive
    }

    #[inline]
    pub fn carries_flag(&self) -> bool {
        self.flag.is_some()
    }
}

// ── Flag / Shot / Base ────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Flag {
    /// The team that owns the flag.
    pub color:     TeamColor,
    pub position:  Vec2,
    /// Team currently holding the flag, if it has been picked up.
    pub possessor: Option<TeamColor>,
}

/// A shot in flight.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shot {
    pub position: Vec2,
    pub velocity: Vec2,
}

/// An axis-aligned team base defined by two opposite corners.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Base {
    pub team:    TeamColor,
    pub corner1: Vec2,
    pub corner2: Vec2,
}

impl Base {
    /// Midpoint of the two defining corners.
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.corner1.midpoint(self.corner2)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        let (lo_x, hi_x) = min_max(self.corner1.x, self.corner2.x);
        let (lo_y, hi_y) = min_max(self.corner1.y, self.corner2.y);
        (lo_x..=hi_x).contains(&p.x) && (lo_y..=hi_y).contains(&p.y)
    }
}

fn min_max(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

// ── WorldSnapshot ─────────────────────────────────────────────────────────────

/// Everything an agent can perceive for one tick.
///
/// All lists keep the order the protocol reported them in; goal selection
/// relies on that order for deterministic tie-breaking.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldSnapshot {
    /// Poll counter, stamped by the coordinator.  Starts at 1.
    pub tick:        u64,
    /// Wall time since the previous poll, stamped by the coordinator.
    pub elapsed:     Duration,
    pub own_units:   Vec<Unit>,
    pub enemy_units: Vec<Unit>,
    pub shots:       Vec<Shot>,
    /// Every flag in the world, ours included.
    pub flags:       Vec<Flag>,
}

impl WorldSnapshot {
    /// Look up one of our own units by id.
    pub fn own_unit(&self, id: UnitId) -> Option<&Unit> {
        // Protocols report units in index order; fall back to a scan otherwise.
        match self.own_units.get(id.index()) {
            Some(u) if u.id == id => Some(u),
            _ => self.own_units.iter().find(|u| u.id == id),
        }
    }

    /// Flags not owned by `team`, in reported order.
    pub fn enemy_flags(&self, team: TeamColor) -> impl Iterator<Item = &Flag> + '_ {
        self.flags.iter().filter(move |f| f.color != team)
    }

    /// The flag owned by `team`, if present.
    pub fn flag_of(&self, team: TeamColor) -> Option<&Flag> {
        self.flags.iter().find(|f| f.color == team)
    }

    pub fn living_enemies(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.enemy_units.iter().filter(|u| u.is_alive())
    }
}
