//! Goal selection.
//!
//! The policy is a pure function of the current snapshot, re-evaluated every
//! tick with no memory of the previous choice:
//!
//! 1. Carrying a flag → go home (base center).
//! 2. An enemy carries our flag → chase it, unless an uncaptured enemy flag is
//!    strictly closer, in which case go for the flag.
//! 3. Otherwise → nearest uncaptured enemy flag.
//!
//! "Uncaptured" excludes any flag a teammate is already carrying.

use bz_core::{Flag, TeamColor, Unit, UnitId, Vec2, WorldSnapshot};

/// What the attraction field should pull toward this tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Goal {
    ReturnHome { position: Vec2 },
    Intercept { enemy: UnitId, position: Vec2 },
    CaptureFlag { color: TeamColor, position: Vec2 },
    /// Nothing worth pursuing; the planner holds position.
    None,
}

impl Goal {
    pub fn position(&self) -> Option<Vec2> {
        match *self {
            Goal::ReturnHome { position }
            | Goal::Intercept { position, .. }
            | Goal::CaptureFlag { position, .. } => Some(position),
            Goal::None => None,
        }
    }
}

/// Nearest flag to `from`, skipping colors in `excluded`.
///
/// Ties go to the first flag in iteration order.
pub fn nearest_flag<'a>(
    flags:    impl IntoIterator<Item = &'a Flag>,
    from:     Vec2,
    excluded: &[TeamColor],
) -> Option<&'a Flag> {
    let mut best: Option<(&Flag, f64)> = None;
    for flag in flags {
        if excluded.contains(&flag.color) {
            continue;
        }
        let d = from.distance(flag.position);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((flag, d)),
        }
    }
    best.map(|(f, _)| f)
}

/// Picks the current goal for one of our units.
#[derive(Clone, Debug)]
pub struct GoalSelector {
    team: TeamColor,
    home: Vec2,
}

impl GoalSelector {
    pub fn new(team: TeamColor, home: Vec2) -> Self {
        Self { team, home }
    }

    pub fn select(&self, unit: &Unit, snapshot: &WorldSnapshot) -> Goal {
        if unit.carries_flag() {
            return Goal::ReturnHome { position: self.home };
        }

        let carried_by_teammates = carried_by_teammates(unit, snapshot);
        let flag = nearest_flag(
            snapshot.enemy_flags(self.team),
            unit.position,
            &carried_by_teammates,
        );
        let flag_goal = flag.map(|f| Goal::CaptureFlag { color: f.color, position: f.position });

        let thief = snapshot
            .living_enemies()
            .find(|e| e.flag == Some(self.team));

        match (thief, flag_goal) {
            (None, Some(goal)) => goal,
            (None, None) => Goal::None,
            (Some(enemy), None) => Goal::Intercept { enemy: enemy.id, position: enemy.position },
            (Some(enemy), Some(goal)) => {
                let to_enemy = unit.position.distance(enemy.position);
                let to_flag = goal.position().map_or(f64::INFINITY, |p| unit.position.distance(p));
                if to_enemy < to_flag {
                    Goal::Intercept { enemy: enemy.id, position: enemy.position }
                } else {
                    goal
                }
            }
        }
    }
}

/// Flag colors currently held by our other units.
fn carried_by_teammates(unit: &Unit, snapshot: &WorldSnapshot) -> Vec<TeamColor> {
    snapshot
        .own_units
        .iter()
        .filter(|u| u.id != unit.id)
        .filter_map(|u| u.flag)
        .collect()
}
