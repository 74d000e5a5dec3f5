//! The potential-field planner: snapshot in, command out.

use tracing::debug;

use bz_core::{Command, EnvConstants, Unit, UnitId, Vec2, WorldSnapshot};

use crate::config::{AttractionParams, RadialParams};
use crate::{
    normalize_angle, Attraction, ComposedField, FieldResult, Goal, GoalSelector,
    PlannerConfig, Repulsion, Tangential,
};

/// Everything the planner decided for one unit on one tick.
///
/// [`PotentialFieldPlanner::plan`] returns only the command; the full record
/// is for callers that also want to visualize the field or log the goal.
#[derive(Clone, Debug)]
pub struct Plan {
    pub command:  Command,
    pub goal:     Goal,
    pub field:    ComposedField,
    /// The composed field evaluated at the unit's position.
    pub steering: Vec2,
}

/// Stateless per-tick planner shared by every agent of a team.
#[derive(Clone, Debug)]
pub struct PotentialFieldPlanner {
    constants: EnvConstants,
    config:    PlannerConfig,
    selector:  GoalSelector,
}

impl PotentialFieldPlanner {
    /// Validate `config` and build a planner for the team in `constants`.
    pub fn new(constants: EnvConstants, config: PlannerConfig) -> FieldResult<Self> {
        config.validate()?;
        config.carrier_orbit.radii(constants.unit_length)?;
        let selector = GoalSelector::new(constants.team, constants.home_base.center());
        Ok(Self { constants, config, selector })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn constants(&self) -> &EnvConstants {
        &self.constants
    }

    /// The command for `unit` this tick.
    pub fn plan(&self, unit: UnitId, snapshot: &WorldSnapshot) -> Command {
        self.plan_detailed(unit, snapshot).command
    }

    /// Like [`plan`][Self::plan] but keeps the goal and field.
    ///
    /// A unit that is dead, missing from the snapshot, or has no goal gets
    /// [`Command::hold`] and an empty field.
    pub fn plan_detailed(&self, id: UnitId, snapshot: &WorldSnapshot) -> Plan {
        let hold = |goal| Plan {
            command:  Command::hold(id),
            goal,
            field:    ComposedField::new(),
            steering: Vec2::ZERO,
        };

        let Some(unit) = snapshot.own_unit(id).filter(|u| u.is_alive()) else {
            debug!(%id, tick = snapshot.tick, "unit absent or dead; holding");
            return hold(Goal::None);
        };

        let goal = self.selector.select(unit, snapshot);
        if goal == Goal::None {
            debug!(%id, tick = snapshot.tick, "no goal available; holding");
            return hold(goal);
        }

        let field = self.compose(unit, snapshot, &goal);
        let steering = field.evaluate(unit.position);
        let command = self.steer(unit, steering);
        debug!(
            %id,
            tick = snapshot.tick,
            ?goal,
            fields = field.len(),
            angular_velocity = command.angular_velocity,
            "planned"
        );
        Plan { command, goal, field, steering }
    }

    /// Build the bag of fields acting on `unit` for the given goal.
    pub fn compose(&self, unit: &Unit, snapshot: &WorldSnapshot, goal: &Goal) -> ComposedField {
        let len = self.constants.unit_length;
        let mut field = ComposedField::new();

        for enemy in snapshot.living_enemies() {
            field.push(repulsion(enemy.position, &self.config.enemy, len));
        }
        for shot in &snapshot.shots {
            field.push(repulsion(shot.position, &self.config.shot, len));
        }
        for mate in snapshot.own_units.iter().filter(|u| u.id != unit.id && u.carries_flag()) {
            let p = &self.config.carrier_orbit;
            let inner = p.inner_units * len;
            field.push(Tangential {
                center:       mate.position,
                inner_radius: inner,
                outer_radius: p.outer_radius,
                exponent:     p.exponent,
                strength:     p.strength,
            });
        }

        let params = match goal {
            Goal::ReturnHome { .. }  => Some(&self.config.return_home),
            Goal::Intercept { .. }   => Some(&self.config.intercept),
            Goal::CaptureFlag { .. } => Some(&self.config.capture),
            Goal::None               => None,
        };
        if let (Some(target), Some(p)) = (goal.position(), params) {
            field.push(attraction(target, p, len));
        }
        field
    }

    /// Turn a steering vector into a command for `unit`.
    ///
    /// Forward motion and fire are always requested.  A zero vector (every
    /// field cancelled out) has heading 0, so the unit turns toward +x.
    pub fn steer(&self, unit: &Unit, steering: Vec2) -> Command {
        let error = normalize_angle(steering.angle() - unit.heading);
        Command {
            unit:             unit.id,
            speed:            self.config.speed,
            angular_velocity: self.config.angular_gain * error,
            fire:             true,
        }
    }
}

fn repulsion(center: Vec2, p: &RadialParams, unit_length: f64) -> Repulsion {
    Repulsion {
        center,
        inner_radius: p.inner_units * unit_length,
        outer_radius: p.outer_units * unit_length,
        exponent:     p.exponent,
        strength:     p.strength,
    }
}

fn attraction(target: Vec2, p: &AttractionParams, unit_length: f64) -> Attraction {
    Attraction {
        target,
        radius:   p.arrival_radius(unit_length),
        spread:   p.spread,
        exponent: p.exponent,
        strength: p.strength,
    }
}
