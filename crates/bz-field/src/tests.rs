//! Unit tests for bz-field.

use std::f64::consts::PI;

use bz_core::{Base, EnvConstants, Flag, TeamColor, Unit, UnitId, UnitStatus, Vec2, WorldSnapshot};

// ── Helpers ───────────────────────────────────────────────────────────────────

const EPS: f64 = 1e-9;

fn constants() -> EnvConstants {
    EnvConstants {
        team:        TeamColor::Red,
        unit_length: 6.0,
        world_size:  800.0,
        home_base:   Base {
            team:    TeamColor::Red,
            corner1: Vec2::new(-400.0, -400.0),
            corner2: Vec2::new(-350.0, -350.0),
        },
    }
}

fn own(id: u32, x: f64, y: f64) -> Unit {
    Unit {
        id:       UnitId(id),
        team:     TeamColor::Red,
        position: Vec2::new(x, y),
        heading:  0.0,
        status:   UnitStatus::Alive,
        flag:     None,
    }
}

fn enemy(id: u32, x: f64, y: f64) -> Unit {
    Unit { team: TeamColor::Blue, ..own(id, x, y) }
}

fn flag(color: TeamColor, x: f64, y: f64) -> Flag {
    Flag { color, position: Vec2::new(x, y), possessor: None }
}

// ── Field shapes ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod field_tests {
    use rand::rngs::SmallRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::{Attraction, ComposedField, FieldFunction, Repulsion, Tangential};

    fn repulsion() -> Repulsion {
        Repulsion {
            center:       Vec2::new(10.0, -5.0),
            inner_radius: 6.0,
            outer_radius: 30.0,
            exponent:     2.0,
            strength:     1.5,
        }
    }

    #[test]
    fn repulsion_is_zero_beyond_outer_radius() {
        let f = repulsion();
        for d in [30.001, 31.0, 100.0, 1e6] {
            let v = f.evaluate(f.center + Vec2::new(0.0, d));
            assert_eq!(v, Vec2::ZERO, "d = {d}");
        }
    }

    #[test]
    fn repulsion_is_capped_inside_inner_radius() {
        let f = repulsion();
        for d in [0.0, 1e-9, 0.5, 3.0, 5.999, 6.0] {
            let v = f.evaluate(f.center + Vec2::new(d, 0.0));
            assert!((v.length() - f.strength).abs() < EPS, "d = {d}, |v| = {}", v.length());
        }
    }

    #[test]
    fn repulsion_points_away_from_center() {
        let f = repulsion();
        let p = f.center + Vec2::new(-10.0, 0.0);
        let v = f.evaluate(p);
        assert!(v.x < 0.0);
        assert!(v.y.abs() < EPS);
    }

    #[test]
    fn repulsion_magnitude_non_increasing_in_distance() {
        let f = repulsion();
        let mut prev = f64::INFINITY;
        let mut d = 0.0;
        while d < 50.0 {
            let m = f.evaluate(f.center + Vec2::new(d * 0.6, d * 0.8)).length();
            assert!(m <= prev + EPS, "magnitude rose at d = {d}: {prev} -> {m}");
            prev = m;
            d += 0.05;
        }
    }

    #[test]
    fn tangential_is_perpendicular_to_radius() {
        let f = Tangential {
            center:       Vec2::ZERO,
            inner_radius: 6.0,
            outer_radius: 80.0,
            exponent:     1.0,
            strength:     1.0,
        };
        let p = Vec2::new(20.0, 0.0);
        let v = f.evaluate(p);
        assert!(v.x.abs() < EPS);
        assert!(v.y > 0.0, "counter-clockwise orbit expected");
        assert!((v.length() - 6.0 / 20.0).abs() < EPS);
        assert_eq!(f.evaluate(Vec2::new(100.0, 0.0)), Vec2::ZERO);
    }

    #[test]
    fn attraction_zero_inside_radius_full_outside_slow_zone() {
        let f = Attraction {
            target:   Vec2::new(100.0, 100.0),
            radius:   2.0,
            spread:   20.0,
            exponent: 2.0,
            strength: 1.0,
        };
        assert_eq!(f.evaluate(Vec2::new(101.0, 100.0)), Vec2::ZERO);

        let far = f.evaluate(Vec2::new(0.0, 100.0));
        assert!((far.length() - 1.0).abs() < EPS);
        assert!(far.x > 0.0);

        // Halfway through the slow zone: 1 - (1 - 0.5)^2 = 0.75.
        let mid = f.evaluate(Vec2::new(100.0 - 12.0, 100.0));
        assert!((mid.length() - 0.75).abs() < EPS, "got {}", mid.length());
    }

    #[test]
    fn higher_exponent_pulls_harder_in_slow_zone() {
        let mk = |exponent| Attraction {
            target: Vec2::ZERO,
            radius: 0.0,
            spread: 20.0,
            exponent,
            strength: 1.0,
        };
        let p = Vec2::new(5.0, 0.0);
        assert!(mk(3.0).evaluate(p).length() > mk(2.0).evaluate(p).length());
    }

    #[test]
    fn composition_is_order_independent() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut fields: Vec<FieldFunction> = Vec::new();
        for i in 0..24 {
            let c = Vec2::new(rng.gen_range(-200.0..200.0), rng.gen_range(-200.0..200.0));
            let inner = rng.gen_range(1.0..10.0);
            let outer = inner + rng.gen_range(1.0..150.0);
            let exponent = rng.gen_range(0.5..3.0);
            let f: FieldFunction = match i % 3 {
                0 => Repulsion { center: c, inner_radius: inner, outer_radius: outer, exponent, strength: 1.0 }.into(),
                1 => Tangential { center: c, inner_radius: inner, outer_radius: outer, exponent, strength: 1.0 }.into(),
                _ => Attraction { target: c, radius: inner, spread: outer, exponent, strength: 1.0 }.into(),
            };
            fields.push(f);
        }

        let points: Vec<Vec2> = (0..20)
            .map(|_| Vec2::new(rng.gen_range(-250.0..250.0), rng.gen_range(-250.0..250.0)))
            .collect();
        let reference: ComposedField = fields.iter().copied().collect();

        for _ in 0..10 {
            fields.shuffle(&mut rng);
            let shuffled: ComposedField = fields.iter().copied().collect();
            for &p in &points {
                let a = reference.evaluate(p);
                let b = shuffled.evaluate(p);
                assert!((a - b).length() < 1e-9, "order changed result at {p}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn composition_equals_sum_of_parts() {
        let a: FieldFunction = repulsion().into();
        let b: FieldFunction = Attraction {
            target: Vec2::new(50.0, 0.0), radius: 1.0, spread: 5.0, exponent: 2.0, strength: 1.0,
        }.into();
        let mut composed = ComposedField::new();
        composed.push(a);
        composed.push(b);
        let p = Vec2::new(12.0, -3.0);
        let expected = a.evaluate(p) + b.evaluate(p);
        assert!((composed.evaluate(p) - expected).length() < EPS);
        assert_eq!(ComposedField::new().evaluate(p), Vec2::ZERO);
    }
}

// ── normalize_angle ───────────────────────────────────────────────────────────

#[cfg(test)]
mod angle_tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use crate::normalize_angle;

    use super::PI;

    #[test]
    fn boundary_values() {
        assert_eq!(normalize_angle(0.0), 0.0);
        assert_eq!(normalize_angle(PI), PI);
        assert_eq!(normalize_angle(-PI), PI);
        // 3π lands on the ±π seam; rounding may put it on either side.
        let seam = normalize_angle(3.0 * PI);
        assert!(seam > -PI && seam <= PI && seam.abs() > PI - 1e-9);
        assert!((normalize_angle(1.5 * PI) + 0.5 * PI).abs() < 1e-12);
        assert!((normalize_angle(-1.5 * PI) - 0.5 * PI).abs() < 1e-12);
    }

    #[test]
    fn range_and_idempotence() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..10_000 {
            let theta: f64 = rng.gen_range(-1e6..1e6);
            let n = normalize_angle(theta);
            assert!(n > -PI && n <= PI, "{theta} -> {n}");
            assert_eq!(normalize_angle(n), n, "not idempotent at {theta}");
        }
    }

    #[test]
    fn preserves_direction() {
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..1_000 {
            let theta: f64 = rng.gen_range(-100.0..100.0);
            let n = normalize_angle(theta);
            assert!((n.sin() - theta.sin()).abs() < 1e-9);
            assert!((n.cos() - theta.cos()).abs() < 1e-9);
        }
    }
}

// ── Goal selection ────────────────────────────────────────────────────────────

#[cfg(test)]
mod goal_tests {
    use super::*;
    use crate::{Goal, GoalSelector, nearest_flag};

    fn selector() -> GoalSelector {
        let c = constants();
        GoalSelector::new(c.team, c.home_base.center())
    }

    #[test]
    fn picks_nearest_enemy_flag() {
        let me = own(0, 0.0, 0.0);
        let snap = WorldSnapshot {
            own_units: vec![me.clone()],
            flags: vec![
                flag(TeamColor::Red, -375.0, -375.0),
                flag(TeamColor::Blue, 50.0, 0.0),
                flag(TeamColor::Green, 0.0, 30.0),
            ],
            ..Default::default()
        };
        assert_eq!(
            selector().select(&me, &snap),
            Goal::CaptureFlag { color: TeamColor::Green, position: Vec2::new(0.0, 30.0) },
        );
    }

    #[test]
    fn carrier_returns_home() {
        let mut me = own(0, 100.0, 100.0);
        me.flag = Some(TeamColor::Blue);
        let snap = WorldSnapshot {
            own_units: vec![me.clone()],
            flags: vec![flag(TeamColor::Green, 101.0, 100.0)],
            ..Default::default()
        };
        assert_eq!(
            selector().select(&me, &snap),
            Goal::ReturnHome { position: Vec2::new(-375.0, -375.0) },
        );
    }

    #[test]
    fn flag_carried_by_teammate_is_not_a_goal() {
        let me = own(0, 0.0, 0.0);
        let mut mate = own(1, 200.0, 0.0);
        mate.flag = Some(TeamColor::Green);
        let snap = WorldSnapshot {
            own_units: vec![me.clone(), mate],
            flags: vec![flag(TeamColor::Green, 10.0, 0.0), flag(TeamColor::Blue, 90.0, 0.0)],
            ..Default::default()
        };
        assert_eq!(
            selector().select(&me, &snap),
            Goal::CaptureFlag { color: TeamColor::Blue, position: Vec2::new(90.0, 0.0) },
        );
    }

    #[test]
    fn closer_thief_is_intercepted() {
        let me = own(0, 0.0, 0.0);
        let mut thief = enemy(3, 20.0, 0.0);
        thief.flag = Some(TeamColor::Red);
        let snap = WorldSnapshot {
            own_units:   vec![me.clone()],
            enemy_units: vec![enemy(0, 300.0, 300.0), thief],
            flags:       vec![flag(TeamColor::Blue, 80.0, 0.0)],
            ..Default::default()
        };
        assert_eq!(
            selector().select(&me, &snap),
            Goal::Intercept { enemy: UnitId(3), position: Vec2::new(20.0, 0.0) },
        );
    }

    #[test]
    fn closer_flag_beats_thief() {
        let me = own(0, 0.0, 0.0);
        let mut thief = enemy(3, 120.0, 0.0);
        thief.flag = Some(TeamColor::Red);
        let snap = WorldSnapshot {
            own_units:   vec![me.clone()],
            enemy_units: vec![thief],
            flags:       vec![flag(TeamColor::Blue, 80.0, 0.0)],
            ..Default::default()
        };
        assert!(matches!(selector().select(&me, &snap), Goal::CaptureFlag { color: TeamColor::Blue, .. }));
    }

    #[test]
    fn thief_is_chased_when_no_flag_remains() {
        let me = own(0, 0.0, 0.0);
        let mut thief = enemy(1, 500.0, 0.0);
        thief.flag = Some(TeamColor::Red);
        let snap = WorldSnapshot {
            own_units:   vec![me.clone()],
            enemy_units: vec![thief],
            flags:       vec![flag(TeamColor::Red, 500.0, 0.0)],
            ..Default::default()
        };
        assert!(matches!(selector().select(&me, &snap), Goal::Intercept { enemy: UnitId(1), .. }));
    }

    #[test]
    fn nothing_left_yields_none() {
        let me = own(0, 0.0, 0.0);
        let snap = WorldSnapshot {
            own_units: vec![me.clone()],
            flags:     vec![flag(TeamColor::Red, 0.0, 0.0)],
            ..Default::default()
        };
        assert_eq!(selector().select(&me, &snap), Goal::None);
    }

    #[test]
    fn nearest_flag_tie_goes_to_first() {
        let flags = [
            flag(TeamColor::Blue, 10.0, 0.0),
            flag(TeamColor::Green, 0.0, 10.0),
            flag(TeamColor::Purple, -10.0, 0.0),
        ];
        let chosen = nearest_flag(&flags, Vec2::ZERO, &[]).unwrap();
        assert_eq!(chosen.color, TeamColor::Blue);
        let chosen = nearest_flag(&flags, Vec2::ZERO, &[TeamColor::Blue]).unwrap();
        assert_eq!(chosen.color, TeamColor::Green);
        assert!(nearest_flag(&[], Vec2::ZERO, &[]).is_none());
    }
}

// ── Planner ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod planner_tests {
    use bz_core::{Command, Shot};

    use super::*;
    use crate::{FieldFunction, Goal, PlannerConfig, PotentialFieldPlanner};

    fn planner() -> PotentialFieldPlanner {
        PotentialFieldPlanner::new(constants(), PlannerConfig::default()).unwrap()
    }

    #[test]
    fn turns_toward_goal_with_gain_two() {
        let me = own(0, 0.0, 0.0);
        let snap = WorldSnapshot {
            own_units: vec![me],
            flags:     vec![flag(TeamColor::Blue, 0.0, 100.0)],
            ..Default::default()
        };
        let cmd = planner().plan(UnitId(0), &snap);
        assert_eq!(cmd.unit, UnitId(0));
        assert_eq!(cmd.speed, 1.0);
        assert!(cmd.fire);
        assert!((cmd.angular_velocity - PI).abs() < 1e-9, "got {}", cmd.angular_velocity);
    }

    #[test]
    fn heading_error_wraps_the_short_way() {
        let mut me = own(0, 0.0, 0.0);
        me.heading = 0.9 * PI;
        let snap = WorldSnapshot {
            own_units: vec![me],
            // Goal straight down: -π/2.  Raw error -1.4π wraps to +0.6π.
            flags: vec![flag(TeamColor::Blue, 0.0, -100.0)],
            ..Default::default()
        };
        let cmd = planner().plan(UnitId(0), &snap);
        assert!((cmd.angular_velocity - 2.0 * 0.6 * PI).abs() < 1e-9);
    }

    #[test]
    fn builds_one_field_per_source() {
        let me = own(0, 0.0, 0.0);
        let mut carrier = own(1, 40.0, 40.0);
        carrier.flag = Some(TeamColor::Green);
        let mut corpse = enemy(1, 5.0, 5.0);
        corpse.status = UnitStatus::Dead;
        let snap = WorldSnapshot {
            own_units:   vec![me, carrier],
            enemy_units: vec![enemy(0, 10.0, 0.0), corpse],
            shots:       vec![
                Shot { position: Vec2::new(3.0, 3.0), velocity: Vec2::ZERO },
                Shot { position: Vec2::new(-3.0, 3.0), velocity: Vec2::ZERO },
            ],
            flags: vec![flag(TeamColor::Blue, 0.0, 100.0)],
            ..Default::default()
        };
        let plan = planner().plan_detailed(UnitId(0), &snap);
        let fields = plan.field.fields();
        let count = |pred: fn(&FieldFunction) -> bool| fields.iter().filter(|f| pred(f)).count();
        assert_eq!(count(|f| matches!(f, FieldFunction::Repulsion(_))), 3);
        assert_eq!(count(|f| matches!(f, FieldFunction::Tangential(_))), 1);
        assert_eq!(count(|f| matches!(f, FieldFunction::Attraction(_))), 1);
        assert!((plan.steering - plan.field.evaluate(Vec2::ZERO)).length() < 1e-12);
    }

    #[test]
    fn enemy_pushes_unit_off_course() {
        let me = own(0, 0.0, 0.0);
        let base = WorldSnapshot {
            own_units: vec![me],
            flags:     vec![flag(TeamColor::Blue, 200.0, 0.0)],
            ..Default::default()
        };
        let clear = planner().plan(UnitId(0), &base);
        assert!(clear.angular_velocity.abs() < 1e-9);

        let threatened = WorldSnapshot {
            enemy_units: vec![enemy(0, 6.0, -6.0)],
            ..base
        };
        let cmd = planner().plan(UnitId(0), &threatened);
        assert!(cmd.angular_velocity > 0.0, "enemy below-right should steer us left");
    }

    #[test]
    fn degenerate_cases_hold() {
        let snap = WorldSnapshot {
            own_units: vec![own(0, 0.0, 0.0)],
            ..Default::default()
        };
        let plan = planner().plan_detailed(UnitId(0), &snap);
        assert_eq!(plan.goal, Goal::None);
        assert_eq!(plan.command, Command::hold(UnitId(0)));

        assert!(planner().plan(UnitId(5), &snap).is_hold());

        let mut dead = own(0, 0.0, 0.0);
        dead.status = UnitStatus::Dead;
        let snap = WorldSnapshot {
            own_units: vec![dead],
            flags:     vec![flag(TeamColor::Blue, 10.0, 0.0)],
            ..Default::default()
        };
        assert!(planner().plan(UnitId(0), &snap).is_hold());
    }

    #[test]
    fn cancelled_field_still_drives_and_fires() {
        // Inside the capture radius the field is zero; the unit keeps moving
        // and turns toward heading 0.
        let mut me = own(0, 0.0, 0.0);
        me.heading = 0.5;
        let snap = WorldSnapshot {
            own_units: vec![me],
            flags:     vec![flag(TeamColor::Blue, 1.0, 0.0)],
            ..Default::default()
        };
        let plan = planner().plan_detailed(UnitId(0), &snap);
        assert_eq!(plan.steering, Vec2::ZERO);
        assert!(!plan.command.is_hold());
        assert_eq!(plan.command.speed, 1.0);
        assert!(plan.command.fire);
        assert!((plan.command.angular_velocity + 1.0).abs() < 1e-12);
    }

    #[test]
    fn radii_follow_unit_length() {
        let constants = EnvConstants { unit_length: 10.0, ..constants() };
        let planner = PotentialFieldPlanner::new(constants, PlannerConfig::default()).unwrap();

        let me = own(0, 0.0, 0.0);
        let mut carrier = own(1, 300.0, 300.0);
        carrier.flag = Some(TeamColor::Green);
        let mut thief = enemy(0, 100.0, 0.0);
        thief.flag = Some(TeamColor::Red);
        let snap = WorldSnapshot {
            own_units:   vec![me.clone(), carrier],
            enemy_units: vec![thief],
            ..Default::default()
        };
        let goal = Goal::Intercept { enemy: UnitId(0), position: Vec2::new(100.0, 0.0) };
        let field = planner.compose(&me, &snap, &goal);

        let attraction = field.fields().iter().find_map(|f| match f {
            FieldFunction::Attraction(a) => Some(*a),
            _ => None,
        });
        assert_eq!(attraction.map(|a| a.radius), Some(10.0));

        let orbit = field.fields().iter().find_map(|f| match f {
            FieldFunction::Tangential(t) => Some(*t),
            _ => None,
        });
        let orbit = orbit.unwrap();
        assert_eq!((orbit.inner_radius, orbit.outer_radius), (10.0, 80.0));

        let enemy_repulsion = field.fields().iter().find_map(|f| match f {
            FieldFunction::Repulsion(r) => Some(*r),
            _ => None,
        });
        assert_eq!(enemy_repulsion.map(|r| r.outer_radius), Some(50.0));
    }

    #[test]
    fn orbit_inside_unit_length_rejected() {
        let constants = EnvConstants { unit_length: 100.0, ..constants() };
        let result = PotentialFieldPlanner::new(constants, PlannerConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn invalid_config_rejected() {
        let mut cfg = PlannerConfig::default();
        cfg.enemy.outer_units = cfg.enemy.inner_units;
        assert!(PotentialFieldPlanner::new(constants(), cfg).is_err());

        let mut cfg = PlannerConfig::default();
        cfg.capture.spread = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = PlannerConfig::default();
        cfg.speed = 1.5;
        assert!(cfg.validate().is_err());

        assert!(PlannerConfig::default().validate().is_ok());
    }
}
