//! A self-contained capture-the-flag world that speaks [`Protocol`].
//!
//! The world advances one step each time it is polled.  Our units follow the
//! last command submitted for them; every other team's units wander and fire
//! at random.  Flags are picked up by touching them and captured by carrying
//! them into the home base.

use std::f64::consts::PI;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use bz_core::{
    Base, Command, EnvConstants, Flag, Shot, TeamColor, Unit, UnitId, UnitStatus, Vec2,
    WorldSnapshot,
};
use bz_field::normalize_angle;
use bz_team::{Protocol, ProtocolError, ProtocolResult};

use crate::config::ArenaSettings;

/// Base side length, in unit lengths.
const BASE_UNITS: f64 = 8.0;

/// Touch distance for flags, in unit lengths.
const REACH_UNITS: f64 = 2.0;

/// Fraction of `max_speed` enemies wander at.
const ENEMY_PACE: f64 = 0.6;

// ── Geometry helpers ──────────────────────────────────────────────────────────

/// Each color owns one corner of the world.
fn quadrant(color: TeamColor) -> (f64, f64) {
    match color {
        TeamColor::Red    => (-1.0, -1.0),
        TeamColor::Green  => (1.0, -1.0),
        TeamColor::Blue   => (1.0, 1.0),
        TeamColor::Purple => (-1.0, 1.0),
    }
}

pub fn base_for(color: TeamColor, half: f64, side: f64) -> Base {
    let (sx, sy) = quadrant(color);
    Base {
        team:    color,
        corner1: Vec2::new(sx * half, sy * half),
        corner2: Vec2::new(sx * (half - side), sy * (half - side)),
    }
}

fn heading_vector(heading: f64) -> Vec2 {
    Vec2::new(heading.cos(), heading.sin())
}

fn clamp_to_world(p: Vec2, half: f64) -> Vec2 {
    Vec2::new(p.x.clamp(-half, half), p.y.clamp(-half, half))
}

fn inside_world(p: Vec2, half: f64) -> bool {
    p.x.abs() <= half && p.y.abs() <= half
}

// ── Obstacles ─────────────────────────────────────────────────────────────────

/// Ground-truth obstacle cells, row-major with row 0 at `y = -half`.
#[derive(Clone, Debug)]
pub struct ObstacleMap {
    cells:     usize,
    cell_size: f64,
    half:      f64,
    occupied:  Vec<bool>,
}

impl ObstacleMap {
    /// Scatter `count` rectangular blocks of 1–4 cells per side.
    pub fn random(settings: &ArenaSettings, rng: &mut SmallRng) -> Self {
        let cells = settings.grid_cells();
        let mut occupied = vec![false; cells * cells];
        for _ in 0..settings.obstacle_count {
            let h = rng.gen_range(1..=4).min(cells);
            let w = rng.gen_range(1..=4).min(cells);
            let r0 = rng.gen_range(0..=cells - h);
            let c0 = rng.gen_range(0..=cells - w);
            for r in r0..r0 + h {
                occupied[r * cells + c0..r * cells + c0 + w].fill(true);
            }
        }
        Self {
            cells,
            cell_size: settings.cell_size,
            half: settings.world_size * 0.5,
            occupied,
        }
    }

    pub fn cells(&self) -> usize {
        self.cells
    }

    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.occupied[row * self.cells + col]
    }

    /// The cell containing `p`, clamped onto the map.
    pub fn cell_of(&self, p: Vec2) -> (usize, usize) {
        let to_cell = |v: f64| {
            let i = ((v + self.half) / self.cell_size).floor();
            (i.max(0.0) as usize).min(self.cells - 1)
        };
        (to_cell(p.y), to_cell(p.x))
    }

    pub fn obstacle_cells(&self) -> usize {
        self.occupied.iter().filter(|&&o| o).count()
    }
}

// ── World state ───────────────────────────────────────────────────────────────

struct Body {
    unit:       Unit,
    /// Steps until a dead unit respawns.
    respawn_in: u32,
    spawn:      Vec2,
}

struct World {
    rng:      SmallRng,
    step:     u64,
    ours:     Vec<Body>,
    enemies:  Vec<Body>,
    flags:    Vec<(Flag, Vec2)>,
    shots:    Vec<(Shot, u32)>,
    /// Latest command per own unit, indexed by `UnitId`.
    orders:   Vec<Command>,
    captures: u32,
    closed:   bool,
}

/// Local stand-in for a game server.
pub struct LocalArena {
    settings:  ArenaSettings,
    constants: EnvConstants,
    obstacles: Arc<ObstacleMap>,
    world:     Mutex<World>,
}

impl LocalArena {
    pub fn new(settings: ArenaSettings) -> Result<Self> {
        settings.validate()?;
        let mut rng = SmallRng::seed_from_u64(settings.seed);
        let half = settings.world_size * 0.5;
        let side = BASE_UNITS * settings.unit_length;
        let home_base = base_for(settings.team, half, side);

        let spawn_row = |color: TeamColor, i: u32| {
            let center = base_for(color, half, side).center();
            let (sx, _) = quadrant(color);
            center + Vec2::new(-sx * settings.unit_length * 2.0 * i as f64, 0.0)
        };

        let ours: Vec<Body> = (0..settings.units_per_team)
            .map(|i| {
                let spawn = clamp_to_world(spawn_row(settings.team, i), half);
                Body {
                    unit: Unit {
                        id:       UnitId(i),
                        team:     settings.team,
                        position: spawn,
                        heading:  0.0,
                        status:   UnitStatus::Alive,
                        flag:     None,
                    },
                    respawn_in: 0,
                    spawn,
                }
            })
            .collect();

        let mut enemies = Vec::new();
        for color in TeamColor::ALL.into_iter().filter(|&c| c != settings.team) {
            for i in 0..settings.enemies_per_team {
                let spawn = clamp_to_world(spawn_row(color, i), half);
                enemies.push(Body {
                    unit: Unit {
                        id:       UnitId(i),
                        team:     color,
                        position: spawn,
                        heading:  rng.gen_range(-PI..PI),
                        status:   UnitStatus::Alive,
                        flag:     None,
                    },
                    respawn_in: 0,
                    spawn,
                });
            }
        }

        let flags = TeamColor::ALL
            .into_iter()
            .map(|color| {
                let home = base_for(color, half, side).center();
                (Flag { color, position: home, possessor: None }, home)
            })
            .collect();

        let obstacles = Arc::new(ObstacleMap::random(&settings, &mut rng));
        let orders = ours.iter().map(|b| Command::hold(b.unit.id)).collect();
        info!(
            team = %settings.team,
            units = ours.len(),
            enemies = enemies.len(),
            obstacle_cells = obstacles.obstacle_cells(),
            "arena ready"
        );

        Ok(Self {
            constants: EnvConstants {
                team:        settings.team,
                unit_length: settings.unit_length,
                world_size:  settings.world_size,
                home_base,
            },
            settings,
            obstacles,
            world: Mutex::new(World {
                rng,
                step: 0,
                ours,
                enemies,
                flags,
                shots: Vec::new(),
                orders,
                captures: 0,
                closed: false,
            }),
        })
    }

    pub fn obstacles(&self) -> Arc<ObstacleMap> {
        Arc::clone(&self.obstacles)
    }

    /// Enemy flags delivered to our base so far.
    pub fn captures(&self) -> u32 {
        self.lock().captures
    }

    fn lock(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the world, refusing once the connection is closed.
    fn open(&self) -> ProtocolResult<MutexGuard<'_, World>> {
        let world = self.lock();
        if world.closed {
            return Err(ProtocolError::Closed);
        }
        Ok(world)
    }
}

impl Protocol for LocalArena {
    fn environment_constants(&self) -> ProtocolResult<EnvConstants> {
        let _world = self.open()?;
        Ok(self.constants.clone())
    }

    fn environment_state(&self, team: TeamColor) -> ProtocolResult<WorldSnapshot> {
        if team != self.constants.team {
            return Err(ProtocolError::Rejected(format!("this arena serves {}", self.constants.team)));
        }
        let mut world = self.open()?;
        world.advance(&self.settings, &self.constants);
        Ok(world.snapshot())
    }

    fn submit_commands(&self, commands: &[Command]) -> ProtocolResult<()> {
        let mut world = self.open()?;
        for cmd in commands {
            let slot = world
                .orders
                .get_mut(cmd.unit.index())
                .ok_or_else(|| ProtocolError::Rejected(format!("unknown unit {}", cmd.unit)))?;
            *slot = *cmd;
        }
        Ok(())
    }

    fn close(&self) -> ProtocolResult<()> {
        let mut world = self.lock();
        if !world.closed {
            world.closed = true;
            info!(steps = world.step, captures = world.captures, "arena closed");
        }
        Ok(())
    }
}

// ── Simulation step ───────────────────────────────────────────────────────────

impl World {
    fn advance(&mut self, s: &ArenaSettings, c: &EnvConstants) {
        self.step += 1;
        let half = c.half_world();
        self.move_ours(s, half);
        self.move_enemies(s, half);
        self.move_shots(s, half);
        self.update_flags(s, c);
    }

    fn move_ours(&mut self, s: &ArenaSettings, half: f64) {
        for (body, order) in self.ours.iter_mut().zip(&self.orders) {
            let unit = &mut body.unit;
            if !unit.is_alive() {
                body.respawn_in = body.respawn_in.saturating_sub(1);
                if body.respawn_in == 0 {
                    unit.status = UnitStatus::Alive;
                    unit.position = body.spawn;
                    unit.heading = 0.0;
                    debug!(unit = %unit.id, "respawned");
                }
                continue;
            }
            let turn = order.angular_velocity.clamp(-1.0, 1.0) * s.max_turn;
            unit.heading = normalize_angle(unit.heading + turn);
            let speed = order.speed.clamp(0.0, 1.0) * s.max_speed;
            unit.position = clamp_to_world(unit.position + heading_vector(unit.heading) * speed, half);
        }
    }

    fn move_enemies(&mut self, s: &ArenaSettings, half: f64) {
        for body in &mut self.enemies {
            let unit = &mut body.unit;
            unit.heading = normalize_angle(unit.heading + self.rng.gen_range(-0.4..=0.4));
            let next = unit.position + heading_vector(unit.heading) * (s.max_speed * ENEMY_PACE);
            if inside_world(next, half) {
                unit.position = next;
            } else {
                unit.heading = normalize_angle(unit.heading + PI);
            }
            if self.rng.gen_bool(s.fire_chance) {
                let dir = heading_vector(unit.heading);
                let shot = Shot {
                    position: unit.position + dir * s.unit_length,
                    velocity: dir * s.shot_speed,
                };
                self.shots.push((shot, s.shot_ttl));
            }
        }
    }

    fn move_shots(&mut self, s: &ArenaSettings, half: f64) {
        for (shot, ttl) in &mut self.shots {
            shot.position += shot.velocity;
            *ttl = ttl.saturating_sub(1);
        }
        self.shots.retain(|(shot, ttl)| *ttl > 0 && inside_world(shot.position, half));

        let mut i = 0;
        while i < self.shots.len() {
            let p = self.shots[i].0.position;
            let hit = self
                .ours
                .iter_mut()
                .find(|b| b.unit.is_alive() && b.unit.position.distance(p) < s.unit_length);
            match hit {
                Some(body) => {
                    body.unit.status = UnitStatus::Dead;
                    body.respawn_in = s.respawn_steps.max(1);
                    let dropped = body.unit.flag.take();
                    debug!(unit = %body.unit.id, step = self.step, "unit destroyed");
                    if let Some(color) = dropped {
                        self.return_flag(color);
                    }
                    self.shots.swap_remove(i);
                }
                None => i += 1,
            }
        }
    }

    fn update_flags(&mut self, s: &ArenaSettings, c: &EnvConstants) {
        let reach = REACH_UNITS * s.unit_length;
        let team = c.team;

        // Our units pick up loose enemy flags.
        for body in self.ours.iter_mut().filter(|b| b.unit.is_alive() && !b.unit.carries_flag()) {
            let loose = self.flags.iter_mut().find(|(f, _)| {
                f.color != team && f.possessor.is_none() && f.position.distance(body.unit.position) <= reach
            });
            if let Some((flag, _)) = loose {
                flag.possessor = Some(team);
                body.unit.flag = Some(flag.color);
                info!(unit = %body.unit.id, flag = %flag.color, "flag picked up");
            }
        }

        // Enemies grab our flag when they wander onto it.
        for body in &mut self.enemies {
            let ours = self
                .flags
                .iter_mut()
                .find(|(f, _)| f.color == team && f.possessor.is_none());
            if let Some((flag, _)) = ours {
                if flag.position.distance(body.unit.position) <= reach {
                    flag.possessor = Some(body.unit.team);
                    body.unit.flag = Some(team);
                    info!(thief = %body.unit.team, "our flag taken");
                }
            }
        }

        // Touching a thief recovers our flag.
        let recovered = self.enemies.iter_mut().any(|e| {
            let caught = e.unit.flag == Some(team)
                && self
                    .ours
                    .iter()
                    .any(|b| b.unit.is_alive() && b.unit.position.distance(e.unit.position) <= reach);
            if caught {
                e.unit.flag = None;
            }
            caught
        });
        if recovered {
            info!("flag recovered");
            self.return_flag(team);
        }

        // Carried flags travel with their carriers.
        for carrier in self.ours.iter().chain(&self.enemies) {
            if let Some(color) = carrier.unit.flag {
                if let Some((flag, _)) = self.flags.iter_mut().find(|(f, _)| f.color == color) {
                    flag.position = carrier.unit.position;
                }
            }
        }

        // Delivering an enemy flag home scores.
        let mut delivered = Vec::new();
        for body in &mut self.ours {
            if let Some(color) = body.unit.flag {
                if c.home_base.contains(body.unit.position) {
                    body.unit.flag = None;
                    delivered.push(color);
                }
            }
        }
        for color in delivered {
            self.captures += 1;
            info!(flag = %color, captures = self.captures, step = self.step, "flag captured");
            self.return_flag(color);
        }
    }

    fn return_flag(&mut self, color: TeamColor) {
        if let Some((flag, home)) = self.flags.iter_mut().find(|(f, _)| f.color == color) {
            flag.position = *home;
            flag.possessor = None;
        }
    }

    fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            own_units:   self.ours.iter().map(|b| b.unit.clone()).collect(),
            enemy_units: self.enemies.iter().map(|b| b.unit.clone()).collect(),
            shots:       self.shots.iter().map(|(s, _)| s.clone()).collect(),
            flags:       self.flags.iter().map(|(f, _)| f.clone()).collect(),
            ..WorldSnapshot::default()
        }
    }
}
