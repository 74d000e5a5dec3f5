//! Arena configuration, loaded from an optional TOML file.
//!
//! Every section falls back to its defaults, so a file only needs the keys it
//! changes:
//!
//! ```toml
//! [arena]
//! seed = 7
//! enemies_per_team = 3
//!
//! [team]
//! tick_interval_ms = 20
//! max_ticks = 500
//!
//! [team.planner]
//! angular_gain = 1.5
//!
//! [grid]
//! prior = 0.5
//! ```

use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use bz_core::TeamColor;
use bz_grid::GridConfig;
use bz_team::TeamConfig;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaSettings {
    pub seed:             u64,
    pub team:             TeamColor,
    pub world_size:       f64,
    pub unit_length:      f64,
    pub units_per_team:   u32,
    pub enemies_per_team: u32,
    /// World units covered per step at full speed.
    pub max_speed:        f64,
    /// Radians turned per step at full angular velocity.
    pub max_turn:         f64,
    /// Chance per step that a wandering enemy fires.
    pub fire_chance:      f64,
    pub shot_speed:       f64,
    pub shot_ttl:         u32,
    /// Steps a destroyed unit waits before respawning at home.
    pub respawn_steps:    u32,
    pub obstacle_count:   u32,
    /// Side length of one occupancy cell, in world units.
    pub cell_size:        f64,
    /// Half-width of the square sensor window, in cells.
    pub sensor_range:     usize,
    /// Lattice resolution for the field visualisation.
    pub plot_samples:     usize,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            seed:             42,
            team:             TeamColor::Red,
            world_size:       800.0,
            unit_length:      6.0,
            units_per_team:   4,
            enemies_per_team: 2,
            max_speed:        8.0,
            max_turn:         0.5,
            fire_chance:      0.02,
            shot_speed:       20.0,
            shot_ttl:         15,
            respawn_steps:    25,
            obstacle_count:   12,
            cell_size:        10.0,
            sensor_range:     5,
            plot_samples:     25,
        }
    }
}

impl ArenaSettings {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.world_size > 0.0, "world_size must be positive");
        ensure!(self.unit_length > 0.0, "unit_length must be positive");
        ensure!(self.units_per_team > 0, "units_per_team must be at least 1");
        ensure!(self.cell_size > 0.0, "cell_size must be positive");
        ensure!(
            (0.0..=1.0).contains(&self.fire_chance),
            "fire_chance must be in [0, 1], got {}",
            self.fire_chance
        );
        ensure!(self.plot_samples > 0, "plot_samples must be at least 1");
        Ok(())
    }

    /// Cells along one side of the occupancy grid.
    pub fn grid_cells(&self) -> usize {
        (self.world_size / self.cell_size).ceil() as usize
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub arena: ArenaSettings,
    pub team:  TeamConfig,
    pub grid:  GridConfig,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.arena.validate()?;
        self.team.validate()?;
        self.grid.validate()?;
        Ok(())
    }
}
