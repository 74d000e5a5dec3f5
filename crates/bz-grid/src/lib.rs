//! `bz-grid` — probabilistic obstacle map.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                        |
//! |-------------|-----------------------------------------------------------------|
//! | [`sensor`]  | `SensorModel`, `Observation`, `Classification`, Bayes update    |
//! | [`grid`]    | `OccupancyGrid`, `ObservationBlock`                             |
//! | [`fusion`]  | `OccupancyGridFusion`, the locked, shareable update engine      |
//! | [`config`]  | `GridConfig`                                                    |
//! | [`error`]   | `GridError`, `GridResult<T>`                                    |
//!
//! # Consistency
//!
//! The grid lives behind one mutex inside [`OccupancyGridFusion`].  A whole
//! `fuse_block` call runs under a single lock acquisition, and readers go
//! through [`snapshot`][OccupancyGridFusion::snapshot] or
//! [`with_grid`][OccupancyGridFusion::with_grid], so a reader never sees a
//! block half applied.

pub mod config;
pub mod error;
pub mod fusion;
pub mod grid;
pub mod sensor;

#[cfg(test)]
mod tests;

pub use config::GridConfig;
pub use error::{GridError, GridResult};
pub use fusion::{ClassCounts, OccupancyGridFusion};
pub use grid::{ObservationBlock, OccupancyGrid};
pub use sensor::{Classification, Observation, SensorModel, PROBABILITY_CEILING, PROBABILITY_FLOOR};
