//! `bz-field` — potential-field motion planning.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                        |
//! |-------------|-----------------------------------------------------------------|
//! | [`field`]   | `FieldFunction` (`Repulsion`, `Attraction`, `Tangential`), `ComposedField` |
//! | [`angle`]   | `normalize_angle`                                               |
//! | [`goal`]    | `Goal`, `GoalSelector`, `nearest_flag`                          |
//! | [`config`]  | `PlannerConfig`, `RadialParams`, `OrbitParams`, `AttractionParams` |
//! | [`planner`] | `PotentialFieldPlanner`, `Plan`                                 |
//! | [`error`]   | `FieldError`, `FieldResult<T>`                                  |
//!
//! # Per-tick pipeline
//!
//! ```text
//! snapshot ─▶ GoalSelector::select ─▶ Goal
//!          ─▶ one Repulsion per living enemy and per shot
//!          ─▶ one Tangential per teammate carrying a flag
//!          ─▶ one Attraction toward the goal
//!          ═▶ ComposedField::evaluate(unit.position) ─▶ steering vector
//!          ─▶ heading error, normalized ─▶ Command
//! ```
//!
//! Everything here is a pure function of the snapshot: the planner keeps no
//! state between ticks and is `Send + Sync`, so one instance can be shared by
//! every agent thread.

pub mod angle;
pub mod config;
pub mod error;
pub mod field;
pub mod goal;
pub mod planner;

#[cfg(test)]
mod tests;

pub use angle::normalize_angle;
pub use config::{AttractionParams, OrbitParams, PlannerConfig, RadialParams};
pub use error::{FieldError, FieldResult};
pub use field::{Attraction, ComposedField, FieldFunction, Repulsion, Tangential};
pub use goal::{Goal, GoalSelector, nearest_flag};
pub use planner::{Plan, PotentialFieldPlanner};
