//! `bz-core` — foundational types for the bzagents team controller.
//!
//! This crate is a dependency of every other `bz-*` crate.  It has no `bz-*`
//! dependencies and a single required external one (`thiserror`), plus
//! optional `serde`.
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `UnitId`                                              |
//! | [`geo`]         | `Vec2`, plane positions and field vectors             |
//! | [`team`]        | `TeamColor`                                           |
//! | [`world`]       | `Unit`, `Flag`, `Shot`, `Base`, `WorldSnapshot`       |
//! | [`command`]     | `Command`                                             |
//! | [`constants`]   | `EnvConstants`                                        |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod command;
pub mod constants;
pub mod error;
pub mod geo;
pub mod ids;
pub mod team;
pub mod world;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use command::Command;
pub use constants::EnvConstants;
pub use error::{CoreError, CoreResult};
pub use geo::Vec2;
pub use ids::UnitId;
pub use team::TeamColor;
pub use world::{Base, Flag, Shot, Unit, UnitStatus, WorldSnapshot};
