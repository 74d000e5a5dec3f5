//! `bz-team` — concurrent control loop for a team of agents.
//!
//! # Threads
//!
//! ```text
//!                 ┌──────────────────────────┐
//!   Protocol ◀────│ TeamCoordinator (caller) │  poll once per tick
//!                 └────────────┬─────────────┘
//!                              │ Arc<WorldSnapshot>, same instance to all
//!              ┌───────────────┼───────────────┐
//!              ▼               ▼               ▼
//!        StateChannel    StateChannel    StateChannel   latest-wins slots
//!              │               │               │
//!        AgentController AgentController AgentController   one thread each
//!              │               │               │
//!              └──── plan ─▶ submit_commands ─▶ Protocol
//! ```
//!
//! Agents share nothing mutable with each other.  Each one blocks on its own
//! channel, keeps only the newest snapshot, plans, and submits.
//!
//! # Shutdown
//!
//! Stopping is two steps and both are required: cancel the shared
//! [`StopToken`], then close every channel so an agent parked in
//! [`StateReceiver::remove`] wakes up and sees the flag.
//! [`TeamCoordinator::shutdown`] does both, joins every worker, and closes the
//! protocol.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                |
//! |-----------------|---------------------------------------------------------|
//! | [`channel`]     | `state_channel`, `StateSender`, `StateReceiver`         |
//! | [`stop`]        | `StopToken`                                             |
//! | [`protocol`]    | `Protocol` trait, `ProtocolError`                       |
//! | [`controller`]  | `AgentController`, `AgentPhase`, `AgentReport`          |
//! | [`coordinator`] | `TeamBuilder`, `TeamCoordinator`                        |
//! | [`observer`]    | `TeamObserver`, `NoopObserver`                          |
//! | [`visual`]      | `VisualizationSink`, `FieldSampler`, `SamplingSink`     |
//! | [`config`]      | `TeamConfig`                                            |
//! | [`error`]       | `TeamError`, `TeamResult<T>`                            |

pub mod channel;
pub mod config;
pub mod controller;
pub mod coordinator;
pub mod error;
pub mod observer;
pub mod protocol;
pub mod stop;
pub mod visual;


pub use channel::{StateReceiver, StateSender, state_channel};
pub use config::TeamConfig;
pub use controller::{AgentController, AgentPhase, AgentReport};
pub use coordinator::{TeamBuilder, TeamCoordinator};
pub use error::{TeamError, TeamResult};
pub use observer::{NoopObserver, TeamObserver};
pub use protocol::{Protocol, ProtocolError, ProtocolResult};
pub use stop::StopToken;
pub use visual::{
    Arrow, DistributionFrame, FieldFrame, FieldSampler, Frame, NoopSink, SamplingSink,
    VisualizationSink,
};
