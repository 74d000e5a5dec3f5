//! Observer hooks for the coordinator loop.

use bz_core::WorldSnapshot;

use crate::AgentReport;

/// Callbacks invoked by [`TeamCoordinator::play`][crate::TeamCoordinator::play].
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct Progress { every: u64 }
///
/// impl TeamObserver for Progress {
///     fn on_tick_end(&mut self, snapshot: &WorldSnapshot) {
///         if snapshot.tick % self.every == 0 {
///             println!("tick {}: {} units", snapshot.tick, snapshot.own_units.len());
///         }
///     }
/// }
/// ```
pub trait TeamObserver {
    /// Before the protocol is polled for tick `tick`.
    fn on_tick_start(&mut self, _tick: u64) {}

    /// After the snapshot has been pushed to every agent.
    fn on_tick_end(&mut self, _snapshot: &WorldSnapshot) {}

    /// Once, after every worker has been joined.
    fn on_shutdown(&mut self, _reports: &[AgentReport]) {}
}

/// A [`TeamObserver`] that does nothing.
pub struct NoopObserver;

impl TeamObserver for NoopObserver {}
