//! Fluent builder and the polling loop that feeds every agent.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{error, info, warn};

use bz_core::{EnvConstants, UnitId, WorldSnapshot};
use bz_field::PotentialFieldPlanner;

use crate::{
    AgentController, AgentReport, Protocol, StateSender, StopToken, TeamConfig, TeamError,
    TeamObserver, TeamResult, VisualizationSink, state_channel,
};

// ── TeamBuilder ───────────────────────────────────────────────────────────────

/// Fluent builder for [`TeamCoordinator<P>`].
///
/// # Example
///
/// ```rust,ignore
/// let team = TeamBuilder::new(Arc::new(protocol), TeamConfig::default())
///     .visualize(UnitId(0), sink)
///     .start()?;
/// let reports = team.run(&mut NoopObserver)?;
/// ```
pub struct TeamBuilder<P: Protocol> {
    protocol: Arc<P>,
    config:   TeamConfig,
    sinks:    Vec<(UnitId, Arc<dyn VisualizationSink>)>,
}

impl<P: Protocol> TeamBuilder<P> {
    pub fn new(protocol: Arc<P>, config: TeamConfig) -> Self {
        Self { protocol, config, sinks: Vec::new() }
    }

    /// Route `unit`'s composed field to `sink` every tick.
    ///
    /// Ignored if the server does not report that unit.
    pub fn visualize(mut self, unit: UnitId, sink: Arc<dyn VisualizationSink>) -> Self {
        self.sinks.push((unit, sink));
        self
    }

    /// Fetch constants and the first snapshot, spawn one thread per unit, and
    /// hand every agent tick 1.
    pub fn start(self) -> TeamResult<TeamCoordinator<P>> {
        self.config.validate()?;

        let constants = self.protocol.environment_constants()?;
        let planner = Arc::new(PotentialFieldPlanner::new(
            constants.clone(),
            self.config.planner.clone(),
        )?);

        let first = self.protocol.environment_state(constants.team)?;
        let units: Vec<UnitId> = first.own_units.iter().map(|u| u.id).collect();
        if units.is_empty() {
            return Err(TeamError::Config(format!(
                "server reported no units for team {}",
                constants.team
            )));
        }

        let stop = StopToken::new();
        let mut coordinator = TeamCoordinator {
            protocol:  Arc::clone(&self.protocol),
            constants,
            config:    self.config,
            senders:   Vec::with_capacity(units.len()),
            workers:   Vec::with_capacity(units.len()),
            stop:      stop.clone(),
            tick:      0,
            last_poll: Instant::now(),
            joined:    false,
        };

        for &unit in &units {
            let (tx, rx) = state_channel();
            let mut controller = AgentController::new(
                unit,
                Arc::clone(&planner),
                Arc::clone(&self.protocol),
                rx,
                stop.clone(),
            );
            if let Some((_, sink)) = self.sinks.iter().find(|(u, _)| *u == unit) {
                controller = controller.with_sink(Arc::clone(sink));
            }

            let spawned = thread::Builder::new()
                .name(format!("agent-{}", unit.0))
                .spawn(move || controller.run());
            match spawned {
                Ok(handle) => {
                    coordinator.senders.push(tx);
                    coordinator.workers.push(Worker { unit, handle });
                }
                Err(e) => {
                    // Unwind the agents already running before reporting.
                    // Their failures are logged by `join_all`.
                    coordinator.join_all();
                    return Err(TeamError::Spawn(e));
                }
            }
        }

        info!(
            team = %coordinator.constants.team,
            agents = units.len(),
            "team started"
        );
        coordinator.publish(first);
        Ok(coordinator)
    }
}

// ── TeamCoordinator ───────────────────────────────────────────────────────────

struct Worker {
    unit:   UnitId,
    handle: JoinHandle<TeamResult<AgentReport>>,
}

/// Owns the agent threads and drives them from the caller's thread.
///
/// Dropping a coordinator that was not shut down stops and joins every
/// agent and closes the protocol, the same as [`shutdown`][Self::shutdown].
pub struct TeamCoordinator<P: Protocol> {
    protocol:  Arc<P>,
    constants: EnvConstants,
    config:    TeamConfig,
    senders:   Vec<StateSender<Arc<WorldSnapshot>>>,
    workers:   Vec<Worker>,
    stop:      StopToken,
    tick:      u64,
    last_poll: Instant,
    joined:    bool,
}

impl<P: Protocol> TeamCoordinator<P> {
    pub fn constants(&self) -> &EnvConstants {
        &self.constants
    }

    pub fn agent_count(&self) -> usize {
        self.workers.len()
    }

    /// Ticks published so far.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// A handle that ends [`play`][Self::play] from another thread or a
    /// signal handler.  [`run`][Self::run] then shuts down as usual.
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    /// Poll the server once and push the snapshot to every agent.
    pub fn tick(&mut self) -> TeamResult<Arc<WorldSnapshot>> {
        let snapshot = self.protocol.environment_state(self.constants.team)?;
        Ok(self.publish(snapshot))
    }

    fn publish(&mut self, mut snapshot: WorldSnapshot) -> Arc<WorldSnapshot> {
        let now = Instant::now();
        self.tick += 1;
        snapshot.tick = self.tick;
        snapshot.elapsed = if self.tick == 1 {
            Default::default()
        } else {
            now.duration_since(self.last_poll)
        };
        self.last_poll = now;

        let snapshot = Arc::new(snapshot);
        for sender in &self.senders {
            sender.add(Arc::clone(&snapshot));
        }
        snapshot
    }

    /// Tick until stopped, `max_ticks` is reached, or an agent exits.
    ///
    /// Returns the number of ticks played in this call.
    pub fn play<O: TeamObserver>(&mut self, observer: &mut O) -> TeamResult<u64> {
        let interval = self.config.tick_interval();
        let mut played = 0;
        loop {
            if self.stop.is_cancelled() {
                break;
            }
            if self.config.max_ticks.is_some_and(|max| self.tick >= max) {
                break;
            }
            if let Some(w) = self.workers.iter().find(|w| w.handle.is_finished()) {
                warn!(unit = %w.unit, "agent exited early; stopping team");
                break;
            }

            let started = Instant::now();
            observer.on_tick_start(self.tick + 1);
            let snapshot = self.tick()?;
            observer.on_tick_end(&snapshot);
            played += 1;

            if let Some(rest) = interval.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
        Ok(played)
    }

    /// [`play`][Self::play] then [`shutdown`][Self::shutdown].
    ///
    /// Shutdown always runs; a polling error takes precedence over agent
    /// errors.
    pub fn run<O: TeamObserver>(mut self, observer: &mut O) -> TeamResult<Vec<AgentReport>> {
        let played = self.play(observer);
        let (reports, agent_error) = self.join_all();
        observer.on_shutdown(&reports);
        played?;
        match agent_error {
            Some(e) => Err(e),
            None => Ok(reports),
        }
    }

    /// Stop every agent, join them, and close the protocol.
    ///
    /// Returns the first agent failure, if any.
    pub fn shutdown(mut self) -> TeamResult<Vec<AgentReport>> {
        let (reports, agent_error) = self.join_all();
        match agent_error {
            Some(e) => Err(e),
            None => Ok(reports),
        }
    }

    fn join_all(&mut self) -> (Vec<AgentReport>, Option<TeamError>) {
        if self.joined {
            return (Vec::new(), None);
        }
        self.joined = true;
        self.stop.cancel();
        for sender in &self.senders {
            sender.close();
        }

        let mut reports = Vec::with_capacity(self.workers.len());
        let mut first_error = None;
        for Worker { unit, handle } in self.workers.drain(..) {
            match handle.join() {
                Ok(Ok(report)) => reports.push(report),
                Ok(Err(e)) => {
                    error!(%unit, error = %e, "agent failed");
                    first_error.get_or_insert(e);
                }
                Err(_) => {
                    error!(%unit, "agent panicked");
                    first_error.get_or_insert(TeamError::AgentPanicked(unit));
                }
            }
        }

        if let Err(e) = self.protocol.close() {
            warn!(error = %e, "protocol close failed");
        }
        info!(ticks = self.tick, agents = reports.len(), "team stopped");
        (reports, first_error)
    }
}

impl<P: Protocol> Drop for TeamCoordinator<P> {
    fn drop(&mut self) {
        if !self.joined {
            warn!("team dropped without shutdown; stopping agents");
            self.join_all();
        }
    }
}
