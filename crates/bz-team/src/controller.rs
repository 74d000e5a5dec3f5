//! Per-agent control loop.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info};

use bz_core::{Command, UnitId, WorldSnapshot};
use bz_field::PotentialFieldPlanner;

use crate::{Protocol, StateReceiver, StopToken, TeamResult, VisualizationSink};

/// Where an agent is in its loop.
///
/// ```text
/// WaitingForState ─▶ Planning ─▶ CommandSent ─▶ WaitingForState ─▶ …
///        └──────────────┴────────────┴──────▶ Stopped
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AgentPhase {
    WaitingForState,
    Planning,
    CommandSent,
    Stopped,
}

impl fmt::Display for AgentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentPhase::WaitingForState => "waiting",
            AgentPhase::Planning        => "planning",
            AgentPhase::CommandSent     => "sent",
            AgentPhase::Stopped         => "stopped",
        };
        f.write_str(s)
    }
}

/// What an agent did over its lifetime, returned when its thread ends.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentReport {
    pub unit:              UnitId,
    pub commands_sent:     u64,
    /// Snapshots overwritten before this agent got to them.
    pub snapshots_skipped: u64,
    /// Tick number of the last snapshot planned on, 0 if none.
    pub last_tick:         u64,
    pub final_phase:       AgentPhase,
}

/// Drives one unit: drain the channel, plan, submit, repeat.
pub struct AgentController<P: Protocol> {
    unit:          UnitId,
    planner:       Arc<PotentialFieldPlanner>,
    protocol:      Arc<P>,
    states:        StateReceiver<Arc<WorldSnapshot>>,
    stop:          StopToken,
    sink:          Option<Arc<dyn VisualizationSink>>,
    phase:         AgentPhase,
    commands_sent: u64,
    last_tick:     u64,
}

impl<P: Protocol> AgentController<P> {
    pub fn new(
        unit:     UnitId,
        planner:  Arc<PotentialFieldPlanner>,
        protocol: Arc<P>,
        states:   StateReceiver<Arc<WorldSnapshot>>,
        stop:     StopToken,
    ) -> Self {
        Self {
            unit,
            planner,
            protocol,
            states,
            stop,
            sink:          None,
            phase:         AgentPhase::WaitingForState,
            commands_sent: 0,
            last_tick:     0,
        }
    }

    /// Push this agent's composed field to `sink` every tick.
    pub fn with_sink(mut self, sink: Arc<dyn VisualizationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn unit(&self) -> UnitId {
        self.unit
    }

    pub fn phase(&self) -> AgentPhase {
        self.phase
    }

    /// Loop until stopped or the channel closes.
    ///
    /// A protocol failure ends the loop and is returned to the joiner.
    pub fn run(mut self) -> TeamResult<AgentReport> {
        info!(unit = %self.unit, "agent started");
        while !self.stop.is_cancelled() {
            self.phase = AgentPhase::WaitingForState;
            let Some(snapshot) = self.states.remove() else {
                break;
            };
            if self.stop.is_cancelled() {
                break;
            }
            if let Err(e) = self.step(&snapshot) {
                error!(unit = %self.unit, error = %e, "agent aborted");
                self.phase = AgentPhase::Stopped;
                return Err(e);
            }
        }
        self.phase = AgentPhase::Stopped;
        let report = self.report();
        info!(
            unit = %self.unit,
            commands = report.commands_sent,
            skipped = report.snapshots_skipped,
            "agent stopped"
        );
        Ok(report)
    }

    /// One Planning → CommandSent pass against `snapshot`.
    pub fn step(&mut self, snapshot: &WorldSnapshot) -> TeamResult<Command> {
        self.phase = AgentPhase::Planning;
        let plan = self.planner.plan_detailed(self.unit, snapshot);
        if let Some(sink) = &self.sink {
            if !plan.field.is_empty() {
                sink.enqueue_field(plan.field);
            }
        }

        self.protocol.submit_commands(&[plan.command])?;
        self.phase = AgentPhase::CommandSent;
        self.commands_sent += 1;
        self.last_tick = snapshot.tick;
        debug!(unit = %self.unit, tick = snapshot.tick, "command sent");
        Ok(plan.command)
    }

    pub fn report(&self) -> AgentReport {
        AgentReport {
            unit:              self.unit,
            commands_sent:     self.commands_sent,
            snapshots_skipped: self.states.discarded(),
            last_tick:         self.last_tick,
            final_phase:       self.phase,
        }
    }
}
