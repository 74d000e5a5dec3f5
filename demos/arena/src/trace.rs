//! CSV output: a per-tick unit trace and the last sampled frames.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use csv::Writer;
use serde::Serialize;
use tracing::{info, warn};

use bz_core::{Vec2, WorldSnapshot};
use bz_team::{
    AgentReport, DistributionFrame, FieldFrame, StateSender, TeamObserver, VisualizationSink,
};

#[derive(Serialize)]
struct UnitRow<'a> {
    tick:    u64,
    unit:    u32,
    x:       f64,
    y:       f64,
    heading: f64,
    alive:   bool,
    flag:    &'a str,
}

/// Writes one row per own unit per tick.
pub struct TraceObserver {
    writer:    Writer<File>,
    error:     Option<csv::Error>,
    rows:      usize,
    carrying:  usize,
    positions: StateSender<Vec<Vec2>>,
    sink:      Option<Arc<dyn VisualizationSink>>,
}

impl TraceObserver {
    pub fn create(
        path:      &Path,
        positions: StateSender<Vec<Vec2>>,
        sink:      Option<Arc<dyn VisualizationSink>>,
    ) -> Result<Self> {
        Ok(Self {
            writer: Writer::from_path(path)?,
            error: None,
            rows: 0,
            carrying: 0,
            positions,
            sink,
        })
    }

    fn write(&mut self, snapshot: &WorldSnapshot) -> csv::Result<()> {
        for u in &snapshot.own_units {
            self.writer.serialize(UnitRow {
                tick:    snapshot.tick,
                unit:    u.id.0,
                x:       u.position.x,
                y:       u.position.y,
                heading: u.heading,
                alive:   u.is_alive(),
                flag:    u.flag.map_or("", |c| c.as_str()),
            })?;
            self.rows += 1;
        }
        Ok(())
    }

    /// Flush the trace and release the mapper.  Returns rows written.
    pub fn finish(mut self) -> Result<usize> {
        self.positions.close();
        if let Some(e) = self.error.take() {
            return Err(e.into());
        }
        self.writer.flush()?;
        Ok(self.rows)
    }
}

impl TeamObserver for TraceObserver {
    fn on_tick_end(&mut self, snapshot: &WorldSnapshot) {
        if self.error.is_none() {
            if let Err(e) = self.write(snapshot) {
                warn!(error = %e, "trace write failed; trace disabled");
                self.error = Some(e);
            }
        }

        let carrying = snapshot.own_units.iter().filter(|u| u.carries_flag()).count();
        if carrying > self.carrying {
            info!(tick = snapshot.tick, carrying, "flags in transit");
        }
        self.carrying = carrying;

        let living: Vec<Vec2> = snapshot
            .own_units
            .iter()
            .filter(|u| u.is_alive())
            .map(|u| u.position)
            .collect();
        self.positions.add(living);

        if let Some(sink) = &self.sink {
            if let Some((mean, cov)) = spread(snapshot.living_enemies().map(|u| u.position)) {
                sink.enqueue_distribution(mean, cov);
            }
        }
    }

    fn on_shutdown(&mut self, reports: &[AgentReport]) {
        for r in reports {
            info!(
                unit = %r.unit,
                commands = r.commands_sent,
                skipped = r.snapshots_skipped,
                last_tick = r.last_tick,
                phase = %r.final_phase,
                "agent report"
            );
        }
    }
}

/// Sample mean and covariance of `points`, if there are at least two.
fn spread(points: impl Iterator<Item = Vec2>) -> Option<(Vec2, [[f64; 2]; 2])> {
    let points: Vec<Vec2> = points.collect();
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean = points.iter().copied().sum::<Vec2>() * (1.0 / n);
    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for p in &points {
        let d = *p - mean;
        sxx += d.x * d.x;
        sxy += d.x * d.y;
        syy += d.y * d.y;
    }
    let k = 1.0 / (n - 1.0);
    Some((mean, [[sxx * k, sxy * k], [sxy * k, syy * k]]))
}

#[derive(Serialize)]
struct ArrowRow {
    x:  f64,
    y:  f64,
    dx: f64,
    dy: f64,
}

pub fn write_field(path: &Path, frame: &FieldFrame) -> Result<()> {
    let mut w = Writer::from_path(path)?;
    for a in &frame.arrows {
        w.serialize(ArrowRow { x: a.x, y: a.y, dx: a.dx, dy: a.dy })?;
    }
    w.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct DensityRow {
    x:       f64,
    y:       f64,
    density: f64,
}

pub fn write_distribution(path: &Path, frame: &DistributionFrame) -> Result<()> {
    let mut w = Writer::from_path(path)?;
    for (row, &y) in frame.xs.iter().enumerate() {
        for (col, &x) in frame.xs.iter().enumerate() {
            w.serialize(DensityRow { x, y, density: frame.value(row, col) })?;
        }
    }
    w.flush()?;
    Ok(())
}
