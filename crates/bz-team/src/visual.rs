//! Optional visualization of an agent's field.
//!
//! Agents never draw anything themselves.  They hand the composed field to a
//! [`VisualizationSink`] and move on; a [`SamplingSink`] samples it on its own
//! thread, keeping only the newest request of each kind.

use std::f64::consts::PI;
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use bz_core::Vec2;
use bz_field::ComposedField;

use crate::{StateReceiver, StateSender, StopToken, TeamError, TeamResult, state_channel};

/// Where agents send things to be drawn.  Calls must not block.
pub trait VisualizationSink: Send + Sync {
    fn enqueue_field(&self, field: ComposedField);

    /// A 2-D Gaussian with the given mean and covariance, row-major.
    fn enqueue_distribution(&self, mean: Vec2, covariance: [[f64; 2]; 2]);
}

/// Discards everything.
pub struct NoopSink;

impl VisualizationSink for NoopSink {
    fn enqueue_field(&self, _field: ComposedField) {}
    fn enqueue_distribution(&self, _mean: Vec2, _covariance: [[f64; 2]; 2]) {}
}

// ── Frames ────────────────────────────────────────────────────────────────────

/// One arrow of a quiver plot: tail at `(x, y)`, extent `(dx, dy)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Arrow {
    pub x:  f64,
    pub y:  f64,
    pub dx: f64,
    pub dy: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldFrame {
    pub arrows: Vec<Arrow>,
}

/// A density sampled on the lattice, row-major with `y` as the row.
#[derive(Clone, Debug, PartialEq)]
pub struct DistributionFrame {
    pub samples: usize,
    pub xs:      Vec<f64>,
    pub values:  Vec<f64>,
    pub peak:    f64,
}

impl DistributionFrame {
    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.samples + col]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Field(FieldFrame),
    Distribution(DistributionFrame),
}

// ── FieldSampler ──────────────────────────────────────────────────────────────

/// Samples fields and densities on an `N × N` lattice spanning the world.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FieldSampler {
    world_size: f64,
    samples:    usize,
}

impl FieldSampler {
    pub fn new(world_size: f64, samples: usize) -> TeamResult<Self> {
        if !(world_size.is_finite() && world_size > 0.0) {
            return Err(TeamError::Config(format!("world size must be positive, got {world_size}")));
        }
        if samples == 0 {
            return Err(TeamError::Config("sampler needs at least one sample per axis".into()));
        }
        Ok(Self { world_size, samples })
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Evenly spaced coordinates from `-world/2` to `world/2` inclusive.
    pub fn axis(&self) -> Vec<f64> {
        let half = self.world_size * 0.5;
        if self.samples == 1 {
            return vec![0.0];
        }
        let step = self.world_size / (self.samples - 1) as f64;
        (0..self.samples).map(|i| -half + step * i as f64).collect()
    }

    /// Arrow length for a unit-magnitude vector.
    pub fn arrow_length(&self) -> f64 {
        0.75 * self.world_size / self.samples as f64
    }

    /// Evaluate `field` at every lattice point.
    ///
    /// Vectors longer than 1 are scaled to unit length, then every arrow is
    /// centered on its sample point.
    pub fn sample_field(&self, field: &ComposedField) -> FieldFrame {
        let axis = self.axis();
        let len = self.arrow_length();
        let mut arrows = Vec::with_capacity(axis.len() * axis.len());
        for &y in &axis {
            for &x in &axis {
                let mut v = field.evaluate(Vec2::new(x, y));
                let mag = v.length();
                if mag > 1.0 {
                    v = v * (1.0 / mag);
                }
                arrows.push(Arrow {
                    x:  x - v.x * len * 0.5,
                    y:  y - v.y * len * 0.5,
                    dx: v.x * len,
                    dy: v.y * len,
                });
            }
        }
        FieldFrame { arrows }
    }

    /// Gaussian density on the lattice, or `None` if `covariance` is not
    /// positive definite.
    pub fn sample_distribution(
        &self,
        mean:       Vec2,
        covariance: [[f64; 2]; 2],
    ) -> Option<DistributionFrame> {
        let [[a, b], [c, d]] = covariance;
        let det = a * d - b * c;
        if !(det.is_finite() && det > 0.0 && a > 0.0) {
            return None;
        }
        // Inverse of [[a, b], [c, d]].
        let (ia, ib, ic, id) = (d / det, -b / det, -c / det, a / det);
        let norm = 1.0 / (2.0 * PI * det.sqrt());

        let xs = self.axis();
        let mut values = Vec::with_capacity(xs.len() * xs.len());
        let mut peak = 0.0_f64;
        for &y in &xs {
            for &x in &xs {
                let (dx, dy) = (x - mean.x, y - mean.y);
                let q = dx * (ia * dx + ib * dy) + dy * (ic * dx + id * dy);
                let p = norm * (-0.5 * q).exp();
                peak = peak.max(p);
                values.push(p);
            }
        }
        Some(DistributionFrame { samples: self.samples, xs, values, peak })
    }
}

// ── SamplingSink ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct Batch {
    field:        Option<ComposedField>,
    distribution: Option<(Vec2, [[f64; 2]; 2])>,
}

impl Batch {
    /// Keep the newest request of each kind.
    fn merge(older: Batch, newer: Batch) -> Batch {
        Batch {
            field:        newer.field.or(older.field),
            distribution: newer.distribution.or(older.distribution),
        }
    }
}

/// A sink that samples on a background thread and passes frames to a
/// renderer closure.
///
/// Requests that arrive faster than the renderer keeps up are coalesced:
/// only the newest field and newest distribution survive.
pub struct SamplingSink {
    sender: StateSender<Batch>,
    stop:   StopToken,
    worker: Mutex<Option<JoinHandle<u64>>>,
}

impl SamplingSink {
    pub fn spawn<F>(sampler: FieldSampler, renderer: F) -> TeamResult<Self>
    where
        F: FnMut(Frame) + Send + 'static,
    {
        let (sender, receiver) = state_channel();
        let stop = StopToken::new();
        let worker_stop = stop.clone();
        let worker = thread::Builder::new()
            .name("visual".into())
            .spawn(move || render_loop(sampler, receiver, worker_stop, renderer))
            .map_err(TeamError::Spawn)?;
        Ok(Self { sender, stop, worker: Mutex::new(Some(worker)) })
    }

    /// Requests dropped because a newer one replaced them.
    pub fn coalesced(&self) -> u64 {
        self.sender.discarded()
    }

    /// Stop the worker and wait for it.  Returns the number of frames
    /// rendered.  Later calls return 0.
    pub fn stop(&self) -> u64 {
        self.stop.cancel();
        self.sender.close();
        let handle = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
        match handle.map(JoinHandle::join) {
            Some(Ok(frames)) => frames,
            Some(Err(_)) => {
                warn!("visualization worker panicked");
                0
            }
            None => 0,
        }
    }
}

impl VisualizationSink for SamplingSink {
    fn enqueue_field(&self, field: ComposedField) {
        let batch = Batch { field: Some(field), ..Batch::default() };
        self.sender.add_merged(batch, Batch::merge);
    }

    fn enqueue_distribution(&self, mean: Vec2, covariance: [[f64; 2]; 2]) {
        let batch = Batch { distribution: Some((mean, covariance)), ..Batch::default() };
        self.sender.add_merged(batch, Batch::merge);
    }
}

impl Drop for SamplingSink {
    fn drop(&mut self) {
        self.stop();
    }
}

fn render_loop<F: FnMut(Frame)>(
    sampler:  FieldSampler,
    receiver: StateReceiver<Batch>,
    stop:     StopToken,
    mut renderer: F,
) -> u64 {
    let mut frames = 0;
    while !stop.is_cancelled() {
        let Some(batch) = receiver.remove() else { break };
        if stop.is_cancelled() {
            break;
        }
        if let Some(field) = batch.field {
            renderer(Frame::Field(sampler.sample_field(&field)));
            frames += 1;
        }
        if let Some((mean, covariance)) = batch.distribution {
            match sampler.sample_distribution(mean, covariance) {
                Some(frame) => {
                    renderer(Frame::Distribution(frame));
                    frames += 1;
                }
                None => warn!(?covariance, "covariance not positive definite; skipped"),
            }
        }
    }
    debug!(frames, "visualization worker exiting");
    frames
}
