//! A noisy obstacle sensor and the thread that fuses its scans.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use bz_core::Vec2;
use bz_grid::{Observation, ObservationBlock, OccupancyGridFusion};
use bz_team::StateReceiver;

use crate::arena::ObstacleMap;

/// Reads the true map through a binary sensor with fixed error rates.
pub struct NoisySensor {
    map:           Arc<ObstacleMap>,
    range:         usize,
    true_positive: f64,
    true_negative: f64,
    rng:           SmallRng,
}

impl NoisySensor {
    pub fn new(
        map:           Arc<ObstacleMap>,
        range:         usize,
        true_positive: f64,
        true_negative: f64,
        seed:          u64,
    ) -> Self {
        Self {
            map,
            range,
            true_positive,
            true_negative,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn read(&mut self, row: usize, col: usize) -> Observation {
        let hit = if self.map.is_occupied(row, col) {
            self.rng.gen_bool(self.true_positive)
        } else {
            !self.rng.gen_bool(self.true_negative)
        };
        Observation::from_reading(hit)
    }

    /// Scan the square window around `p`, clipped to the map.
    ///
    /// Returns the window's top-left cell and the readings.
    pub fn scan(&mut self, p: Vec2) -> (usize, usize, ObservationBlock) {
        let n = self.map.cells();
        let (row, col) = self.map.cell_of(p);
        let r0 = row.saturating_sub(self.range);
        let c0 = col.saturating_sub(self.range);
        let r1 = (row + self.range).min(n - 1);
        let c1 = (col + self.range).min(n - 1);

        let mut block = ObservationBlock::filled(r1 - r0 + 1, c1 - c0 + 1, Observation::None);
        for r in r0..=r1 {
            for c in c0..=c1 {
                let reading = self.read(r, c);
                block.set(r - r0, c - c0, reading);
            }
        }
        (r0, c0, block)
    }
}

/// Fuse one scan per position until the channel closes.
///
/// Returns the number of blocks fused.
pub fn spawn_mapper(
    mut sensor: NoisySensor,
    fusion:     Arc<OccupancyGridFusion>,
    positions:  StateReceiver<Vec<Vec2>>,
) -> io::Result<JoinHandle<u64>> {
    thread::Builder::new().name("mapper".into()).spawn(move || {
        let mut fused = 0;
        while let Some(batch) = positions.remove() {
            for p in batch {
                let (row, col, block) = sensor.scan(p);
                fusion.fuse_block(row, col, &block);
                fused += 1;
            }
        }
        debug!(fused, skipped = positions.discarded(), "mapper exiting");
        fused
    })
}
