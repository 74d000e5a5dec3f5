//! Unit tests for bz-grid.

use crate::{
    Classification, GridConfig, Observation, ObservationBlock, OccupancyGridFusion, SensorModel,
    PROBABILITY_CEILING, PROBABILITY_FLOOR,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn fusion(rows: usize, cols: usize, prior: f64, tp: f64, tn: f64) -> OccupancyGridFusion {
    let config = GridConfig { prior, true_positive: tp, true_negative: tn };
    OccupancyGridFusion::new(rows, cols, &config).unwrap()
}

/// Bayes update written out longhand, independent of `SensorModel`.
fn bayes_obstacle(p: f64, tp: f64, tn: f64) -> f64 {
    (tp * p) / (tp * p + (1.0 - tn) * (1.0 - p))
}

// ── SensorModel ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod sensor_tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    #[test]
    fn thresholds_from_rates() {
        let m = SensorModel::new(0.97, 0.9).unwrap();
        assert_eq!(m.obstacle_threshold(), 0.97);
        assert!((m.not_obstacle_threshold() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn thresholds_swap_when_inverted() {
        let m = SensorModel::new(0.2, 0.3).unwrap();
        assert!((m.obstacle_threshold() - 0.7).abs() < 1e-12);
        assert!((m.not_obstacle_threshold() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn threshold_order_holds_after_any_sequence() {
        let f = fusion(2, 2, 0.5, 0.9, 0.9);
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..1_000 {
            let tp = rng.gen_range(0.001..0.999);
            let tn = rng.gen_range(0.001..0.999);
            f.set_sensor_model(tp, tn).unwrap();
            let m = f.sensor_model();
            assert!(m.obstacle_threshold() >= m.not_obstacle_threshold(), "tp={tp} tn={tn}");
        }
    }

    #[test]
    fn out_of_range_rates_rejected() {
        for bad in [0.0, 1.0, -0.1, 1.1, f64::NAN] {
            assert!(SensorModel::new(bad, 0.9).is_err(), "tp={bad}");
            assert!(SensorModel::new(0.9, bad).is_err(), "tn={bad}");
        }
    }

    #[test]
    fn rejected_update_keeps_previous_model() {
        let f = fusion(1, 1, 0.5, 0.9, 0.8);
        assert!(f.set_sensor_model(1.0, 0.5).is_err());
        assert_eq!(f.sensor_model(), SensorModel::new(0.9, 0.8).unwrap());
    }

    #[test]
    fn concrete_obstacle_posterior() {
        let m = SensorModel::new(0.9, 0.8).unwrap();
        let p = m.posterior(0.7, Observation::Obstacle);
        let expected = (0.9 * 0.7) / (0.9 * 0.7 + 0.2 * 0.3);
        assert!((p - expected).abs() < 1e-12);
        assert!((p - 0.9130).abs() < 1e-4);
    }

    #[test]
    fn concrete_free_posterior() {
        let m = SensorModel::new(0.9, 0.8).unwrap();
        let p = m.posterior(0.7, Observation::NotObstacle);
        let expected = (0.1 * 0.7) / (0.1 * 0.7 + 0.8 * 0.3);
        assert!((p - expected).abs() < 1e-12);
    }

    #[test]
    fn no_observation_is_noop() {
        let m = SensorModel::new(0.9, 0.8).unwrap();
        assert_eq!(m.posterior(0.42, Observation::None), 0.42);
    }

    #[test]
    fn observation_from_reading() {
        assert_eq!(Observation::from_reading(true), Observation::Obstacle);
        assert_eq!(Observation::from(Some(false)), Observation::NotObstacle);
        assert_eq!(Observation::from(None), Observation::None);
    }
}

// ── Fusion ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod fusion_tests {
    use super::*;

    #[test]
    fn repeated_obstacle_converges_monotonically() {
        let f = fusion(1, 1, 0.7, 0.97, 0.9);
        let mut prev = f.probability(0, 0);
        for step in 0..50 {
            f.observe(0, 0, Observation::Obstacle);
            let next = f.probability(0, 0);
            if prev < PROBABILITY_CEILING {
                assert!(next > prev, "step {step}: {prev} -> {next}");
            } else {
                assert_eq!(next, PROBABILITY_CEILING);
            }
            assert!(next < 1.0);
            prev = next;
        }
        assert_eq!(prev, PROBABILITY_CEILING);
    }

    #[test]
    fn repeated_free_never_reaches_zero() {
        let f = fusion(1, 1, 0.7, 0.97, 0.9);
        for _ in 0..200 {
            f.observe(0, 0, Observation::NotObstacle);
        }
        assert_eq!(f.probability(0, 0), PROBABILITY_FLOOR);

        // Still revisable after saturating.
        f.observe(0, 0, Observation::Obstacle);
        assert!(f.probability(0, 0) > PROBABILITY_FLOOR);
    }

    #[test]
    fn fuse_block_touches_only_covered_cells() {
        let f = fusion(4, 5, 0.5, 0.9, 0.8);
        let block = ObservationBlock::filled(2, 3, Observation::Obstacle);
        f.fuse_block(1, 2, &block);

        let updated = bayes_obstacle(0.5, 0.9, 0.8);
        let grid = f.snapshot();
        for ((r, c), p) in grid.iter() {
            let inside = (1..3).contains(&r) && (2..5).contains(&c);
            let want = if inside { updated } else { 0.5 };
            assert!((p - want).abs() < 1e-12, "cell ({r}, {c}) = {p}");
        }
    }

    #[test]
    fn fuse_block_twice_composes_sequentially() {
        let (tp, tn) = (0.97, 0.9);
        let f = fusion(3, 3, 0.7, tp, tn);
        let block = ObservationBlock::from_rows(vec![
            vec![Observation::Obstacle, Observation::NotObstacle],
            vec![Observation::None, Observation::Obstacle],
        ])
        .unwrap();
        f.fuse_block(0, 0, &block);
        f.fuse_block(0, 0, &block);

        let once = bayes_obstacle(0.7, tp, tn);
        let twice = bayes_obstacle(once, tp, tn);
        assert!((f.probability(0, 0) - twice).abs() < 1e-12);
        assert!((f.probability(1, 1) - twice).abs() < 1e-12);
        assert_eq!(f.probability(1, 0), 0.7);

        let free_once = ((1.0 - tp) * 0.7) / ((1.0 - tp) * 0.7 + tn * 0.3);
        let free_twice = ((1.0 - tp) * free_once) / ((1.0 - tp) * free_once + tn * (1.0 - free_once));
        assert!((f.probability(0, 1) - free_twice).abs() < 1e-12);
    }

    #[test]
    fn classify_against_thresholds() {
        let f = fusion(1, 3, 0.5, 0.97, 0.9);
        f.observe(0, 0, Observation::Obstacle);
        f.observe(0, 0, Observation::Obstacle);
        f.observe(0, 0, Observation::Obstacle);
        f.observe(0, 2, Observation::NotObstacle);
        f.observe(0, 2, Observation::NotObstacle);

        assert_eq!(f.classify(0, 0), Classification::Obstacle);
        assert_eq!(f.classify(0, 1), Classification::Unknown);
        assert_eq!(f.classify(0, 2), Classification::NotObstacle);

        let counts = f.class_counts();
        assert_eq!((counts.obstacle, counts.not_obstacle, counts.unknown), (1, 1, 1));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn observe_out_of_range_panics() {
        fusion(2, 2, 0.5, 0.9, 0.9).observe(2, 0, Observation::Obstacle);
    }

    #[test]
    #[should_panic(expected = "exceeds")]
    fn block_overhanging_grid_panics() {
        let f = fusion(3, 3, 0.5, 0.9, 0.9);
        f.fuse_block(2, 2, &ObservationBlock::filled(2, 2, Observation::Obstacle));
    }

    #[test]
    fn invalid_configuration_rejected() {
        let bad_prior = GridConfig { prior: 1.0, ..GridConfig::default() };
        assert!(OccupancyGridFusion::new(2, 2, &bad_prior).is_err());
        let bad_rate = GridConfig { true_negative: 0.0, ..GridConfig::default() };
        assert!(OccupancyGridFusion::new(2, 2, &bad_rate).is_err());
        assert!(OccupancyGridFusion::new(0, 2, &GridConfig::default()).is_err());
    }

    #[test]
    fn ragged_rows_rejected() {
        let rows = vec![
            vec![Observation::None, Observation::None],
            vec![Observation::None],
            vec![Observation::None, Observation::None, Observation::None],
        ];
        assert!(ObservationBlock::from_rows(rows).is_err());
        assert!(ObservationBlock::new(2, 2, vec![Observation::None; 3]).is_err());
    }
}

// ── Concurrent readers ────────────────────────────────────────────────────────

#[cfg(test)]
mod concurrency_tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    use super::*;

    /// Whole-grid blocks keep every cell equal, so any snapshot with two
    /// different values would be a torn read.
    #[test]
    fn readers_never_see_a_partial_block() {
        let f = Arc::new(fusion(32, 32, 0.3, 0.6, 0.55));
        let done = Arc::new(AtomicBool::new(false));

        let reader = {
            let f = Arc::clone(&f);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut checked = 0usize;
                while !done.load(Ordering::Acquire) || checked == 0 {
                    let grid = f.snapshot();
                    let first = grid.get(0, 0);
                    assert!(grid.as_slice().iter().all(|&p| p == first), "torn snapshot");
                    f.with_grid(|g| {
                        let first = g.get(0, 0);
                        assert!(g.as_slice().iter().all(|&p| p == first), "torn locked read");
                    });
                    checked += 1;
                }
                checked
            })
        };

        let block = ObservationBlock::filled(32, 32, Observation::Obstacle);
        let free = ObservationBlock::filled(32, 32, Observation::NotObstacle);
        for i in 0..400 {
            f.fuse_block(0, 0, if i % 3 == 0 { &free } else { &block });
        }
        done.store(true, Ordering::Release);

        let checked = reader.join().expect("reader panicked");
        assert!(checked > 0);
    }
}
