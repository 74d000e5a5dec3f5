//! Planner tuning parameters.
//!
//! Typically loaded from a TOML file by the application crate (with the
//! `serde` feature) and passed to [`PotentialFieldPlanner::new`][crate::PotentialFieldPlanner::new],
//! which calls [`PlannerConfig::validate`].

use crate::{FieldError, FieldResult};

/// Shape of a repulsion or tangential field.
///
/// Radii are multiples of the game's unit length so the avoidance envelope
/// scales with tank size.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RadialParams {
    pub inner_units: f64,
    pub outer_units: f64,
    pub exponent:    f64,
    pub strength:    f64,
}

impl RadialParams {
    fn validate(&self, what: &str) -> FieldResult<()> {
        if !(self.inner_units > 0.0) {
            return Err(FieldError::Config(format!("{what}: inner radius must be positive")));
        }
        if !(self.outer_units > self.inner_units) {
            return Err(FieldError::Config(format!(
                "{what}: outer radius {} must exceed inner radius {}",
                self.outer_units, self.inner_units,
            )));
        }
        check_positive(what, "exponent", self.exponent)?;
        check_positive(what, "strength", self.strength)
    }
}

/// Shape of an orbit field around a flag carrier.
///
/// The inner radius follows the unit length; the outer radius is a fixed
/// distance in world units.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrbitParams {
    pub inner_units:  f64,
    pub outer_radius: f64,
    pub exponent:     f64,
    pub strength:     f64,
}

impl OrbitParams {
    fn validate(&self, what: &str) -> FieldResult<()> {
        check_positive(what, "inner radius", self.inner_units)?;
        check_positive(what, "outer radius", self.outer_radius)?;
        check_positive(what, "exponent", self.exponent)?;
        check_positive(what, "strength", self.strength)
    }

    /// `(inner, outer)` in world units, or an error if they are out of order.
    pub fn radii(&self, unit_length: f64) -> FieldResult<(f64, f64)> {
        let inner = self.inner_units * unit_length;
        if !(self.outer_radius > inner) {
            return Err(FieldError::Config(format!(
                "carrier_orbit: outer radius {} must exceed inner radius {inner}",
                self.outer_radius,
            )));
        }
        Ok((inner, self.outer_radius))
    }
}

/// Shape of the goal attraction.
///
/// The arrival radius is `radius + radius_units * unit_length`, so it can be
/// fixed, follow tank size, or both.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttractionParams {
    /// Fixed part of the arrival radius, in world units.
    pub radius:       f64,
    /// Part of the arrival radius that scales with unit length.
    #[cfg_attr(feature = "serde", serde(default))]
    pub radius_units: f64,
    /// Width of the slow zone beyond the arrival radius.
    pub spread:       f64,
    pub exponent:     f64,
    pub strength:     f64,
}

impl AttractionParams {
    /// Arrival radius in world units.
    pub fn arrival_radius(&self, unit_length: f64) -> f64 {
        self.radius + self.radius_units * unit_length
    }

    fn validate(&self, what: &str) -> FieldResult<()> {
        if !(self.radius >= 0.0 && self.radius_units >= 0.0) {
            return Err(FieldError::Config(format!("{what}: radius must be non-negative")));
        }
        check_positive(what, "spread", self.spread)?;
        check_positive(what, "exponent", self.exponent)?;
        check_positive(what, "strength", self.strength)
    }
}

fn check_positive(what: &str, name: &str, v: f64) -> FieldResult<()> {
    if v > 0.0 && v.is_finite() {
        Ok(())
    } else {
        Err(FieldError::Config(format!("{what}: {name} must be positive and finite, got {v}")))
    }
}

/// Every knob of [`PotentialFieldPlanner`][crate::PotentialFieldPlanner].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlannerConfig {
    /// One repulsion per living enemy.
    pub enemy:          RadialParams,
    /// One repulsion per shot in flight.
    pub shot:           RadialParams,
    /// One orbit field per teammate carrying a flag.
    pub carrier_orbit:  OrbitParams,
    /// Carrying a flag: head home.
    pub return_home:    AttractionParams,
    /// Chasing the enemy that holds our flag.
    pub intercept:      AttractionParams,
    /// Going for an enemy flag.
    pub capture:        AttractionParams,
    /// Angular velocity per radian of heading error.
    pub angular_gain:   f64,
    /// Forward speed requested on every steering command, in `(0, 1]`.
    pub speed:          f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            enemy:         RadialParams { inner_units: 1.0, outer_units: 5.0,  exponent: 2.0, strength: 1.0 },
            shot:          RadialParams { inner_units: 1.0, outer_units: 3.0,  exponent: 2.0, strength: 1.0 },
            carrier_orbit: OrbitParams { inner_units: 1.0, outer_radius: 80.0, exponent: 1.0, strength: 1.0 },
            return_home:   AttractionParams { radius: 0.0, radius_units: 0.0, spread: 10.0, exponent: 3.0, strength: 1.0 },
            intercept:     AttractionParams { radius: 0.0, radius_units: 1.0, spread: 20.0, exponent: 3.0, strength: 1.0 },
            capture:       AttractionParams { radius: 2.0, radius_units: 0.0, spread: 20.0, exponent: 2.0, strength: 1.0 },
            angular_gain:  2.0,
            speed:         1.0,
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> FieldResult<()> {
        self.enemy.validate("enemy")?;
        self.shot.validate("shot")?;
        self.carrier_orbit.validate("carrier_orbit")?;
        self.return_home.validate("return_home")?;
        self.intercept.validate("intercept")?;
        self.capture.validate("capture")?;
        check_positive("planner", "angular_gain", self.angular_gain)?;
        if !(self.speed > 0.0 && self.speed <= 1.0) {
            return Err(FieldError::Config(format!("planner: speed must be in (0, 1], got {}", self.speed)));
        }
        Ok(())
    }
}
