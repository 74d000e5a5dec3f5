//! Field functions and their composition.
//!
//! A field maps a plane position to a steering vector.  The three shapes are
//! a closed set, so they are modelled as an enum of plain parameter structs
//! rather than boxed closures: fields are cheap to build, `Copy`, and can be
//! inspected or sampled after the fact (the visualization sink does both).
//!
//! # Radial falloff
//!
//! Repulsion and tangential fields share one magnitude profile `w(d)` over the
//! distance `d` from their center:
//!
//! ```text
//!   w(d) = 1                 d ≤ inner
//!        = (inner / d)^exp   inner < d ≤ outer
//!        = 0                 d > outer
//! ```
//!
//! `w` never exceeds 1, so a field's magnitude is bounded by its `strength`
//! even at `d = 0`, and it is non-increasing in `d` across the whole range.

use bz_core::Vec2;

/// Direction used when a position coincides with a field's center.
const DEGENERATE_DIRECTION: Vec2 = Vec2::new(1.0, 0.0);

/// Radial weight in `[0, 1]`; see the module docs.
#[inline]
fn falloff(d: f64, inner: f64, outer: f64, exponent: f64) -> f64 {
    if d > outer {
        0.0
    } else if d <= inner {
        1.0
    } else {
        (inner / d).powf(exponent)
    }
}

/// Unit vector from `center` toward `p`.
#[inline]
fn away_from(center: Vec2, p: Vec2) -> Vec2 {
    (p - center).normalized().unwrap_or(DEGENERATE_DIRECTION)
}

// ── Shapes ────────────────────────────────────────────────────────────────────

/// Pushes away from `center`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Repulsion {
    pub center:       Vec2,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub exponent:     f64,
    /// Maximum magnitude, reached at and inside `inner_radius`.
    pub strength:     f64,
}

impl Repulsion {
    pub fn evaluate(&self, p: Vec2) -> Vec2 {
        let d = self.center.distance(p);
        let w = falloff(d, self.inner_radius, self.outer_radius, self.exponent);
        if w == 0.0 {
            return Vec2::ZERO;
        }
        away_from(self.center, p) * (self.strength * w)
    }
}

/// Circles `center` counter-clockwise: the repulsion direction rotated 90°.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Tangential {
    pub center:       Vec2,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub exponent:     f64,
    pub strength:     f64,
}

impl Tangential {
    pub fn evaluate(&self, p: Vec2) -> Vec2 {
        let d = self.center.distance(p);
        let w = falloff(d, self.inner_radius, self.outer_radius, self.exponent);
        if w == 0.0 {
            return Vec2::ZERO;
        }
        away_from(self.center, p).perp() * (self.strength * w)
    }
}

/// Pulls toward `target`.
///
/// Inside `radius` the goal counts as reached and the pull is zero.  Across
/// the slow zone `radius < d < radius + spread` the pull ramps up as
/// `1 - (1 - t)^exponent` with `t = (d - radius) / spread`; beyond it the pull
/// is constant at `strength`.  A larger exponent keeps the pull near full
/// strength deeper into the slow zone, i.e. a more aggressive approach.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Attraction {
    pub target:   Vec2,
    pub radius:   f64,
    pub spread:   f64,
    pub exponent: f64,
    pub strength: f64,
}

impl Attraction {
    pub fn evaluate(&self, p: Vec2) -> Vec2 {
        let d = self.target.distance(p);
        if d <= self.radius {
            return Vec2::ZERO;
        }
        let t = (d - self.radius) / self.spread;
        let w = if t >= 1.0 { 1.0 } else { 1.0 - (1.0 - t).powf(self.exponent) };
        // d > radius ≥ 0 here, so the direction is well defined.
        (self.target - p) * (self.strength * w / d)
    }
}

// ── FieldFunction ─────────────────────────────────────────────────────────────

/// One contribution to an agent's steering field.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FieldFunction {
    Repulsion(Repulsion),
    Attraction(Attraction),
    Tangential(Tangential),
}

impl FieldFunction {
    /// Field vector at `p`.
    #[inline]
    pub fn evaluate(&self, p: Vec2) -> Vec2 {
        match self {
            FieldFunction::Repulsion(f)  => f.evaluate(p),
            FieldFunction::Attraction(f) => f.evaluate(p),
            FieldFunction::Tangential(f) => f.evaluate(p),
        }
    }
}

impl From<Repulsion> for FieldFunction {
    fn from(f: Repulsion) -> Self {
        FieldFunction::Repulsion(f)
    }
}

impl From<Attraction> for FieldFunction {
    fn from(f: Attraction) -> Self {
        FieldFunction::Attraction(f)
    }
}

impl From<Tangential> for FieldFunction {
    fn from(f: Tangential) -> Self {
        FieldFunction::Tangential(f)
    }
}

// ── ComposedField ─────────────────────────────────────────────────────────────

/// The bag of fields built for one agent on one tick.
///
/// Evaluation is the plain vector sum of every member, so the result does not
/// depend on insertion order beyond floating-point rounding.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComposedField {
    fields: Vec<FieldFunction>,
}

impl ComposedField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, f: impl Into<FieldFunction>) {
        self.fields.push(f.into());
    }

    pub fn evaluate(&self, p: Vec2) -> Vec2 {
        self.fields.iter().map(|f| f.evaluate(p)).sum()
    }

    pub fn fields(&self) -> &[FieldFunction] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<FieldFunction> for ComposedField {
    fn from_iter<I: IntoIterator<Item = FieldFunction>>(iter: I) -> Self {
        Self { fields: iter.into_iter().collect() }
    }
}

impl Extend<FieldFunction> for ComposedField {
    fn extend<I: IntoIterator<Item = FieldFunction>>(&mut self, iter: I) {
        self.fields.extend(iter);
    }
}
