//! Seeded view and material sampling.
//!
//! All randomness of a planning run comes from one [`RandomSource`] that is built once
//! and passed by `&mut` through the model loop. Each planned model consumes exactly four
//! draws, in this order:
//!
//! 1. `theta` for the view direction
//! 2. `phi` for the view direction
//! 3. `ks` for the material
//! 4. `ns` for the material
//!
//! ```
//! use render_planner::sampling::{sample_material, sample_view, SeededStream};
//!
//! let mut rng = SeededStream::fixed();
//! let view = sample_view(&mut rng);
//! let material = sample_material(&mut rng);
//! assert!(view.y > 0.0);
//! assert!((material.kd + material.ks - 1.0).abs() < 1e-12);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::fmt;

/// Distance from the camera to the model center.
pub const CAMERA_DISTANCE: f64 = 2.0;

/// Upper bound (exclusive) of the specular weight.
pub const MAX_SPECULAR: f64 = 0.2;

/// Upper bound (exclusive) of the shininess exponent.
pub const MAX_SHININESS: f64 = 1000.0;

/// A stream of uniform draws in `[0, 1)`.
pub trait RandomSource {
    /// Next uniform value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Seed the stream was built from, if it has one.
    fn seed(&self) -> Option<u64> {
        None
    }
}

/// The run-wide seeded generator.
///
/// Backed by [`StdRng`], whose algorithm `rand` may change between releases. The same
/// seed yields the same draws only while the `rand` version in `Cargo.lock` stays the
/// same; commit the lockfile to keep generated scripts byte-identical across builds.
#[derive(Debug, Clone)]
pub struct SeededStream {
    seed: u64,
    rng: StdRng,
}

impl SeededStream {
    /// Seed used by every planning run.
    pub const DEFAULT_SEED: u64 = 0;

    /// Create a stream from an explicit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create a stream seeded with [`SeededStream::DEFAULT_SEED`].
    pub fn fixed() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

impl Default for SeededStream {
    fn default() -> Self {
        Self::fixed()
    }
}

impl RandomSource for SeededStream {
    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn seed(&self) -> Option<u64> {
        Some(self.seed)
    }
}

/// Camera position on the upper hemisphere of radius [`CAMERA_DISTANCE`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ViewSample {
    /// Build a view from spherical angles (Y-up).
    ///
    /// `theta` is measured from the +Y axis, `phi` around it starting at +X.
    pub fn from_angles(theta: f64, phi: f64) -> Self {
        Self {
            x: theta.sin() * phi.cos() * CAMERA_DISTANCE,
            y: theta.cos() * CAMERA_DISTANCE,
            z: theta.sin() * phi.sin() * CAMERA_DISTANCE,
        }
    }

    /// Distance from the origin.
    pub fn radius(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Formats as `x,y,z` with six decimals, the form the renderer expects in `-Dview`.
impl fmt::Display for ViewSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6},{:.6}", self.x, self.y, self.z)
    }
}

/// Specular/diffuse split for one model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialSample {
    /// Diffuse weight, always `1 - ks`
    pub kd: f64,
    /// Specular weight in `[0, 0.2)`
    pub ks: f64,
    /// Shininess exponent in `[0, 1000)`
    pub ns: f64,
}

impl MaterialSample {
    /// Build a material from a specular weight and shininess.
    pub fn new(ks: f64, ns: f64) -> Self {
        Self {
            kd: 1.0 - ks,
            ks,
            ns,
        }
    }
}

/// Draw a viewing direction restricted to the upper hemisphere.
///
/// `theta` lies in `[0, π/2)`, so the camera never looks from below the equator
/// and `y` stays strictly positive.
pub fn sample_view<R: RandomSource + ?Sized>(rng: &mut R) -> ViewSample {
    let theta = rng.next_unit() * PI * 0.5;
    let phi = rng.next_unit() * PI * 2.0;
    ViewSample::from_angles(theta, phi)
}

/// Draw a material split.
pub fn sample_material<R: RandomSource + ?Sized>(rng: &mut R) -> MaterialSample {
    let ks = rng.next_unit() * MAX_SPECULAR;
    let ns = rng.next_unit() * MAX_SHININESS;
    MaterialSample::new(ks, ns)
}

/// Replays a fixed list of draws, cycling when exhausted.
#[cfg(test)]
pub(crate) struct FixedSequence {
    values: Vec<f64>,
    cursor: usize,
}

#[cfg(test)]
impl FixedSequence {
    pub(crate) fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }

    pub(crate) fn drawn(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
impl RandomSource for FixedSequence {
    fn next_unit(&mut self) -> f64 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_stream_is_reproducible() {
        let mut a = SeededStream::fixed();
        let mut b = SeededStream::fixed();
        for _ in 0..64 {
            assert_eq!(a.next_unit().to_bits(), b.next_unit().to_bits());
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = SeededStream::new(0);
        let mut b = SeededStream::new(1);
        let same = (0..16).all(|_| a.next_unit() == b.next_unit());
        assert!(!same);
        assert_eq!(b.seed(), Some(1));
    }

    #[test]
    fn test_unit_draws_in_range() {
        let mut rng = SeededStream::fixed();
        for _ in 0..1000 {
            let u = rng.next_unit();
            assert!((0.0..1.0).contains(&u), "draw out of range: {}", u);
        }
    }

    #[test]
    fn test_view_on_upper_hemisphere() {
        let mut rng = SeededStream::fixed();
        for _ in 0..1000 {
            let view = sample_view(&mut rng);
            assert!(view.y > 0.0, "view below equator: {:?}", view);
            assert!((view.radius() - CAMERA_DISTANCE).abs() < 1e-9);
        }
    }

    #[test]
    fn test_view_from_fixed_draws() {
        // theta = 0 puts the camera on the +Y axis
        let mut rng = FixedSequence::new(vec![0.0, 0.25]);
        let view = sample_view(&mut rng);
        assert!(view.x.abs() < 1e-12);
        assert!((view.y - 2.0).abs() < 1e-12);
        assert!(view.z.abs() < 1e-12);

        // theta = π/4, phi = π/2
        let mut rng = FixedSequence::new(vec![0.5, 0.25]);
        let view = sample_view(&mut rng);
        let s = std::f64::consts::FRAC_1_SQRT_2 * 2.0;
        assert!(view.x.abs() < 1e-9);
        assert!((view.y - s).abs() < 1e-9);
        assert!((view.z - s).abs() < 1e-9);
    }

    #[test]
    fn test_view_display_six_decimals() {
        let view = ViewSample {
            x: 1.0,
            y: 0.5,
            z: -0.25,
        };
        assert_eq!(view.to_string(), "1.000000,0.500000,-0.250000");
    }

    #[test]
    fn test_material_conservation() {
        let mut rng = SeededStream::fixed();
        for _ in 0..1000 {
            let m = sample_material(&mut rng);
            assert!((m.kd + m.ks - 1.0).abs() < 1e-12);
            assert!((0.0..MAX_SPECULAR).contains(&m.ks));
            assert!((0.0..MAX_SHININESS).contains(&m.ns));
        }
    }

    #[test]
    fn test_material_from_fixed_draws() {
        let mut rng = FixedSequence::new(vec![0.5, 0.1]);
        let m = sample_material(&mut rng);
        assert!((m.ks - 0.1).abs() < 1e-12);
        assert!((m.kd - 0.9).abs() < 1e-12);
        assert!((m.ns - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_view_then_material_consumes_four_draws() {
        let mut rng = FixedSequence::new(vec![0.1, 0.2, 0.3, 0.4]);
        let _ = sample_view(&mut rng);
        assert_eq!(rng.drawn(), 2);
        let m = sample_material(&mut rng);
        assert_eq!(rng.drawn(), 4);
        assert!((m.ks - 0.06).abs() < 1e-12);
        assert!((m.ns - 400.0).abs() < 1e-9);
    }
}
