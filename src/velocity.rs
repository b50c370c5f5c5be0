//! Initial linear / angular velocity and lifetime sampling for new fragments.
//!
//! Velocities are composed in a per-cube basis: `outward` points away from the
//! tower axis, `tangent` runs around the ring, `up` is world up.  Heavier
//! fragments launch slower (`1/√mass`) and spin slower (`mass^-0.35`).

use std::f32::consts::TAU;

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::{ANGULAR_MASS_EXPONENT, DEFAULT_LIFETIME_MS};
use crate::error::{validate_range, DestructionError, DestructionResult};
use crate::random::RandomSource;

/// Orthonormal launch frame for one cube.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityBasis {
    pub outward: Vec3,
    pub tangent: Vec3,
    pub up: Vec3,
}

/// Speeds along each basis axis (world units / s).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LaunchSpeeds {
    pub radial: f32,
    pub tangential: f32,
    pub up: f32,
}

/// Optional wave + jitter added on top of the basis speeds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VelocityPerturbation {
    /// Amplitude of the phase-dependent wave (units / s).
    pub wave_amplitude: f32,
    /// Phase in radians; a cube's position along the row is a good choice.
    pub wave_phase: f32,
    /// Radius of the random jitter ball (units / s).
    pub jitter: f32,
}

/// Inclusive `[min, max]` range of a scalar magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeRange {
    pub min: f32,
    pub max: f32,
}

impl MagnitudeRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Sample uniformly between `min` and `max`.  No validation.
    pub fn sample<R: RandomSource + ?Sized>(&self, rng: &mut R) -> f32 {
        rng.range(self.min, self.max)
    }

    pub fn scaled(&self, factor: f32) -> Self {
        Self::new(self.min * factor, self.max * factor)
    }
}

/// Lifetime range in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LifetimeRange {
    pub min_ms: f32,
    pub max_ms: f32,
}

impl Default for LifetimeRange {
    fn default() -> Self {
        Self {
            min_ms: DEFAULT_LIFETIME_MS.0,
            max_ms: DEFAULT_LIFETIME_MS.1,
        }
    }
}

/// Build the launch frame.  Degenerate inputs fall back to `+Z` outward and
/// any vector orthogonal to `up` for the tangent.
pub fn compute_velocity_basis(cube_position: Vec3, center: Vec3, up: Vec3) -> VelocityBasis {
    let up = up.try_normalize().unwrap_or(Vec3::Y);
    let outward = (cube_position - center).try_normalize().unwrap_or(Vec3::Z);
    let tangent = up
        .cross(outward)
        .try_normalize()
        .unwrap_or_else(|| up.any_orthonormal_vector());
    VelocityBasis {
        outward,
        tangent,
        up,
    }
}

/// `outward·radial + tangent·tangential + up·up`, plus optional perturbation,
/// all scaled by `1/√mass`.  Non-positive or non-finite mass counts as 1.
pub fn compose_initial_velocity<R: RandomSource + ?Sized>(
    basis: &VelocityBasis,
    speeds: LaunchSpeeds,
    perturbation: Option<VelocityPerturbation>,
    mass: Option<f32>,
    rng: &mut R,
) -> Vec3 {
    let mut velocity =
        basis.outward * speeds.radial + basis.tangent * speeds.tangential + basis.up * speeds.up;

    if let Some(p) = perturbation {
        let (sin, cos) = p.wave_phase.sin_cos();
        velocity += basis.outward * (p.wave_amplitude * sin)
            + basis.up * (p.wave_amplitude * 0.5 * cos);
        if p.jitter > 0.0 {
            velocity += unit_sphere_direction(rng) * (p.jitter * rng.next_unit().cbrt());
        }
    }

    velocity * mass_speed_scale(mass)
}

fn mass_speed_scale(mass: Option<f32>) -> f32 {
    match mass {
        Some(m) if m.is_finite() && m > 0.0 => 1.0 / m.sqrt(),
        _ => 1.0,
    }
}

/// Uniform direction on the unit sphere from two draws (azimuth, cos polar).
pub fn unit_sphere_direction<R: RandomSource + ?Sized>(rng: &mut R) -> Vec3 {
    let azimuth = rng.next_unit() * TAU;
    let cos_polar = rng.next_unit() * 2.0 - 1.0;
    let sin_polar = (1.0 - cos_polar * cos_polar).max(0.0).sqrt();
    let (sin_az, cos_az) = azimuth.sin_cos();
    Vec3::new(sin_polar * cos_az, cos_polar, sin_polar * sin_az)
}

/// Random direction with a length interpolated in `[min, max]`.
///
/// `max == 0` yields the zero vector; inverted or negative bounds fail.
pub fn random_vector_within_sphere<R: RandomSource + ?Sized>(
    range: MagnitudeRange,
    rng: &mut R,
) -> DestructionResult<Vec3> {
    validate_range("sphere magnitude", range.min, range.max)?;
    if range.max == 0.0 {
        return Ok(Vec3::ZERO);
    }
    let direction = unit_sphere_direction(rng);
    Ok(direction * range.sample(rng))
}

/// Angular velocity with a uniform axis and a magnitude in the range scaled by
/// `mass^-0.35`.
pub fn generate_angular_velocity<R: RandomSource + ?Sized>(
    range: MagnitudeRange,
    mass: Option<f32>,
    rng: &mut R,
) -> DestructionResult<Vec3> {
    if !range.min.is_finite() || !range.max.is_finite() || range.min < 0.0 || range.max < range.min
    {
        return Err(DestructionError::InvalidAngularSpeedRange {
            min: range.min,
            max: range.max,
        });
    }
    let factor = match mass {
        Some(m) if m.is_finite() && m > 0.0 => m.powf(ANGULAR_MASS_EXPONENT),
        _ => 1.0,
    };
    let scaled = range.scaled(factor);
    if scaled.max == 0.0 {
        return Ok(Vec3::ZERO);
    }
    let direction = unit_sphere_direction(rng);
    Ok(direction * scaled.sample(rng))
}

/// Lifetime interpolated in `[min_ms, max_ms]`.
pub fn generate_lifetime_ms<R: RandomSource + ?Sized>(
    range: LifetimeRange,
    rng: &mut R,
) -> DestructionResult<f32> {
    if validate_range("lifetime", range.min_ms, range.max_ms).is_err() {
        return Err(DestructionError::InvalidLifetimeRange {
            min_ms: range.min_ms,
            max_ms: range.max_ms,
        });
    }
    Ok(rng.range(range.min_ms, range.max_ms))
}
