//! Destruction presets: the per-quality-tier knobs for a line-clear explosion.

use serde::{Deserialize, Serialize};

use crate::allocator::FragmentWeights;
use crate::constants::*;
use crate::error::{validate_range, DestructionError, DestructionResult};
use crate::velocity::{LifetimeRange, MagnitudeRange};

/// Render quality tier a row was scheduled under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QualityTier {
    Low,
    #[default]
    Ultra,
}

impl QualityTier {
    pub fn preset(self) -> DestructionPreset {
        match self {
            QualityTier::Low => DestructionPreset::low(),
            QualityTier::Ultra => DestructionPreset::ultra(),
        }
    }
}

/// Inclusive fragment budget range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

/// Value object describing how violently and for how long a cube breaks apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestructionPreset {
    /// Total fragment budget per cube; split by the count allocator.
    pub fragment_count: CountRange,
    /// Face / edge / dust share of the budget.  Only the dust bucket spawns
    /// extra fragments; shard fragments follow the template set.
    pub fragment_weights: FragmentWeights,
    pub lifetime: LifetimeRange,
    pub radial_speed: MagnitudeRange,
    pub tangential_speed: MagnitudeRange,
    pub vertical_speed: MagnitudeRange,
    /// Floor and wall contacts are simulated only when set.
    pub full_physics: bool,
    pub linear_drag: f32,
    pub angular_drag: f32,
    pub gravity_scale: f32,
    pub floor_restitution: f32,
    pub floor_friction: f32,
    pub wall_restitution: f32,
    pub wall_friction: f32,
}

impl DestructionPreset {
    pub fn ultra() -> Self {
        Self {
            fragment_count: CountRange { min: 40, max: 60 },
            fragment_weights: FragmentWeights::default(),
            lifetime: LifetimeRange {
                min_ms: 1400.0,
                max_ms: 2400.0,
            },
            radial_speed: MagnitudeRange::new(2.5, 5.0),
            tangential_speed: MagnitudeRange::new(0.0, 1.5),
            vertical_speed: MagnitudeRange::new(1.5, 4.0),
            full_physics: true,
            linear_drag: LINEAR_DRAG,
            angular_drag: ANGULAR_DRAG,
            gravity_scale: 1.0,
            floor_restitution: FLOOR_BOUNCE,
            floor_friction: FLOOR_FRICTION,
            wall_restitution: WALL_RESTITUTION,
            wall_friction: WALL_FRICTION,
        }
    }

    pub fn low() -> Self {
        Self {
            fragment_count: CountRange { min: 12, max: 20 },
            fragment_weights: FragmentWeights {
                face_shards: 0.6,
                edge_shards: 0.3,
                dust: 0.1,
            },
            lifetime: LifetimeRange {
                min_ms: 800.0,
                max_ms: 1400.0,
            },
            radial_speed: MagnitudeRange::new(2.0, 4.0),
            tangential_speed: MagnitudeRange::new(0.0, 1.0),
            vertical_speed: MagnitudeRange::new(1.0, 3.0),
            full_physics: false,
            linear_drag: LINEAR_DRAG * 1.5,
            angular_drag: ANGULAR_DRAG * 1.5,
            gravity_scale: 1.2,
            floor_restitution: 0.0,
            floor_friction: 1.0,
            wall_restitution: 0.0,
            wall_friction: 1.0,
        }
    }

    /// Check every range; presets should be validated before a row is scheduled.
    pub fn validate(&self) -> DestructionResult<()> {
        if self.fragment_count.min == 0 || self.fragment_count.max < self.fragment_count.min {
            return Err(DestructionError::InvalidRange {
                name: "fragment count",
                min: self.fragment_count.min as f32,
                max: self.fragment_count.max as f32,
            });
        }
        self.fragment_weights.validate()?;
        if validate_range("lifetime", self.lifetime.min_ms, self.lifetime.max_ms).is_err() {
            return Err(DestructionError::InvalidLifetimeRange {
                min_ms: self.lifetime.min_ms,
                max_ms: self.lifetime.max_ms,
            });
        }
        validate_range("radial speed", self.radial_speed.min, self.radial_speed.max)?;
        validate_range(
            "tangential speed",
            self.tangential_speed.min,
            self.tangential_speed.max,
        )?;
        validate_range("vertical speed", self.vertical_speed.min, self.vertical_speed.max)?;
        for (name, value) in [
            ("linear drag", self.linear_drag),
            ("angular drag", self.angular_drag),
            ("gravity scale", self.gravity_scale),
            ("floor restitution", self.floor_restitution),
            ("floor friction", self.floor_friction),
            ("wall restitution", self.wall_restitution),
            ("wall friction", self.wall_friction),
        ] {
            validate_range(name, value, value)?;
        }
        Ok(())
    }
}

impl Default for DestructionPreset {
    fn default() -> Self {
        Self::ultra()
    }
}
