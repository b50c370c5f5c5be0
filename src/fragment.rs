//! Debris fragments and their per-kind tuning table.
//!
//! A [`Fragment`] is one simulated piece of a destroyed cube.  Behavioural
//! differences between kinds are data, not code: [`FragmentKind::config`]
//! returns the multipliers the fragment builder samples through.
//!
//! | Kind        | Material | Source                    | Speed | Lifetime | Scale      |
//! |-------------|----------|---------------------------|-------|----------|------------|
//! | `FaceShard` | `Face`   | front-face shard template | 1.00  | 1.00     | 0.95–1.00  |
//! | `EdgeShard` | `Gold`   | other-face shard template | 0.85  | 0.90     | 0.90–1.00  |
//! | `Dust`      | `Dust`   | none (filler particles)   | 1.30  | 0.55     | 0.06–0.14  |

use bevy::color::Color;
use bevy::math::{Quat, Rect, Vec3};

use crate::velocity::MagnitudeRange;

/// Behavioural category of a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FragmentKind {
    FaceShard,
    EdgeShard,
    Dust,
}

/// Render material a fragment is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MaterialId {
    /// Textured cube face (carries a UV rect into the face atlas).
    Face,
    /// Gold bevel / interior material.
    Gold,
    /// Untextured dust.
    Dust,
}

/// Tuning for one fragment kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentKindConfig {
    pub material: MaterialId,
    /// Multiplies the preset's radial / tangential / vertical speed samples.
    pub speed_multiplier: f32,
    /// Multiplies the sampled lifetime.
    pub lifetime_multiplier: f32,
    /// Uniform scale range, as a fraction of the cube size.
    pub scale: MagnitudeRange,
    /// Radius of the random velocity jitter (units / s).
    pub jitter: f32,
    /// Angular speed range (rad / s) before mass scaling.
    pub angular_speed: MagnitudeRange,
    /// Default mass when the template gives no better estimate.
    pub base_mass: f32,
}

const FACE_SHARD: FragmentKindConfig = FragmentKindConfig {
    material: MaterialId::Face,
    speed_multiplier: 1.0,
    lifetime_multiplier: 1.0,
    scale: MagnitudeRange::new(0.95, 1.0),
    jitter: 0.6,
    angular_speed: MagnitudeRange::new(2.0, 7.0),
    base_mass: 1.0,
};

const EDGE_SHARD: FragmentKindConfig = FragmentKindConfig {
    material: MaterialId::Gold,
    speed_multiplier: 0.85,
    lifetime_multiplier: 0.9,
    scale: MagnitudeRange::new(0.9, 1.0),
    jitter: 0.8,
    angular_speed: MagnitudeRange::new(3.0, 9.0),
    base_mass: 1.0,
};

const DUST: FragmentKindConfig = FragmentKindConfig {
    material: MaterialId::Dust,
    speed_multiplier: 1.3,
    lifetime_multiplier: 0.55,
    scale: MagnitudeRange::new(0.06, 0.14),
    jitter: 1.5,
    angular_speed: MagnitudeRange::new(4.0, 12.0),
    base_mass: 0.2,
};

impl FragmentKind {
    pub fn config(self) -> &'static FragmentKindConfig {
        match self {
            FragmentKind::FaceShard => &FACE_SHARD,
            FragmentKind::EdgeShard => &EDGE_SHARD,
            FragmentKind::Dust => &DUST,
        }
    }

    pub fn material(self) -> MaterialId {
        self.config().material
    }
}

/// One piece of debris.  Owned exclusively by its cube simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    /// Axis × rad/s, world space.
    pub angular_velocity: Vec3,
    pub age_ms: f32,
    pub lifetime_ms: f32,
    /// Opacity in `[0, 1]`; the fragment is dropped when this reaches zero.
    pub fade: f32,
    /// Unique per simulation state; stable for the fragment's whole life.
    pub instance_id: u32,
    pub material_id: MaterialId,
    pub template_id: Option<u32>,
    /// Index of this fragment within its cube.
    pub shard_id: Option<u32>,
    pub uv_rect: Option<Rect>,
    pub color_tint: Option<Color>,
    pub mass: Option<f32>,
    /// Per-fragment overrides of the engine defaults.
    pub linear_drag: Option<f32>,
    pub angular_drag: Option<f32>,
    /// Elapsed rest-fade countdown, once the fragment has come to rest.
    pub rest_elapsed_ms: Option<f32>,
}

impl Fragment {
    /// A fragment at rest at `position` with full opacity.
    pub fn new(kind: FragmentKind, position: Vec3, lifetime_ms: f32, instance_id: u32) -> Self {
        Self {
            kind,
            position,
            velocity: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            angular_velocity: Vec3::ZERO,
            age_ms: 0.0,
            lifetime_ms,
            fade: 1.0,
            instance_id,
            material_id: kind.material(),
            template_id: None,
            shard_id: None,
            uv_rect: None,
            color_tint: None,
            mass: None,
            linear_drag: None,
            angular_drag: None,
            rest_elapsed_ms: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.fade > 0.0 && self.age_ms < self.lifetime_ms
    }
}
