//! Per-fragment numeric integration.
//!
//! ## Step order
//!
//! Each call to [`step_fragment`] runs, in order:
//!
//! | # | Stage        | Effect                                                      |
//! |---|--------------|-------------------------------------------------------------|
//! | 1 | age          | `age += dt`; past lifetime → dead, `fade = 0`               |
//! | 2 | forces       | gravity · scale + wind − drag · v; angular decay + rotation |
//! | 3 | integrate    | semi-implicit Euler: `v += a·dt`, then `p += v·dt`          |
//! | 4 | floor        | clamp to floor; bounce or settle, horizontal friction       |
//! | 5 | radial limit | kill, damp outward velocity, or bounce off the wall         |
//! | 6 | rest-fade    | nearly stationary on the floor → fixed-length fade-out      |
//! | 7 | fade         | life-progress ramp, min'd with the rest-fade countdown      |
//!
//! Integration never fails.  Zero-length vectors are guarded before
//! normalising and every ratio is clamped to `[0, 1]`.

use bevy::math::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::fragment::Fragment;
use crate::lifecycle::CubeDestructionSim;
use crate::preset::DestructionPreset;

// ── Configuration ─────────────────────────────────────────────────────────────

/// Ground plane contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorConfig {
    pub floor_y: f32,
    /// Vertical restitution applied on a bouncing contact.
    pub bounce_factor: f32,
    /// Fraction of horizontal velocity removed per contact.
    pub floor_friction: f32,
    /// Slower contacts settle instead of bouncing.
    pub min_bounce_speed: f32,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            floor_y: FLOOR_Y,
            bounce_factor: FLOOR_BOUNCE,
            floor_friction: FLOOR_FRICTION,
            min_bounce_speed: MIN_BOUNCE_SPEED,
        }
    }
}

/// What happens to a fragment that leaves the radial limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RadiusResponse {
    /// Remove the fragment immediately.
    Kill,
    /// Clamp to the wall and remove a fraction of the outward velocity.
    Damp { radial_damping: f32 },
    /// Clamp to the wall and reflect the outward velocity inward.
    Bounce {
        restitution: f32,
        friction: f32,
        min_bounce_speed: f32,
    },
}

/// Cylindrical boundary around the tower axis (measured in the XZ plane).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusLimitConfig {
    pub center: Vec3,
    pub max_radius: f32,
    pub response: RadiusResponse,
}

impl Default for RadiusLimitConfig {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            max_radius: MAX_DEBRIS_RADIUS,
            response: RadiusResponse::Bounce {
                restitution: WALL_RESTITUTION,
                friction: WALL_FRICTION,
                min_bounce_speed: MIN_WALL_BOUNCE_SPEED,
            },
        }
    }
}

/// Early fade-out for fragments that have settled on the floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestFadeConfig {
    pub speed_threshold: f32,
    pub height_threshold: f32,
    pub duration_ms: f32,
}

impl Default for RestFadeConfig {
    fn default() -> Self {
        Self {
            speed_threshold: REST_SPEED_THRESHOLD,
            height_threshold: REST_HEIGHT_THRESHOLD,
            duration_ms: REST_FADE_MS,
        }
    }
}

/// Position- and time-varying sinusoidal wind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindConfig {
    /// Peak acceleration per axis (units / s²).
    pub strength: Vec3,
    /// Spatial frequency of the gust pattern (1 / units).
    pub spatial_frequency: f32,
    /// Multiplier on simulation time (1.0 = real time).
    pub time_scale: f32,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            strength: Vec3::new(0.6, 0.15, 0.6),
            spatial_frequency: 0.8,
            time_scale: 1.0,
        }
    }
}

/// Engine-wide physics configuration.  Sub-configs are optional; `None`
/// disables that stage entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FragmentPhysicsConfig {
    pub gravity: Vec3,
    pub gravity_scale: f32,
    pub linear_drag: f32,
    pub angular_drag: f32,
    pub floor: Option<FloorConfig>,
    pub radius_limit: Option<RadiusLimitConfig>,
    pub rest_fade: Option<RestFadeConfig>,
    pub wind: Option<WindConfig>,
    /// Life-progress fraction where fading starts.
    pub fade_start: f32,
    /// Life-progress fraction where the fragment is fully transparent.
    pub fade_end: f32,
}

impl Default for FragmentPhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::from_array(GRAVITY),
            gravity_scale: 1.0,
            linear_drag: LINEAR_DRAG,
            angular_drag: ANGULAR_DRAG,
            floor: Some(FloorConfig::default()),
            radius_limit: Some(RadiusLimitConfig::default()),
            rest_fade: Some(RestFadeConfig::default()),
            wind: None,
            fade_start: FADE_START,
            fade_end: FADE_END,
        }
    }
}

impl FragmentPhysicsConfig {
    /// A bare ballistic config: gravity only, no drag, contacts or fade ramp.
    pub fn ballistic(gravity: Vec3) -> Self {
        Self {
            gravity,
            gravity_scale: 1.0,
            linear_drag: 0.0,
            angular_drag: 0.0,
            floor: None,
            radius_limit: None,
            rest_fade: None,
            wind: None,
            fade_start: 1.0,
            fade_end: 1.0,
        }
    }

    /// Specialise `base` with a preset's drag, gravity and contact tuning.
    ///
    /// Presets without `full_physics` drop the floor and wall stages.
    pub fn for_preset(base: &FragmentPhysicsConfig, preset: &DestructionPreset) -> Self {
        let mut config = base.clone();
        config.linear_drag = preset.linear_drag;
        config.angular_drag = preset.angular_drag;
        config.gravity_scale = base.gravity_scale * preset.gravity_scale;

        if preset.full_physics {
            if let Some(floor) = config.floor.as_mut() {
                floor.bounce_factor = preset.floor_restitution;
                floor.floor_friction = preset.floor_friction;
            }
            if let Some(limit) = config.radius_limit.as_mut() {
                if let RadiusResponse::Bounce {
                    restitution,
                    friction,
                    ..
                } = &mut limit.response
                {
                    *restitution = preset.wall_restitution;
                    *friction = preset.wall_friction;
                }
            }
        } else {
            config.floor = None;
            config.radius_limit = None;
        }
        config
    }
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// Result of one fragment step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentStep {
    pub alive: bool,
    pub fade: f32,
}

impl FragmentStep {
    const DEAD: FragmentStep = FragmentStep {
        alive: false,
        fade: 0.0,
    };
}

/// Owns a physics config and steps fragments with it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FragmentPhysicsEngine {
    pub config: FragmentPhysicsConfig,
}

impl FragmentPhysicsEngine {
    pub fn new(config: FragmentPhysicsConfig) -> Self {
        Self { config }
    }

    pub fn step(&self, fragment: &mut Fragment, dt_ms: f32, time_ms: f32) -> FragmentStep {
        step_fragment(fragment, dt_ms, time_ms, &self.config)
    }

    pub fn update_cube(&self, sim: &mut CubeDestructionSim, dt_ms: f32, time_ms: f32) {
        update_cube_destruction_sim(sim, dt_ms, time_ms, &self.config);
    }
}

/// Advance one fragment by `dt_ms`.  `time_ms` drives the wind field only.
pub fn step_fragment(
    fragment: &mut Fragment,
    dt_ms: f32,
    time_ms: f32,
    config: &FragmentPhysicsConfig,
) -> FragmentStep {
    let dt_ms = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };

    // 1. Age
    fragment.age_ms += dt_ms;
    if fragment.age_ms >= fragment.lifetime_ms {
        fragment.fade = 0.0;
        return FragmentStep::DEAD;
    }
    let dt = dt_ms / 1000.0;

    // 2. Forces
    let linear_drag = fragment.linear_drag.unwrap_or(config.linear_drag).max(0.0);
    let angular_drag = fragment.angular_drag.unwrap_or(config.angular_drag).max(0.0);

    let mut acceleration = config.gravity * config.gravity_scale;
    if let Some(wind) = &config.wind {
        acceleration += wind_acceleration(wind, fragment.position, time_ms);
    }
    acceleration -= fragment.velocity * linear_drag;

    fragment.angular_velocity *= (-angular_drag * dt).exp();
    let spin = fragment.angular_velocity * dt;
    if spin.length_squared() > 0.0 {
        fragment.rotation = (Quat::from_scaled_axis(spin) * fragment.rotation).normalize();
    }

    // 3. Semi-implicit Euler
    fragment.velocity += acceleration * dt;
    fragment.position += fragment.velocity * dt;

    // 4. Floor
    if let Some(floor) = &config.floor {
        apply_floor(fragment, floor);
    }

    // 5. Radial limit
    if let Some(limit) = &config.radius_limit {
        if !apply_radius_limit(fragment, limit) {
            fragment.fade = 0.0;
            return FragmentStep::DEAD;
        }
    }

    // 6. Rest-fade
    let mut rest_fade = 1.0;
    if let Some(rest) = &config.rest_fade {
        let floor_y = config.floor.map(|f| f.floor_y).unwrap_or(FLOOR_Y);
        match fragment.rest_elapsed_ms {
            Some(elapsed) => fragment.rest_elapsed_ms = Some(elapsed + dt_ms),
            None => {
                let height = fragment.position.y - floor_y;
                if fragment.velocity.length() < rest.speed_threshold
                    && height < rest.height_threshold
                {
                    fragment.rest_elapsed_ms = Some(0.0);
                }
            }
        }
        if let Some(elapsed) = fragment.rest_elapsed_ms {
            if elapsed >= rest.duration_ms {
                fragment.fade = 0.0;
                return FragmentStep::DEAD;
            }
            rest_fade = (1.0 - elapsed / rest.duration_ms.max(f32::EPSILON)).clamp(0.0, 1.0);
        }
    }

    // 7. Fade
    let progress = (fragment.age_ms / fragment.lifetime_ms).clamp(0.0, 1.0);
    let fade = life_fade(progress, config.fade_start, config.fade_end).min(rest_fade);
    fragment.fade = fade;
    if fade <= 0.0 {
        return FragmentStep::DEAD;
    }
    FragmentStep { alive: true, fade }
}

/// Step every fragment in a cube, drop the dead ones, and mark the cube
/// finished once nothing is left.
pub fn update_cube_destruction_sim(
    sim: &mut CubeDestructionSim,
    dt_ms: f32,
    time_ms: f32,
    config: &FragmentPhysicsConfig,
) {
    sim.fragments
        .retain_mut(|fragment| step_fragment(fragment, dt_ms, time_ms, config).alive);
    if sim.fragments.is_empty() {
        sim.finished = true;
    }
}

/// Full opacity before `fade_start`, linear ramp to zero at `fade_end`.
pub fn life_fade(progress: f32, fade_start: f32, fade_end: f32) -> f32 {
    if fade_end <= fade_start {
        return if progress >= fade_start { 0.0 } else { 1.0 };
    }
    1.0 - ((progress - fade_start) / (fade_end - fade_start)).clamp(0.0, 1.0)
}

pub fn wind_acceleration(wind: &WindConfig, position: Vec3, time_ms: f32) -> Vec3 {
    let t = time_ms / 1000.0 * wind.time_scale;
    let p = position * wind.spatial_frequency;
    let gust = Vec3::new(
        (p.y + t).sin() * (p.z * 0.7 + t * 0.6).cos(),
        0.25 * (p.x + p.z + t * 0.8).sin(),
        (p.x + t * 1.3).cos() * (p.y * 0.5 - t * 0.4).sin(),
    );
    gust * wind.strength
}

fn apply_floor(fragment: &mut Fragment, floor: &FloorConfig) {
    if fragment.position.y >= floor.floor_y {
        return;
    }
    fragment.position.y = floor.floor_y + FLOOR_CONTACT_OFFSET;

    let vy = fragment.velocity.y;
    if vy.abs() >= floor.min_bounce_speed {
        if vy < 0.0 {
            fragment.velocity.y = -vy * floor.bounce_factor;
        }
    } else {
        fragment.velocity.y = 0.0;
    }
    let keep = (1.0 - floor.floor_friction).clamp(0.0, 1.0);
    fragment.velocity.x *= keep;
    fragment.velocity.z *= keep;
}

/// Returns `false` if the fragment must be removed.
fn apply_radius_limit(fragment: &mut Fragment, limit: &RadiusLimitConfig) -> bool {
    let offset = Vec2::new(
        fragment.position.x - limit.center.x,
        fragment.position.z - limit.center.z,
    );
    let r = offset.length();
    if r <= limit.max_radius || r <= f32::EPSILON {
        return true;
    }
    if matches!(limit.response, RadiusResponse::Kill) {
        return false;
    }

    let outward = offset / r;
    let clamped = outward * limit.max_radius.max(0.0);
    fragment.position.x = limit.center.x + clamped.x;
    fragment.position.z = limit.center.z + clamped.y;

    let horizontal = Vec2::new(fragment.velocity.x, fragment.velocity.z);
    let v_out = horizontal.dot(outward);
    if v_out <= 0.0 {
        return true;
    }

    let radial = outward * v_out;
    let tangential = horizontal - radial;
    let new_horizontal = match limit.response {
        RadiusResponse::Kill => return false,
        RadiusResponse::Damp { radial_damping } => {
            horizontal - radial * radial_damping.clamp(0.0, 1.0)
        }
        RadiusResponse::Bounce {
            restitution,
            friction,
            min_bounce_speed,
        } => {
            let reflected = if v_out >= min_bounce_speed {
                -radial * restitution.max(0.0)
            } else {
                Vec2::ZERO
            };
            reflected + tangential * (1.0 - friction).clamp(0.0, 1.0)
        }
    };
    fragment.velocity.x = new_horizontal.x;
    fragment.velocity.z = new_horizontal.y;
    true
}
