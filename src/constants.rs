//! Centralised destruction and tuning constants.
//!
//! All tuneable values live here so they can be found, reasoned-about, and
//! modified in one place.  [`crate::config::DestructionConfig`] mirrors the
//! runtime-tunable subset; the values below are its authoritative defaults.
//!
//! Times are in milliseconds, distances in world units (one cube = `CUBE_SIZE`).

// ── Simulation Clock ──────────────────────────────────────────────────────────

/// Fixed step used by the headless demo binary (≈60 Hz).
pub const DEMO_TICK_MS: u64 = 16;

/// Upper bound on a single physics step.  Longer frames are clamped so a
/// stalled window does not fling every fragment through the floor.
pub const MAX_STEP_MS: f32 = 50.0;

// ── Tower Geometry ────────────────────────────────────────────────────────────

/// Number of cube columns wrapped around the tower circumference.
pub const TOWER_COLUMNS: u32 = 16;

/// Edge length of one board cube (world units).
pub const CUBE_SIZE: f32 = 1.0;

/// Distance from the tower axis to the centre of a cube.
///
/// Chosen so sixteen unit cubes sit edge-to-edge around the ring
/// (`16 / 2π ≈ 2.55`).
pub const TOWER_RADIUS: f32 = 2.55;

// ── Explosion Scheduling ──────────────────────────────────────────────────────

/// Delay between consecutive cube explosions along a cleared row.
pub const EXPLOSION_STAGGER_MS: f32 = 50.0;

/// Random extra delay added per slot, as a fraction of `EXPLOSION_STAGGER_MS`.
pub const EXPLOSION_STAGGER_JITTER: f32 = 0.3;

// ── Shard Generation ──────────────────────────────────────────────────────────

/// Shard count range for the outward (front) face.
pub const FRONT_FACE_SHARDS_MIN: u32 = 10;
pub const FRONT_FACE_SHARDS_MAX: u32 = 16;

/// Shard count range for the five hidden faces.
pub const SIDE_FACE_SHARDS_MIN: u32 = 5;
pub const SIDE_FACE_SHARDS_MAX: u32 = 9;

/// Smallest polygon area (face area = 1.0) an irregular split may produce.
///
/// The forced-split phase halves this before giving up on irregular cuts.
pub const MIN_SHARD_AREA: f32 = 0.012;

/// Seed grid resolution per axis for cut-direction sampling.
pub const SEED_GRID_SIZE: usize = 4;

/// Extra uniformly random seed points on top of the jittered grid.
pub const EXTRA_SEED_POINTS: usize = 3;

/// Cut directions within this many radians of 0° or 90° are deflected.
/// 0.15 rad ≈ 8.6°.
pub const AXIS_DEFLECT_BAND: f32 = 0.15;

/// Retry budget for the split loop, as a multiple of the target shard count.
pub const SPLIT_RETRY_FACTOR: u32 = 20;

/// Base depth range (inward from the face plane) for front-face shards.
pub const FRONT_DEPTH_RANGE: (f32, f32) = (0.0, 0.34);

/// Base depth range for all other faces.
pub const SIDE_DEPTH_RANGE: (f32, f32) = (0.0, 0.30);

/// Depth fraction kept by shards on the very edge of a face.
pub const EDGE_DEPTH_FRACTION: f32 = 0.8;

// ── Coverage Validation ───────────────────────────────────────────────────────

/// Sample grid resolution per axis for `estimate_shard_coverage`.
pub const COVERAGE_RESOLUTION: u32 = 8;

/// Minimum covered fraction for a template set to be considered valid.
pub const MIN_COVERED_FRACTION: f32 = 0.55;

/// How many times the template cache regenerates a set that fails coverage.
pub const COVERAGE_REGENERATE_ATTEMPTS: u32 = 3;

// ── Fragment Physics ──────────────────────────────────────────────────────────

/// Gravity in world units / s².
pub const GRAVITY: [f32; 3] = [0.0, -9.8, 0.0];

/// Linear drag coefficient (1/s).  Acceleration contribution is `-drag · v`.
pub const LINEAR_DRAG: f32 = 0.35;

/// Angular drag coefficient (1/s), applied as exponential decay.
pub const ANGULAR_DRAG: f32 = 0.8;

/// Life-progress fraction at which fragments start fading.
pub const FADE_START: f32 = 0.65;

/// Life-progress fraction at which fragments are fully transparent.
pub const FADE_END: f32 = 1.0;

/// Height of the ground plane under the tower.
pub const FLOOR_Y: f32 = 0.0;

/// Fragments resting on the floor sit this far above it.
pub const FLOOR_CONTACT_OFFSET: f32 = 0.001;

/// Vertical restitution on floor contact.
pub const FLOOR_BOUNCE: f32 = 0.35;

/// Fraction of horizontal velocity removed on each floor contact.
pub const FLOOR_FRICTION: f32 = 0.25;

/// Below this downward speed a floor contact settles instead of bouncing.
pub const MIN_BOUNCE_SPEED: f32 = 0.6;

/// Radial limit measured from the tower axis.
pub const MAX_DEBRIS_RADIUS: f32 = 9.0;

/// Restitution when debris bounces off the radial wall.
pub const WALL_RESTITUTION: f32 = 0.3;

/// Fraction of tangential velocity removed on a wall bounce.
pub const WALL_FRICTION: f32 = 0.2;

/// Below this outward speed a wall contact stops radial motion instead of bouncing.
pub const MIN_WALL_BOUNCE_SPEED: f32 = 0.5;

/// Rest-fade triggers when speed drops below this (units/s) ...
pub const REST_SPEED_THRESHOLD: f32 = 0.25;

/// ... and the fragment is within this height of the floor.
pub const REST_HEIGHT_THRESHOLD: f32 = 0.05;

/// Rest-fade countdown length.
pub const REST_FADE_MS: f32 = 400.0;

// ── Fragment Sampling ─────────────────────────────────────────────────────────

/// Default lifetime range for `generate_lifetime_ms`.
pub const DEFAULT_LIFETIME_MS: (f32, f32) = (1000.0, 2000.0);

/// Exponent applied to mass when scaling angular speed ranges.
pub const ANGULAR_MASS_EXPONENT: f32 = -0.35;

/// Default allocation weights: face shards, edge shards, dust.
pub const DEFAULT_FRAGMENT_WEIGHTS: [f32; 3] = [0.5, 0.3, 0.2];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_ranges_are_ordered() {
        assert!(FRONT_FACE_SHARDS_MIN <= FRONT_FACE_SHARDS_MAX);
        assert!(SIDE_FACE_SHARDS_MIN <= SIDE_FACE_SHARDS_MAX);
        assert!(FRONT_DEPTH_RANGE.0 <= FRONT_DEPTH_RANGE.1);
        assert!(SIDE_DEPTH_RANGE.0 <= SIDE_DEPTH_RANGE.1);
    }

    #[test]
    fn fade_window_is_inside_lifetime() {
        assert!(FADE_START < FADE_END);
        assert!(FADE_END <= 1.0);
    }

    #[test]
    fn tower_ring_fits_columns() {
        let circumference = std::f32::consts::TAU * TOWER_RADIUS;
        assert!(circumference >= TOWER_COLUMNS as f32 * CUBE_SIZE);
    }
}
