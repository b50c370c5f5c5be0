//! Procedural face partitioning into irregular shard polygons.
//!
//! ## Algorithm (per face)
//!
//! 1. Pick a target count in the face's `[min, max]` range.
//! 2. Seed a jittered 4×4 grid plus a few random points; pairs of seeds give
//!    cut directions that follow the jitter rather than the axes.
//! 3. Repeatedly take the largest polygon and try an irregular cut (random
//!    direction, offset in the middle 60% of the projected extent).  If either
//!    half is below the minimum area, fall back to an axis-aligned mid-split
//!    of the longer bounding-box side.
//! 4. Stop at the target or after `SPLIT_RETRY_FACTOR × target` attempts.  If
//!    the face is still below its minimum count, force splits with half the
//!    minimum area, then with plain axis splits.
//! 5. Give every polygon a depth range: centre shards get the face's full depth
//!    span, edge shards about 80% of it.

use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_2, PI};

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{polygon_area, polygon_bounds, polygon_centroid, split_polygon, unit_face_square};
use super::{CubeFace, ShardTemplate};
use crate::constants::*;
use crate::error::{validate_range, DestructionError, DestructionResult};
use crate::random::RandomSource;

/// Areas below this are treated as degenerate slivers and never produced.
const DEGENERATE_AREA: f32 = 1e-5;

/// Inclusive shard count range for a face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShardCountRange {
    pub min: u32,
    pub max: u32,
}

/// Inward depth range for a face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthRange {
    pub min: f32,
    pub max: f32,
}

/// Options controlling how each face is carved up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardGenerationOptions {
    pub front_shards: ShardCountRange,
    pub side_shards: ShardCountRange,
    pub front_depth: DepthRange,
    pub side_depth: DepthRange,
    pub min_shard_area: f32,
}

impl Default for ShardGenerationOptions {
    fn default() -> Self {
        Self {
            front_shards: ShardCountRange {
                min: FRONT_FACE_SHARDS_MIN,
                max: FRONT_FACE_SHARDS_MAX,
            },
            side_shards: ShardCountRange {
                min: SIDE_FACE_SHARDS_MIN,
                max: SIDE_FACE_SHARDS_MAX,
            },
            front_depth: DepthRange {
                min: FRONT_DEPTH_RANGE.0,
                max: FRONT_DEPTH_RANGE.1,
            },
            side_depth: DepthRange {
                min: SIDE_DEPTH_RANGE.0,
                max: SIDE_DEPTH_RANGE.1,
            },
            min_shard_area: MIN_SHARD_AREA,
        }
    }
}

impl ShardGenerationOptions {
    pub fn shard_range(&self, face: CubeFace) -> ShardCountRange {
        match face {
            CubeFace::Front => self.front_shards,
            _ => self.side_shards,
        }
    }

    pub fn depth_range(&self, face: CubeFace) -> DepthRange {
        match face {
            CubeFace::Front => self.front_depth,
            _ => self.side_depth,
        }
    }

    pub fn validate(&self) -> DestructionResult<()> {
        for (name, range) in [
            ("front shard count", self.front_shards),
            ("side shard count", self.side_shards),
        ] {
            if range.min == 0 || range.max < range.min {
                return Err(DestructionError::InvalidRange {
                    name,
                    min: range.min as f32,
                    max: range.max as f32,
                });
            }
        }
        validate_range("front depth", self.front_depth.min, self.front_depth.max)?;
        validate_range("side depth", self.side_depth.min, self.side_depth.max)?;
        if self.front_depth.max > 0.5 || self.side_depth.max > 0.5 {
            return Err(DestructionError::InvalidRange {
                name: "shard depth (must stay within half a cube)",
                min: self.front_depth.max,
                max: self.side_depth.max,
            });
        }
        if !self.min_shard_area.is_finite() || self.min_shard_area < 0.0 {
            return Err(DestructionError::InvalidRange {
                name: "min shard area",
                min: self.min_shard_area,
                max: self.min_shard_area,
            });
        }
        Ok(())
    }
}

/// Generate templates for all six faces.  Ids are sequential from zero.
pub fn generate_shard_templates<R: RandomSource + ?Sized>(
    options: &ShardGenerationOptions,
    rng: &mut R,
) -> DestructionResult<Vec<ShardTemplate>> {
    options.validate()?;
    let mut next_id = 0;
    let mut templates = Vec::new();
    for face in CubeFace::ALL {
        templates.extend(generate_face_shards(face, options, &mut next_id, rng));
    }
    Ok(templates)
}

/// Partition a single face.  `next_id` is advanced past every emitted template.
pub fn generate_face_shards<R: RandomSource + ?Sized>(
    face: CubeFace,
    options: &ShardGenerationOptions,
    next_id: &mut u32,
    rng: &mut R,
) -> Vec<ShardTemplate> {
    let range = options.shard_range(face);
    let target = rng.range_u32(range.min, range.max) as usize;
    let polygons = partition_face(target, range.min as usize, options.min_shard_area, rng);
    let depth = options.depth_range(face);

    let mut templates = Vec::with_capacity(polygons.len());
    for polygon in polygons {
        let polygon: Vec<Vec2> = polygon
            .into_iter()
            .map(|p| p.clamp(Vec2::splat(-0.5), Vec2::splat(0.5)))
            .collect();
        let (depth_min, depth_max) = shard_depth(&polygon, depth, rng);
        let template = ShardTemplate {
            id: *next_id,
            face,
            polygon,
            depth_min,
            depth_max,
        };
        if template.is_valid() {
            *next_id += 1;
            templates.push(template);
        }
    }
    templates
}

// ── Partitioning ──────────────────────────────────────────────────────────────

fn partition_face<R: RandomSource + ?Sized>(
    target: usize,
    min_count: usize,
    min_area: f32,
    rng: &mut R,
) -> Vec<Vec<Vec2>> {
    let seeds = seed_points(rng);
    let mut polygons = vec![unit_face_square()];
    let max_attempts = target.max(1) * SPLIT_RETRY_FACTOR as usize;

    let mut attempts = 0;
    while polygons.len() < target && attempts < max_attempts {
        attempts += 1;
        let idx = largest_polygon_index(&polygons);
        let split = irregular_split(&polygons[idx], &seeds, min_area, rng)
            .or_else(|| axis_split(&polygons[idx], min_area));
        if let Some((a, b)) = split {
            polygons.swap_remove(idx);
            polygons.push(a);
            polygons.push(b);
        }
    }

    let relaxed = min_area * 0.5;
    let mut forced = 0;
    while polygons.len() < min_count && forced < max_attempts {
        forced += 1;
        let idx = largest_polygon_index(&polygons);
        let split = irregular_split(&polygons[idx], &seeds, relaxed, rng)
            .or_else(|| axis_split(&polygons[idx], relaxed))
            .or_else(|| axis_split(&polygons[idx], DEGENERATE_AREA));
        match split {
            Some((a, b)) => {
                polygons.swap_remove(idx);
                polygons.push(a);
                polygons.push(b);
            }
            None => break,
        }
    }

    polygons
}

fn largest_polygon_index(polygons: &[Vec<Vec2>]) -> usize {
    polygons
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| polygon_area(a).total_cmp(&polygon_area(b)))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Jittered grid plus a few uniform extras, all inside the face square.
fn seed_points<R: RandomSource + ?Sized>(rng: &mut R) -> Vec<Vec2> {
    let cell = 1.0 / SEED_GRID_SIZE as f32;
    let jitter = cell * 0.35;
    let mut seeds = Vec::with_capacity(SEED_GRID_SIZE * SEED_GRID_SIZE + EXTRA_SEED_POINTS);
    for gy in 0..SEED_GRID_SIZE {
        for gx in 0..SEED_GRID_SIZE {
            let centre = Vec2::new(
                -0.5 + (gx as f32 + 0.5) * cell,
                -0.5 + (gy as f32 + 0.5) * cell,
            );
            let offset = Vec2::new(rng.range(-jitter, jitter), rng.range(-jitter, jitter));
            seeds.push(centre + offset);
        }
    }
    for _ in 0..EXTRA_SEED_POINTS {
        seeds.push(Vec2::new(rng.range(-0.5, 0.5), rng.range(-0.5, 0.5)));
    }
    seeds
}

/// Cut direction from a random seed pair or a random angle, pushed out of the
/// axis-aligned band.
fn cut_direction<R: RandomSource + ?Sized>(seeds: &[Vec2], rng: &mut R) -> Vec2 {
    let mut angle = None;
    if seeds.len() >= 2 && rng.chance(0.5) {
        let last = seeds.len() as u32 - 1;
        let i = rng.range_u32(0, last) as usize;
        let mut j = rng.range_u32(0, last - 1) as usize;
        if j >= i {
            j += 1;
        }
        let delta = seeds[j] - seeds[i];
        if delta.length_squared() > 1e-8 {
            angle = Some(delta.y.atan2(delta.x));
        }
    }
    let angle = match angle {
        Some(a) => a,
        None => rng.range(0.0, PI),
    };
    let angle = deflect_from_axes(angle, rng);
    Vec2::from_angle(angle)
}

fn deflect_from_axes<R: RandomSource + ?Sized>(angle: f32, rng: &mut R) -> f32 {
    let m = angle.rem_euclid(FRAC_PI_2);
    let push = AXIS_DEFLECT_BAND + rng.next_unit() * AXIS_DEFLECT_BAND;
    if m < AXIS_DEFLECT_BAND {
        angle - m + push
    } else if FRAC_PI_2 - m < AXIS_DEFLECT_BAND {
        angle + (FRAC_PI_2 - m) - push
    } else {
        angle
    }
}

fn projected_extent(polygon: &[Vec2], normal: Vec2) -> (f32, f32) {
    polygon.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| {
        let d = p.dot(normal);
        (lo.min(d), hi.max(d))
    })
}

fn irregular_split<R: RandomSource + ?Sized>(
    polygon: &[Vec2],
    seeds: &[Vec2],
    min_area: f32,
    rng: &mut R,
) -> Option<(Vec<Vec2>, Vec<Vec2>)> {
    let normal = cut_direction(seeds, rng).perp();
    let (lo, hi) = projected_extent(polygon, normal);
    if hi - lo < 1e-5 {
        return None;
    }
    let offset = lo + (hi - lo) * (0.2 + 0.6 * rng.next_unit());
    accept_split(split_polygon(polygon, normal, offset), min_area)
}

fn axis_split(polygon: &[Vec2], min_area: f32) -> Option<(Vec<Vec2>, Vec<Vec2>)> {
    let (min, max) = polygon_bounds(polygon);
    let size = max - min;
    let (normal, offset) = if size.x >= size.y {
        (Vec2::X, (min.x + max.x) * 0.5)
    } else {
        (Vec2::Y, (min.y + max.y) * 0.5)
    };
    accept_split(split_polygon(polygon, normal, offset), min_area)
}

fn accept_split(
    (a, b): (Vec<Vec2>, Vec<Vec2>),
    min_area: f32,
) -> Option<(Vec<Vec2>, Vec<Vec2>)> {
    let threshold = min_area.max(DEGENERATE_AREA);
    if a.len() >= 3 && b.len() >= 3 && polygon_area(&a) > threshold && polygon_area(&b) > threshold
    {
        Some((a, b))
    } else {
        None
    }
}

// ── Depth ─────────────────────────────────────────────────────────────────────

fn shard_depth<R: RandomSource + ?Sized>(
    polygon: &[Vec2],
    base: DepthRange,
    rng: &mut R,
) -> (f32, f32) {
    let centroid = polygon_centroid(polygon);
    let closeness = (1.0 - centroid.length() / FRAC_1_SQRT_2).clamp(0.0, 1.0);
    let fraction = EDGE_DEPTH_FRACTION + (1.0 - EDGE_DEPTH_FRACTION) * closeness;
    // Up to 5% shallower so neighbouring shards do not end on one plane.
    let jitter = 1.0 - 0.05 * rng.next_unit();
    let span = base.max - base.min;
    let depth_max = (base.min + span * fraction * jitter).clamp(base.min, base.max);
    (base.min, depth_max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::FixedRandom;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn shard_counts_respect_face_ranges() {
        let options = ShardGenerationOptions::default();
        for seed in 0..25 {
            let mut rng = StdRng::seed_from_u64(seed);
            let templates = generate_shard_templates(&options, &mut rng).unwrap();
            for face in CubeFace::ALL {
                let count = templates.iter().filter(|t| t.face == face).count() as u32;
                let range = options.shard_range(face);
                assert!(
                    (range.min..=range.max).contains(&count),
                    "seed {seed}: {face:?} produced {count} shards"
                );
            }
        }
    }

    #[test]
    fn templates_stay_inside_face_and_depth_range() {
        let options = ShardGenerationOptions::default();
        for seed in 0..25 {
            let mut rng = StdRng::seed_from_u64(seed);
            for t in generate_shard_templates(&options, &mut rng).unwrap() {
                let base = options.depth_range(t.face);
                assert!(t.depth_min <= t.depth_max);
                assert!(t.depth_min >= base.min && t.depth_max <= base.max);
                for p in &t.polygon {
                    assert!(p.x.abs() <= 0.5 && p.y.abs() <= 0.5, "vertex {p:?}");
                }
            }
        }
    }

    #[test]
    fn face_partition_preserves_area() {
        let options = ShardGenerationOptions::default();
        let mut rng = StdRng::seed_from_u64(3);
        let templates = generate_shard_templates(&options, &mut rng).unwrap();
        for face in CubeFace::ALL {
            let area: f32 = templates
                .iter()
                .filter(|t| t.face == face)
                .map(|t| polygon_area(&t.polygon))
                .sum();
            assert!((area - 1.0).abs() < 1e-3, "{face:?} area {area}");
        }
    }

    #[test]
    fn ids_are_unique() {
        let mut rng = StdRng::seed_from_u64(11);
        let templates =
            generate_shard_templates(&ShardGenerationOptions::default(), &mut rng).unwrap();
        let ids: HashSet<u32> = templates.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), templates.len());
    }

    #[test]
    fn same_seed_same_templates() {
        let options = ShardGenerationOptions::default();
        let a = generate_shard_templates(&options, &mut StdRng::seed_from_u64(5)).unwrap();
        let b = generate_shard_templates(&options, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn constant_random_source_still_meets_minimum() {
        // A stuck source always proposes the same cut; the axis fallback must
        // still reach the minimum count.
        let options = ShardGenerationOptions::default();
        let templates = generate_shard_templates(&options, &mut FixedRandom(0.0)).unwrap();
        for face in CubeFace::ALL {
            let count = templates.iter().filter(|t| t.face == face).count() as u32;
            assert!(count >= options.shard_range(face).min, "{face:?}: {count}");
        }
    }

    #[test]
    fn deflection_moves_near_axis_angles_out_of_band() {
        let mut rng = FixedRandom(0.5);
        for angle in [0.0_f32, 0.05, FRAC_PI_2 - 0.05, FRAC_PI_2, PI - 0.01] {
            let out = deflect_from_axes(angle, &mut rng);
            let m = out.rem_euclid(FRAC_PI_2);
            assert!(m.min(FRAC_PI_2 - m) >= AXIS_DEFLECT_BAND - 1e-5, "{angle} -> {out}");
        }
        assert_eq!(deflect_from_axes(0.7, &mut rng), 0.7);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let mut options = ShardGenerationOptions::default();
        options.front_shards = ShardCountRange { min: 8, max: 4 };
        assert!(generate_shard_templates(&options, &mut FixedRandom(0.5)).is_err());

        let mut options = ShardGenerationOptions::default();
        options.side_depth = DepthRange { min: 0.3, max: 0.1 };
        assert!(options.validate().is_err());
    }
}
