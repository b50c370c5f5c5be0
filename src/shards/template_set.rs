//! Per-run shard template sets, volumetric coverage validation, and the
//! lazily-built default set cache.
//!
//! Coverage is advisory: [`validate_shard_coverage`] reports `ok: false`
//! instead of failing, and the caller decides whether to regenerate.
//! [`ShardTemplateCache`] is such a caller: it retries a few times and then
//! keeps whatever it has, logging a warning.

use std::sync::Arc;

use bevy::log::{debug, warn};
use bevy::math::Vec3;
use bevy::prelude::Resource;

use super::generator::{generate_shard_templates, ShardGenerationOptions};
use super::geometry::point_in_polygon;
use super::ShardTemplate;
use crate::constants::{COVERAGE_REGENERATE_ATTEMPTS, COVERAGE_RESOLUTION, MIN_COVERED_FRACTION};
use crate::error::DestructionResult;
use crate::random::RandomSource;

/// Raw sample counts from [`estimate_shard_coverage`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageEstimate {
    pub inside: u32,
    pub total: u32,
    pub covered_fraction: f32,
}

/// Outcome of coverage validation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShardCoverage {
    pub ok: bool,
    pub covered_fraction: f32,
}

/// A complete set of templates for one randomized run.
#[derive(Debug, Clone, PartialEq)]
pub struct ShardTemplateSet {
    pub templates: Vec<ShardTemplate>,
    pub coverage: ShardCoverage,
}

impl ShardTemplateSet {
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }
}

/// `true` if `point` (cube-local) falls inside `template`'s prism.
pub fn template_contains(template: &ShardTemplate, point: Vec3) -> bool {
    let (uv, depth) = template.face.project(point);
    depth >= template.depth_min
        && depth <= template.depth_max
        && point_in_polygon(uv, &template.polygon)
}

/// Sample a `resolution³` grid of cell-centred points in the unit cube and
/// count how many fall inside at least one template.
pub fn estimate_shard_coverage(templates: &[ShardTemplate], resolution: u32) -> CoverageEstimate {
    let resolution = resolution.max(1);
    let step = 1.0 / resolution as f32;
    let mut inside = 0;
    let mut total = 0;
    for iz in 0..resolution {
        for iy in 0..resolution {
            for ix in 0..resolution {
                let point = Vec3::new(
                    -0.5 + (ix as f32 + 0.5) * step,
                    -0.5 + (iy as f32 + 0.5) * step,
                    -0.5 + (iz as f32 + 0.5) * step,
                );
                total += 1;
                if templates.iter().any(|t| template_contains(t, point)) {
                    inside += 1;
                }
            }
        }
    }
    CoverageEstimate {
        inside,
        total,
        covered_fraction: inside as f32 / total as f32,
    }
}

/// Compare estimated coverage against `min_covered_fraction`.  Never fails.
pub fn validate_shard_coverage(
    templates: &[ShardTemplate],
    resolution: u32,
    min_covered_fraction: f32,
) -> ShardCoverage {
    let estimate = estimate_shard_coverage(templates, resolution);
    ShardCoverage {
        ok: estimate.covered_fraction >= min_covered_fraction,
        covered_fraction: estimate.covered_fraction,
    }
}

/// Generate all six faces and attach a coverage report.
pub fn build_shard_template_set<R: RandomSource + ?Sized>(
    options: &ShardGenerationOptions,
    resolution: u32,
    min_covered_fraction: f32,
    rng: &mut R,
) -> DestructionResult<ShardTemplateSet> {
    let templates = generate_shard_templates(options, rng)?;
    let coverage = validate_shard_coverage(&templates, resolution, min_covered_fraction);
    Ok(ShardTemplateSet {
        templates,
        coverage,
    })
}

// ── Default set cache ─────────────────────────────────────────────────────────

/// Lazily-built, explicitly resettable default template set.
///
/// Held by the app as a [`Resource`], so the ECS scheduler gives it a single
/// writer.  Sets are handed out as `Arc` so in-flight cube simulations keep
/// their templates alive across a reset.
#[derive(Resource, Debug, Clone)]
pub struct ShardTemplateCache {
    pub options: ShardGenerationOptions,
    pub coverage_resolution: u32,
    pub min_covered_fraction: f32,
    default_set: Option<Arc<ShardTemplateSet>>,
}

impl Default for ShardTemplateCache {
    fn default() -> Self {
        Self::new(
            ShardGenerationOptions::default(),
            COVERAGE_RESOLUTION,
            MIN_COVERED_FRACTION,
        )
    }
}

impl ShardTemplateCache {
    pub fn new(
        options: ShardGenerationOptions,
        coverage_resolution: u32,
        min_covered_fraction: f32,
    ) -> Self {
        Self {
            options,
            coverage_resolution,
            min_covered_fraction,
            default_set: None,
        }
    }

    /// Return the cached set, building it on first use.
    ///
    /// A set that fails coverage is regenerated up to
    /// `COVERAGE_REGENERATE_ATTEMPTS` times; the last attempt is kept either way.
    pub fn default_set<R: RandomSource + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> DestructionResult<Arc<ShardTemplateSet>> {
        if let Some(set) = &self.default_set {
            return Ok(Arc::clone(set));
        }

        let mut set = self.build(rng)?;
        let mut attempt = 1;
        while !set.coverage.ok && attempt < COVERAGE_REGENERATE_ATTEMPTS {
            warn!(
                "shard coverage {:.3} below {:.3}; regenerating (attempt {})",
                set.coverage.covered_fraction,
                self.min_covered_fraction,
                attempt + 1
            );
            set = self.build(rng)?;
            attempt += 1;
        }
        if !set.coverage.ok {
            warn!(
                "keeping shard template set with low coverage {:.3}",
                set.coverage.covered_fraction
            );
        }
        debug!(
            "built default shard template set: {} templates, coverage {:.3}",
            set.len(),
            set.coverage.covered_fraction
        );

        let set = Arc::new(set);
        self.default_set = Some(Arc::clone(&set));
        Ok(set)
    }

    /// Drop the cached set; the next [`ShardTemplateCache::default_set`] call rebuilds.
    pub fn reset_default(&mut self) {
        self.default_set = None;
    }

    pub fn is_built(&self) -> bool {
        self.default_set.is_some()
    }

    fn build<R: RandomSource + ?Sized>(&self, rng: &mut R) -> DestructionResult<ShardTemplateSet> {
        build_shard_template_set(
            &self.options,
            self.coverage_resolution,
            self.min_covered_fraction,
            rng,
        )
    }
}
