//! Explosion orchestration: the clock, slot launching, fragment spawning and
//! the per-tick update of every active cube.
//!
//! [`DestructionSimulationState`] is the single owner of all destruction
//! state.  Everything mutates through `&mut self`, so there is exactly one
//! writer; the Bevy plugin keeps it in a resource.

use std::collections::BTreeMap;
use std::f32::consts::TAU;

use bevy::log::{debug, info};
use bevy::math::Vec3;

use crate::allocator::allocate_fragment_counts;
use crate::constants::MAX_STEP_MS;
use crate::error::{DestructionError, DestructionResult};
use crate::fragment::{Fragment, FragmentKind};
use crate::lifecycle::{CubeDestructionSim, DestructionCube, RowDestructionSim};
use crate::physics::{update_cube_destruction_sim, FragmentPhysicsConfig};
use crate::preset::DestructionPreset;
use crate::random::RandomSource;
use crate::shards::template_set::ShardTemplateSet;
use crate::shards::volume::{shard_uv_rect, shard_volume, ShardVolumeMap};
use crate::shards::{CubeFace, ShardTemplate};
use crate::velocity::{
    compose_initial_velocity, compute_velocity_basis, generate_angular_velocity,
    generate_lifetime_ms, random_vector_within_sphere, LaunchSpeeds, MagnitudeRange,
    VelocityBasis, VelocityPerturbation,
};

/// Dust spawns inside this fraction of the cube size around its centre.
const DUST_SPAWN_RADIUS: f32 = 0.35;

/// Fraction of the radial speed pushed along a shard's own offset from the
/// cube centre.
const SHARD_SPREAD: f32 = 0.35;

const WAVE_AMPLITUDE: f32 = 0.5;

/// Scenario-level bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioMeta {
    pub started_at_ms: f64,
    pub finished: bool,
}

/// What one [`DestructionSimulationState::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    pub cubes_started: usize,
    pub cubes_finished: usize,
    /// Set on the tick that finishes the scenario.
    pub scenario_finished: bool,
}

#[derive(Debug, Clone)]
pub struct DestructionSimulationState {
    pub rows: BTreeMap<u32, RowDestructionSim>,
    pub scenario: Option<ScenarioMeta>,
    pub active_cubes: Vec<CubeDestructionSim>,
    pub clock_ms: f64,
    pub next_instance_id: u32,
    /// Base physics; each row specialises it with its preset.
    pub physics: FragmentPhysicsConfig,
    /// Point on the tower axis; launch directions point away from it.
    pub tower_center: Vec3,
}

impl Default for DestructionSimulationState {
    fn default() -> Self {
        Self::new(FragmentPhysicsConfig::default())
    }
}

impl DestructionSimulationState {
    pub fn new(physics: FragmentPhysicsConfig) -> Self {
        Self {
            rows: BTreeMap::new(),
            scenario: None,
            active_cubes: Vec::new(),
            clock_ms: 0.0,
            next_instance_id: 0,
            physics,
            tower_center: Vec3::ZERO,
        }
    }

    /// Register a cleared row.  Replaces any row already at that level.
    pub fn add_row(&mut self, row: RowDestructionSim) {
        debug!(
            "row {} queued: {} cubes, {:?} quality",
            row.level,
            row.cubes.len(),
            row.quality
        );
        match self.scenario.as_mut() {
            Some(meta) => meta.finished = false,
            None => {
                self.scenario = Some(ScenarioMeta {
                    started_at_ms: self.clock_ms,
                    finished: false,
                })
            }
        }
        self.rows.insert(row.level, row);
    }

    pub fn row(&self, level: u32) -> DestructionResult<&RowDestructionSim> {
        self.rows
            .get(&level)
            .ok_or(DestructionError::UnknownRow { level })
    }

    pub fn is_finished(&self) -> bool {
        self.scenario.map(|s| s.finished).unwrap_or(true)
    }

    /// Start every slot that is due at `now_ms` and append the new cube
    /// simulations to `active_cubes`.  Returns how many cubes started.
    pub fn launch_scheduled_explosions<R: RandomSource + ?Sized>(
        &mut self,
        now_ms: f64,
        templates: &ShardTemplateSet,
        rng: &mut R,
    ) -> DestructionResult<usize> {
        let due: Vec<(u32, usize)> = self
            .rows
            .values()
            .flat_map(|row| {
                let level = row.level;
                row.due_cubes(now_ms).into_iter().map(move |i| (level, i))
            })
            .collect();

        let mut started = 0;
        for (level, cube_index) in due {
            if self.start_cube_at(level, cube_index, now_ms, templates, rng)? {
                started += 1;
            }
        }
        Ok(started)
    }

    /// Start one cube at the current clock.  Returns `false` if its slot had
    /// already started.
    pub fn start_cube_explosion<R: RandomSource + ?Sized>(
        &mut self,
        level: u32,
        cube_index: usize,
        templates: &ShardTemplateSet,
        rng: &mut R,
    ) -> DestructionResult<bool> {
        self.start_cube_at(level, cube_index, self.clock_ms, templates, rng)
    }

    fn start_cube_at<R: RandomSource + ?Sized>(
        &mut self,
        level: u32,
        cube_index: usize,
        now_ms: f64,
        templates: &ShardTemplateSet,
        rng: &mut R,
    ) -> DestructionResult<bool> {
        let tower_center = self.tower_center;
        let row = self
            .rows
            .get_mut(&level)
            .ok_or(DestructionError::UnknownRow { level })?;
        let sim = start_cube_explosion(
            row,
            cube_index,
            templates,
            tower_center,
            now_ms,
            &mut self.next_instance_id,
            rng,
        )?;
        match sim {
            Some(sim) => {
                self.active_cubes.push(sim);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// `true` until the cube's slot has started.  Unknown rows and cubes
    /// without a slot render whole.
    pub fn should_render_whole_cube(&self, level: u32, cube_index: usize) -> bool {
        self.rows
            .get(&level)
            .map(|row| !row.is_cube_started(cube_index))
            .unwrap_or(true)
    }

    pub fn whole_cubes_to_render(&self, level: u32) -> DestructionResult<Vec<&DestructionCube>> {
        Ok(self.row(level)?.whole_cubes().collect())
    }

    /// `"x:y"` ids of every cube that has started exploding.
    pub fn hidden_cube_ids(&self) -> Vec<String> {
        self.rows
            .values()
            .flat_map(|row| row.started_cubes().map(DestructionCube::cell_id))
            .collect()
    }

    pub fn pending_slot_count(&self) -> usize {
        self.rows.values().map(RowDestructionSim::pending_count).sum()
    }

    pub fn fragment_count(&self) -> usize {
        self.active_cubes.iter().map(|c| c.fragments.len()).sum()
    }

    /// Advance the clock by `dt_ms`.
    ///
    /// Active fragments are integrated first in sub-steps of at most
    /// `MAX_STEP_MS`, then due slots launch at the new clock so fresh
    /// fragments start at age zero.
    pub fn tick<R: RandomSource + ?Sized>(
        &mut self,
        dt_ms: f32,
        templates: &ShardTemplateSet,
        rng: &mut R,
    ) -> DestructionResult<TickReport> {
        let dt_ms = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };
        let mut report = TickReport::default();
        let was_finished = self.is_finished();

        self.step_active_cubes(dt_ms);
        let before = self.active_cubes.len();
        self.active_cubes.retain(|c| !c.finished);
        report.cubes_finished = before - self.active_cubes.len();

        self.clock_ms += dt_ms as f64;
        report.cubes_started = self.launch_scheduled_explosions(self.clock_ms, templates, rng)?;

        let mut all_exploded = true;
        for row in self.rows.values_mut() {
            all_exploded &= row.refresh_exploded();
        }
        if let Some(meta) = self.scenario.as_mut() {
            if !meta.finished && all_exploded && self.active_cubes.is_empty() {
                meta.finished = true;
                info!(
                    "line clear finished: {} rows in {:.0} ms",
                    self.rows.len(),
                    self.clock_ms - meta.started_at_ms
                );
            }
        }
        report.scenario_finished = !was_finished && self.is_finished();
        Ok(report)
    }

    /// Drop rows whose cubes have all exploded and whose debris is gone.
    pub fn remove_finished_rows(&mut self) -> usize {
        let before = self.rows.len();
        let active = &self.active_cubes;
        self.rows.retain(|level, row| {
            !row.all_cubes_exploded || active.iter().any(|c| c.level == *level)
        });
        before - self.rows.len()
    }

    fn step_active_cubes(&mut self, dt_ms: f32) {
        if self.active_cubes.is_empty() || dt_ms <= 0.0 {
            return;
        }
        let steps = (dt_ms / MAX_STEP_MS).ceil().max(1.0) as u32;
        let step_ms = dt_ms / steps as f32;

        let rows = &self.rows;
        let physics = &self.physics;
        let clock_ms = self.clock_ms;
        let mut configs: BTreeMap<u32, FragmentPhysicsConfig> = BTreeMap::new();
        for cube in &mut self.active_cubes {
            let level = cube.level;
            let config = configs.entry(level).or_insert_with(|| match rows.get(&level) {
                Some(row) => FragmentPhysicsConfig::for_preset(physics, &row.preset),
                None => physics.clone(),
            });
            for step in 0..steps {
                let time_ms = (clock_ms + (step as f32 * step_ms) as f64) as f32;
                update_cube_destruction_sim(cube, step_ms, time_ms, config);
                if cube.finished {
                    break;
                }
            }
        }
    }
}

/// Flip the cube's slot to started and build its debris.
///
/// Returns `Ok(None)` if the slot had already started.  Fails if the slot or
/// cube is missing or the template set is empty; the slot stays pending then.
pub fn start_cube_explosion<R: RandomSource + ?Sized>(
    row: &mut RowDestructionSim,
    cube_index: usize,
    templates: &ShardTemplateSet,
    tower_center: Vec3,
    now_ms: f64,
    next_instance_id: &mut u32,
    rng: &mut R,
) -> DestructionResult<Option<CubeDestructionSim>> {
    if row.slot(cube_index)?.is_started() {
        return Ok(None);
    }
    let cube = row.cube(cube_index)?.clone();
    let fragments = build_cube_fragments(
        &cube,
        &row.preset,
        row.cube_size,
        row.columns,
        templates,
        tower_center,
        next_instance_id,
        rng,
    )?;
    row.slot_mut(cube_index)?.mark_started();

    debug!(
        "cube {} exploded into {} fragments at {:.0} ms",
        cube.cell_id(),
        fragments.len(),
        now_ms
    );
    Ok(Some(CubeDestructionSim {
        level: row.level,
        cube,
        fragments,
        started_at_ms: now_ms,
        finished: false,
    }))
}

/// One fragment per template (front face → face shard, other faces → edge
/// shard) plus the preset's dust share.
pub fn build_cube_fragments<R: RandomSource + ?Sized>(
    cube: &DestructionCube,
    preset: &DestructionPreset,
    cube_size: f32,
    columns: u32,
    templates: &ShardTemplateSet,
    tower_center: Vec3,
    next_instance_id: &mut u32,
    rng: &mut R,
) -> DestructionResult<Vec<Fragment>> {
    if templates.is_empty() {
        return Err(DestructionError::NoShardTemplates);
    }
    let volume_map = ShardVolumeMap::new(&templates.templates);
    let axis_point = Vec3::new(tower_center.x, cube.world_position.y, tower_center.z);
    let spawner = FragmentSpawner {
        cube,
        preset,
        cube_size,
        basis: compute_velocity_basis(cube.world_position, axis_point, Vec3::Y),
        wave_phase: cube.grid_x as f32 * TAU / columns.max(1) as f32,
    };

    let total = rng.range_u32(preset.fragment_count.min, preset.fragment_count.max);
    let counts = allocate_fragment_counts(total, &preset.fragment_weights)?;

    let mean_volume = templates.templates.iter().map(shard_volume).sum::<f32>()
        / templates.len() as f32;

    let mut fragments = Vec::with_capacity(templates.len() + counts.dust as usize);
    for (shard_index, template) in templates.templates.iter().enumerate() {
        let local = volume_map.local_center(template.id)?;
        let relative_volume = if mean_volume > 0.0 {
            shard_volume(template) / mean_volume
        } else {
            1.0
        };
        let mut fragment = spawner.spawn(
            shard_kind(template),
            local,
            relative_volume,
            next_id(next_instance_id),
            rng,
        )?;
        fragment.template_id = Some(template.id);
        fragment.shard_id = Some(shard_index as u32);
        if fragment.kind == FragmentKind::FaceShard {
            fragment.uv_rect = Some(shard_uv_rect(template));
        }
        fragments.push(fragment);
    }

    let dust_range = MagnitudeRange::new(0.0, DUST_SPAWN_RADIUS);
    for _ in 0..counts.dust {
        let local = random_vector_within_sphere(dust_range, rng)?;
        let fragment = spawner.spawn(
            FragmentKind::Dust,
            local,
            1.0,
            next_id(next_instance_id),
            rng,
        )?;
        fragments.push(fragment);
    }
    Ok(fragments)
}

fn shard_kind(template: &ShardTemplate) -> FragmentKind {
    if template.face == CubeFace::Front {
        FragmentKind::FaceShard
    } else {
        FragmentKind::EdgeShard
    }
}

fn next_id(counter: &mut u32) -> u32 {
    let id = *counter;
    *counter = counter.wrapping_add(1);
    id
}

struct FragmentSpawner<'a> {
    cube: &'a DestructionCube,
    preset: &'a DestructionPreset,
    cube_size: f32,
    basis: VelocityBasis,
    wave_phase: f32,
}

impl FragmentSpawner<'_> {
    /// `local` is the cube-local offset of the fragment centre (unit cube).
    fn spawn<R: RandomSource + ?Sized>(
        &self,
        kind: FragmentKind,
        local: Vec3,
        relative_volume: f32,
        instance_id: u32,
        rng: &mut R,
    ) -> DestructionResult<Fragment> {
        let cfg = kind.config();
        let offset = self.cube.facing * (local * self.cube_size);
        let position = self.cube.world_position + offset;

        let lifetime_ms = generate_lifetime_ms(self.preset.lifetime, rng)? * cfg.lifetime_multiplier;
        let mass = cfg.base_mass * relative_volume.max(0.05);

        let radial = self.preset.radial_speed.scaled(cfg.speed_multiplier).sample(rng);
        let mut tangential = self
            .preset
            .tangential_speed
            .scaled(cfg.speed_multiplier)
            .sample(rng);
        if rng.chance(0.5) {
            tangential = -tangential;
        }
        let up = self.preset.vertical_speed.scaled(cfg.speed_multiplier).sample(rng);
        let speeds = LaunchSpeeds {
            radial,
            tangential,
            up,
        };
        let perturbation = VelocityPerturbation {
            wave_amplitude: WAVE_AMPLITUDE,
            wave_phase: self.wave_phase,
            jitter: cfg.jitter,
        };
        let velocity =
            compose_initial_velocity(&self.basis, speeds, Some(perturbation), Some(mass), rng)
                + offset.normalize_or_zero() * radial * SHARD_SPREAD / mass.sqrt();

        let mut fragment = Fragment::new(kind, position, lifetime_ms, instance_id);
        fragment.velocity = velocity;
        fragment.rotation = self.cube.facing;
        fragment.scale = Vec3::splat(cfg.scale.sample(rng) * self.cube_size);
        fragment.angular_velocity = generate_angular_velocity(cfg.angular_speed, Some(mass), rng)?;
        fragment.mass = Some(mass);
        if kind != FragmentKind::EdgeShard {
            fragment.color_tint = self.cube.color;
        }
        Ok(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::MaterialId;
    use crate::lifecycle::build_explosion_schedule;
    use crate::preset::QualityTier;
    use crate::random::FixedRandom;
    use crate::shards::generator::ShardGenerationOptions;
    use crate::shards::template_set::build_shard_template_set;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn templates() -> ShardTemplateSet {
        let mut rng = StdRng::seed_from_u64(11);
        build_shard_template_set(&ShardGenerationOptions::default(), 6, 0.5, &mut rng).unwrap()
    }

    fn row(level: u32, count: usize, stagger_ms: f64) -> RowDestructionSim {
        let cubes = (0..count as u32)
            .map(|x| DestructionCube::new(x, level, Vec3::new(2.5, level as f32, x as f32)))
            .collect();
        let slots = build_explosion_schedule(count, 0.0, stagger_ms, 0.0, &mut FixedRandom(0.5));
        RowDestructionSim::new(level, cubes, slots, 1.0, QualityTier::Ultra)
    }

    #[test]
    fn slot_starts_exactly_once() {
        let set = templates();
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = DestructionSimulationState::default();
        state.add_row(row(0, 1, 50.0));

        assert_eq!(state.launch_scheduled_explosions(0.0, &set, &mut rng).unwrap(), 1);
        assert_eq!(state.launch_scheduled_explosions(10.0, &set, &mut rng).unwrap(), 0);
        assert_eq!(state.active_cubes.len(), 1);
        assert!(!state.start_cube_explosion(0, 0, &set, &mut rng).unwrap());
    }

    #[test]
    fn slot_waits_for_its_start_time() {
        let set = templates();
        let mut rng = StdRng::seed_from_u64(2);
        let mut state = DestructionSimulationState::default();
        state.add_row(row(0, 2, 50.0));

        state.launch_scheduled_explosions(20.0, &set, &mut rng).unwrap();
        assert_eq!(state.active_cubes.len(), 1);
        assert_eq!(state.pending_slot_count(), 1);
        assert!(!state.should_render_whole_cube(0, 0));
        assert!(state.should_render_whole_cube(0, 1));
    }

    #[test]
    fn visibility_mask_tracks_started_cubes() {
        let set = templates();
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = DestructionSimulationState::default();
        state.add_row(row(4, 3, 50.0));
        state.launch_scheduled_explosions(60.0, &set, &mut rng).unwrap();

        let whole: Vec<u32> = state
            .whole_cubes_to_render(4)
            .unwrap()
            .iter()
            .map(|c| c.grid_x)
            .collect();
        assert_eq!(whole, vec![2]);
        assert_eq!(state.hidden_cube_ids(), vec!["0:4".to_string(), "1:4".to_string()]);
        assert!(matches!(
            state.whole_cubes_to_render(9),
            Err(DestructionError::UnknownRow { level: 9 })
        ));
    }

    #[test]
    fn two_staggered_cubes_both_become_active() {
        let set = templates();
        let mut rng = StdRng::seed_from_u64(4);
        let mut state = DestructionSimulationState::default();
        state.add_row(row(0, 2, 50.0));

        for _ in 0..5 {
            state.tick(16.0, &set, &mut rng).unwrap();
        }
        assert_eq!(state.active_cubes.len(), 2);
        assert_eq!(state.pending_slot_count(), 0);
        assert!(state.rows[&0].all_cubes_exploded);
    }

    #[test]
    fn missing_slot_is_an_error_and_leaves_state_untouched() {
        let set = templates();
        let mut rng = StdRng::seed_from_u64(5);
        let mut state = DestructionSimulationState::default();
        let mut r = row(0, 2, 50.0);
        r.explosions.retain(|s| s.cube_index == 0);
        state.add_row(r);

        assert_eq!(
            state.start_cube_explosion(0, 1, &set, &mut rng),
            Err(DestructionError::MissingExplosionSlot {
                level: 0,
                cube_index: 1
            })
        );
        assert!(state.active_cubes.is_empty());
    }

    #[test]
    fn empty_template_set_is_an_error() {
        let empty = ShardTemplateSet {
            templates: Vec::new(),
            coverage: Default::default(),
        };
        let mut rng = StdRng::seed_from_u64(6);
        let mut state = DestructionSimulationState::default();
        state.add_row(row(0, 1, 50.0));
        assert_eq!(
            state.launch_scheduled_explosions(0.0, &empty, &mut rng),
            Err(DestructionError::NoShardTemplates)
        );
        assert_eq!(state.pending_slot_count(), 1);
    }

    #[test]
    fn fragments_follow_template_faces() {
        let set = templates();
        let mut rng = StdRng::seed_from_u64(7);
        let cube = DestructionCube::new(0, 0, Vec3::new(2.5, 0.5, 0.0))
            .with_color(bevy::color::Color::srgb(0.2, 0.4, 0.9));
        let preset = DestructionPreset::ultra();
        let mut next = 100;
        let fragments =
            build_cube_fragments(&cube, &preset, 1.0, 4, &set, Vec3::ZERO, &mut next, &mut rng)
                .unwrap();

        let shards: Vec<&Fragment> = fragments.iter().filter(|f| f.template_id.is_some()).collect();
        assert_eq!(shards.len(), set.len());
        for (fragment, template) in shards.iter().zip(&set.templates) {
            assert_eq!(fragment.template_id, Some(template.id));
            if template.face == CubeFace::Front {
                assert_eq!(fragment.kind, FragmentKind::FaceShard);
                assert_eq!(fragment.material_id, MaterialId::Face);
                assert!(fragment.uv_rect.is_some());
                assert!(fragment.color_tint.is_some());
            } else {
                assert_eq!(fragment.kind, FragmentKind::EdgeShard);
                assert_eq!(fragment.material_id, MaterialId::Gold);
                assert!(fragment.uv_rect.is_none());
            }
        }

        let dust = fragments.iter().filter(|f| f.kind == FragmentKind::Dust).count();
        assert!(dust >= 8 && dust <= 12, "dust {dust}");

        let ids: Vec<u32> = fragments.iter().map(|f| f.instance_id).collect();
        assert_eq!(ids.first(), Some(&100));
        assert_eq!(next, 100 + fragments.len() as u32);
        assert!(fragments.iter().all(|f| f.age_ms == 0.0 && f.fade == 1.0));
    }

    #[test]
    fn debris_launches_away_from_the_tower() {
        let set = templates();
        let mut rng = StdRng::seed_from_u64(8);
        let cube = DestructionCube::new(0, 0, Vec3::new(2.5, 0.5, 0.0));
        let mut next = 0;
        let fragments = build_cube_fragments(
            &cube,
            &DestructionPreset::ultra(),
            1.0,
            4,
            &set,
            Vec3::ZERO,
            &mut next,
            &mut rng,
        )
        .unwrap();
        let mean_vx =
            fragments.iter().map(|f| f.velocity.x).sum::<f32>() / fragments.len() as f32;
        assert!(mean_vx > 1.0, "mean outward speed {mean_vx}");
    }

    #[test]
    fn launched_cubes_start_at_the_launch_time() {
        let set = templates();
        let mut rng = StdRng::seed_from_u64(4);
        let mut state = DestructionSimulationState::default();
        state.add_row(row(0, 2, 50.0));
        assert_eq!(state.clock_ms, 0.0);

        let started = state
            .launch_scheduled_explosions(120.0, &set, &mut rng)
            .unwrap();
        assert_eq!(started, 2);
        assert!(state.active_cubes.iter().all(|c| c.started_at_ms == 120.0));

        // Direct starts use the clock.
        state.add_row(row(1, 1, 0.0));
        state.clock_ms = 40.0;
        assert!(state.start_cube_explosion(1, 0, &set, &mut rng).unwrap());
        assert_eq!(state.active_cubes.last().unwrap().started_at_ms, 40.0);
    }

    #[test]
    fn heavier_shards_launch_slower() {
        let cube = DestructionCube::new(0, 0, Vec3::new(2.5, 0.5, 0.0));
        let preset = DestructionPreset::ultra();
        let spawner = FragmentSpawner {
            cube: &cube,
            preset: &preset,
            cube_size: 1.0,
            basis: compute_velocity_basis(cube.world_position, Vec3::new(0.0, 0.5, 0.0), Vec3::Y),
            wave_phase: 0.3,
        };
        let local = Vec3::new(0.3, 0.1, 0.2);
        let light = spawner
            .spawn(FragmentKind::FaceShard, local, 1.0, 0, &mut FixedRandom(0.7))
            .unwrap();
        let heavy = spawner
            .spawn(FragmentKind::FaceShard, local, 4.0, 1, &mut FixedRandom(0.7))
            .unwrap();
        // Four times the mass, half the launch velocity, spread included.
        assert!((heavy.velocity - light.velocity * 0.5).length() < 1e-4);
    }

    #[test]
    fn wave_phase_spans_the_configured_columns() {
        let set = templates();
        let preset = DestructionPreset::ultra();
        let launch = |grid_x: u32, columns: u32| {
            let cube = DestructionCube::new(grid_x, 0, Vec3::new(2.5, 0.5, 0.0));
            let mut next = 0;
            build_cube_fragments(
                &cube,
                &preset,
                1.0,
                columns,
                &set,
                Vec3::ZERO,
                &mut next,
                &mut FixedRandom(0.4),
            )
            .unwrap()
            .iter()
            .map(|f| f.velocity)
            .collect::<Vec<_>>()
        };
        // Column 4 of a 4-column tower is a full turn, the same phase as column 0.
        let first = launch(0, 4);
        let wrapped = launch(4, 4);
        for (a, b) in first.iter().zip(&wrapped) {
            assert!((*a - *b).length() < 1e-3);
        }
        assert_ne!(launch(1, 4), launch(1, 16));
    }

    #[test]
    fn scenario_finishes_after_all_debris_dies() {
        let set = templates();
        let mut rng = StdRng::seed_from_u64(9);
        let mut state = DestructionSimulationState::default();
        state.add_row(row(0, 2, 50.0));
        assert!(!state.is_finished());

        let mut finished_reports = 0;
        for _ in 0..400 {
            let report = state.tick(16.0, &set, &mut rng).unwrap();
            if report.scenario_finished {
                finished_reports += 1;
            }
        }
        assert!(state.is_finished());
        assert_eq!(finished_reports, 1);
        assert!(state.active_cubes.is_empty());
        assert_eq!(state.remove_finished_rows(), 1);
        assert!(state.rows.is_empty());
    }
}
