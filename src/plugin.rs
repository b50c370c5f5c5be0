//! Bevy integration: resources, messages and the per-frame destruction tick.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{load_destruction_config, DestructionConfig};
use crate::error::DestructionError;
use crate::orchestrator::DestructionSimulationState;
use crate::preset::QualityTier;
use crate::render_batch::{collect_render_batches, RenderBatch};
use crate::scenario::queue_line_clear;
use crate::shards::template_set::ShardTemplateCache;

pub struct DestructionPlugin {
    /// Read `assets/destruction.toml` at startup.
    pub load_config_file: bool,
}

impl Default for DestructionPlugin {
    fn default() -> Self {
        Self {
            load_config_file: true,
        }
    }
}

impl Plugin for DestructionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DestructionConfig>()
            .init_resource::<ShardTemplateCache>()
            .init_resource::<DestructionSimulation>()
            .init_resource::<DestructionRenderData>()
            .insert_resource(DestructionRng(StdRng::from_entropy()))
            .add_message::<LineClearRequest>()
            .add_message::<LineClearFinished>()
            .add_systems(
                Update,
                (queue_line_clears, tick_destruction, publish_render_data).chain(),
            );

        if self.load_config_file {
            app.add_systems(
                Startup,
                (load_destruction_config, apply_destruction_config).chain(),
            );
        } else {
            app.add_systems(Startup, apply_destruction_config);
        }
    }
}

/// Rows were cleared on the board; blow them up.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct LineClearRequest {
    pub levels: Vec<u32>,
    /// Overrides the configured quality tier.
    pub quality: Option<QualityTier>,
}

impl LineClearRequest {
    pub fn new(levels: Vec<u32>) -> Self {
        Self {
            levels,
            quality: None,
        }
    }
}

/// Sent once every cube of every queued row has exploded and all debris is gone.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct LineClearFinished {
    pub rows: usize,
    pub duration_ms: f64,
}

/// The live destruction state.  Systems are its only writers.
#[derive(Resource, Debug, Default)]
pub struct DestructionSimulation {
    pub state: DestructionSimulationState,
    /// Most recent failure from a tick; the pending rows are dropped when set.
    pub last_error: Option<DestructionError>,
}

#[derive(Resource)]
pub struct DestructionRng(pub StdRng);

/// Per-frame snapshot for the render layer.
#[derive(Resource, Debug, Default)]
pub struct DestructionRenderData {
    pub batches: Vec<RenderBatch>,
    pub hidden_cube_ids: Vec<String>,
}

/// Startup system: rebuild the cache, state and RNG from the final config.
pub fn apply_destruction_config(
    config: Res<DestructionConfig>,
    mut cache: ResMut<ShardTemplateCache>,
    mut sim: ResMut<DestructionSimulation>,
    mut rng: ResMut<DestructionRng>,
) {
    *cache = ShardTemplateCache::new(
        config.shards.clone(),
        config.coverage_resolution,
        config.min_covered_fraction,
    );
    sim.state = DestructionSimulationState::new(config.physics.clone());
    sim.state.tower_center = config.tower.center;
    sim.last_error = None;
    if let Some(seed) = config.seed {
        rng.0 = StdRng::seed_from_u64(seed);
        debug!("destruction RNG seeded with {seed}");
    }
}

pub fn queue_line_clears(
    mut requests: MessageReader<LineClearRequest>,
    config: Res<DestructionConfig>,
    mut sim: ResMut<DestructionSimulation>,
    mut rng: ResMut<DestructionRng>,
) {
    for request in requests.read() {
        let mut options = config.scenario_options();
        if let Some(quality) = request.quality {
            options.quality = quality;
        }
        let queued = queue_line_clear(
            &mut sim.state,
            &config.tower,
            &request.levels,
            &options,
            &mut rng.0,
        );
        info!(
            "Line clear queued: levels {:?}, {} rows, {:?} quality",
            request.levels, queued, options.quality
        );
    }
}

pub fn tick_destruction(
    time: Res<Time>,
    mut sim: ResMut<DestructionSimulation>,
    mut cache: ResMut<ShardTemplateCache>,
    mut rng: ResMut<DestructionRng>,
    mut finished: MessageWriter<LineClearFinished>,
) {
    if sim.state.rows.is_empty() && sim.state.active_cubes.is_empty() {
        return;
    }
    let templates = match cache.default_set(&mut rng.0) {
        Ok(templates) => templates,
        Err(e) => {
            error!("Cannot build shard templates: {e}");
            return;
        }
    };

    let dt_ms = time.delta_secs() * 1000.0;
    let sim = &mut *sim;
    match sim.state.tick(dt_ms, &templates, &mut rng.0) {
        Ok(report) => {
            if report.scenario_finished {
                let duration_ms = sim
                    .state
                    .scenario
                    .map(|meta| sim.state.clock_ms - meta.started_at_ms)
                    .unwrap_or_default();
                let rows = sim.state.remove_finished_rows();
                finished.write(LineClearFinished { rows, duration_ms });
                sim.state.scenario = None;
            }
        }
        Err(e) => {
            warn!("Destruction tick failed: {e}; dropping pending rows");
            sim.state.rows.clear();
            sim.last_error = Some(e);
        }
    }
}

pub fn publish_render_data(
    sim: Res<DestructionSimulation>,
    mut render: ResMut<DestructionRenderData>,
) {
    if !sim.is_changed() {
        return;
    }
    render.batches = collect_render_batches(&sim.state);
    render.hidden_cube_ids = sim.state.hidden_cube_ids();
}
