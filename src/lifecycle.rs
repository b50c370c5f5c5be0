//! Per-row and per-cube destruction state.
//!
//! A cleared row becomes a [`RowDestructionSim`]: the cubes that were in it
//! plus one [`CubeExplosionSlot`] per cube saying when that cube breaks.
//! Slots move `pending → started` exactly once.  A started cube owns a
//! [`CubeDestructionSim`] holding its live fragments until they all die.

use bevy::color::Color;
use bevy::math::{Quat, Vec3};

use crate::constants::TOWER_COLUMNS;
use crate::error::{DestructionError, DestructionResult};
use crate::fragment::Fragment;
use crate::preset::{DestructionPreset, QualityTier};
use crate::random::RandomSource;

/// One board cube caught in a line clear.
#[derive(Debug, Clone, PartialEq)]
pub struct DestructionCube {
    /// Board column.
    pub grid_x: u32,
    /// Board level (row).
    pub grid_y: u32,
    pub world_position: Vec3,
    /// Rotation taking cube-local `+Z` (the front face) to the outward direction.
    pub facing: Quat,
    pub color: Option<Color>,
}

impl DestructionCube {
    pub fn new(grid_x: u32, grid_y: u32, world_position: Vec3) -> Self {
        Self {
            grid_x,
            grid_y,
            world_position,
            facing: Quat::IDENTITY,
            color: None,
        }
    }

    pub fn with_facing(mut self, facing: Quat) -> Self {
        self.facing = facing;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// `"x:y"` board-cell id used by the renderer's hide mask.
    pub fn cell_id(&self) -> String {
        format!("{}:{}", self.grid_x, self.grid_y)
    }
}

/// When one cube of a row starts exploding.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeExplosionSlot {
    pub cube_index: usize,
    pub start_time_ms: f64,
    started: bool,
}

impl CubeExplosionSlot {
    pub fn new(cube_index: usize, start_time_ms: f64) -> Self {
        Self {
            cube_index,
            start_time_ms,
            started: false,
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_due(&self, now_ms: f64) -> bool {
        !self.started && now_ms >= self.start_time_ms
    }

    /// Flip to started.  Returns `false` if the slot had already started.
    pub fn mark_started(&mut self) -> bool {
        !std::mem::replace(&mut self.started, true)
    }
}

/// Destruction of one cleared row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowDestructionSim {
    pub level: u32,
    pub cubes: Vec<DestructionCube>,
    pub explosions: Vec<CubeExplosionSlot>,
    pub all_cubes_exploded: bool,
    /// Edge length of one cube in world units.
    pub cube_size: f32,
    /// Columns around the tower; sets the launch wave period.
    pub columns: u32,
    pub preset: DestructionPreset,
    pub quality: QualityTier,
}

impl RowDestructionSim {
    pub fn new(
        level: u32,
        cubes: Vec<DestructionCube>,
        explosions: Vec<CubeExplosionSlot>,
        cube_size: f32,
        quality: QualityTier,
    ) -> Self {
        Self {
            level,
            cubes,
            explosions,
            all_cubes_exploded: false,
            cube_size,
            columns: TOWER_COLUMNS,
            preset: quality.preset(),
            quality,
        }
    }

    pub fn with_columns(mut self, columns: u32) -> Self {
        self.columns = columns.max(1);
        self
    }

    pub fn cube(&self, cube_index: usize) -> DestructionResult<&DestructionCube> {
        self.cubes
            .get(cube_index)
            .ok_or(DestructionError::CubeIndexOutOfRange {
                level: self.level,
                cube_index,
                cube_count: self.cubes.len(),
            })
    }

    pub fn slot(&self, cube_index: usize) -> DestructionResult<&CubeExplosionSlot> {
        self.explosions
            .iter()
            .find(|s| s.cube_index == cube_index)
            .ok_or(DestructionError::MissingExplosionSlot {
                level: self.level,
                cube_index,
            })
    }

    pub fn slot_mut(&mut self, cube_index: usize) -> DestructionResult<&mut CubeExplosionSlot> {
        let level = self.level;
        self.explosions
            .iter_mut()
            .find(|s| s.cube_index == cube_index)
            .ok_or(DestructionError::MissingExplosionSlot { level, cube_index })
    }

    /// Cube indices whose slots are due at `now_ms`, in schedule order.
    pub fn due_cubes(&self, now_ms: f64) -> Vec<usize> {
        self.explosions
            .iter()
            .filter(|s| s.is_due(now_ms))
            .map(|s| s.cube_index)
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.explosions.iter().filter(|s| !s.is_started()).count()
    }

    /// A cube without a slot never explodes, so it stays whole.
    pub fn is_cube_started(&self, cube_index: usize) -> bool {
        self.slot(cube_index).map(|s| s.is_started()).unwrap_or(false)
    }

    pub fn whole_cubes(&self) -> impl Iterator<Item = &DestructionCube> + '_ {
        self.cubes
            .iter()
            .enumerate()
            .filter(move |(i, _)| !self.is_cube_started(*i))
            .map(|(_, cube)| cube)
    }

    pub fn started_cubes(&self) -> impl Iterator<Item = &DestructionCube> + '_ {
        self.cubes
            .iter()
            .enumerate()
            .filter(move |(i, _)| self.is_cube_started(*i))
            .map(|(_, cube)| cube)
    }

    pub fn refresh_exploded(&mut self) -> bool {
        self.all_cubes_exploded = self.explosions.iter().all(|s| s.is_started());
        self.all_cubes_exploded
    }
}

/// Live debris of one exploded cube.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeDestructionSim {
    /// Level of the row this cube belonged to.
    pub level: u32,
    pub cube: DestructionCube,
    pub fragments: Vec<Fragment>,
    pub started_at_ms: f64,
    pub finished: bool,
}

/// Staggered slots for `cube_count` cubes: cube `i` starts at
/// `start_ms + i·stagger_ms`, shifted by up to `±jitter·stagger_ms`.
///
/// Jittered times never precede `start_ms`.  Zero jitter draws nothing from
/// `rng`.
pub fn build_explosion_schedule<R: RandomSource + ?Sized>(
    cube_count: usize,
    start_ms: f64,
    stagger_ms: f64,
    jitter: f32,
    rng: &mut R,
) -> Vec<CubeExplosionSlot> {
    let stagger_ms = stagger_ms.max(0.0);
    let jitter = jitter.clamp(0.0, 1.0) as f64;
    (0..cube_count)
        .map(|i| {
            let mut t = start_ms + i as f64 * stagger_ms;
            if jitter > 0.0 {
                let shift = (rng.next_unit() as f64 * 2.0 - 1.0) * jitter * stagger_ms;
                t = (t + shift).max(start_ms);
            }
            CubeExplosionSlot::new(i, t)
        })
        .collect()
}
