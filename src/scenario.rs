//! Line-clear scenarios: tower geometry → cubes → staggered rows.

use std::f32::consts::TAU;

use bevy::color::Color;
use bevy::math::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::{
    CUBE_SIZE, EXPLOSION_STAGGER_JITTER, EXPLOSION_STAGGER_MS, TOWER_COLUMNS, TOWER_RADIUS,
};
use crate::lifecycle::{build_explosion_schedule, DestructionCube, RowDestructionSim};
use crate::orchestrator::DestructionSimulationState;
use crate::preset::QualityTier;
use crate::random::RandomSource;

/// Cylindrical board: `columns` cubes around a ring, stacked by level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerGeometry {
    pub columns: u32,
    /// Distance from the tower axis to a cube centre.
    pub radius: f32,
    pub cube_size: f32,
    /// Base of the tower axis.
    pub center: Vec3,
}

impl Default for TowerGeometry {
    fn default() -> Self {
        Self {
            columns: TOWER_COLUMNS,
            radius: TOWER_RADIUS,
            cube_size: CUBE_SIZE,
            center: Vec3::ZERO,
        }
    }
}

impl TowerGeometry {
    /// Angle of column `x` around the axis; column 0 faces `+Z`.
    pub fn column_angle(&self, x: u32) -> f32 {
        let columns = self.columns.max(1);
        (x % columns) as f32 / columns as f32 * TAU
    }

    /// Centre of the cube at column `x`, level `level`.
    pub fn cube_position(&self, x: u32, level: u32) -> Vec3 {
        let angle = self.column_angle(x);
        self.center
            + Vec3::new(
                angle.sin() * self.radius,
                (level as f32 + 0.5) * self.cube_size,
                angle.cos() * self.radius,
            )
    }

    /// Rotation taking cube-local `+Z` to the outward direction of column `x`.
    pub fn cube_facing(&self, x: u32) -> Quat {
        Quat::from_rotation_y(self.column_angle(x))
    }

    pub fn cube(&self, x: u32, level: u32) -> DestructionCube {
        DestructionCube::new(x, level, self.cube_position(x, level))
            .with_facing(self.cube_facing(x))
            .with_color(column_color(x, self.columns))
    }
}

/// Timing and quality of a line clear.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioOptions {
    /// Delay between consecutive cubes of a row.
    pub stagger_ms: f32,
    /// Random shift of each start time, as a fraction of `stagger_ms`.
    pub stagger_jitter: f32,
    /// Extra delay for each further cleared row.
    pub row_delay_ms: f32,
    /// Not read from config files; the top-level `quality` key sets it.
    #[serde(skip)]
    pub quality: QualityTier,
}

impl Default for ScenarioOptions {
    fn default() -> Self {
        Self {
            stagger_ms: EXPLOSION_STAGGER_MS,
            stagger_jitter: EXPLOSION_STAGGER_JITTER,
            row_delay_ms: 0.0,
            quality: QualityTier::default(),
        }
    }
}

/// Board palette: hue sweeps once around the ring.
pub fn column_color(x: u32, columns: u32) -> Color {
    let hue = (x % columns.max(1)) as f32 / columns.max(1) as f32 * 360.0;
    Color::hsl(hue, 0.65, 0.55)
}

/// One row per cleared level.  Cubes sweep around the ring from column 0;
/// rows start at `start_ms` plus `row_delay_ms` per preceding level.
pub fn build_line_scenario<R: RandomSource + ?Sized>(
    geometry: &TowerGeometry,
    levels: &[u32],
    options: &ScenarioOptions,
    start_ms: f64,
    rng: &mut R,
) -> Vec<RowDestructionSim> {
    levels
        .iter()
        .enumerate()
        .map(|(row_index, &level)| {
            let cubes: Vec<DestructionCube> =
                (0..geometry.columns).map(|x| geometry.cube(x, level)).collect();
            let row_start = start_ms + row_index as f64 * options.row_delay_ms as f64;
            let slots = build_explosion_schedule(
                cubes.len(),
                row_start,
                options.stagger_ms as f64,
                options.stagger_jitter,
                rng,
            );
            RowDestructionSim::new(level, cubes, slots, geometry.cube_size, options.quality)
                .with_columns(geometry.columns)
        })
        .collect()
}

/// Build a scenario at the state's current clock and register its rows.
/// Returns the number of rows queued.
pub fn queue_line_clear<R: RandomSource + ?Sized>(
    state: &mut DestructionSimulationState,
    geometry: &TowerGeometry,
    levels: &[u32],
    options: &ScenarioOptions,
    rng: &mut R,
) -> usize {
    state.tower_center = geometry.center;
    let rows = build_line_scenario(geometry, levels, options, state.clock_ms, rng);
    let count = rows.len();
    for row in rows {
        state.add_row(row);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::FixedRandom;

    #[test]
    fn cubes_sit_on_the_ring() {
        let geometry = TowerGeometry::default();
        for x in 0..geometry.columns {
            let p = geometry.cube_position(x, 2);
            let r = (p.x * p.x + p.z * p.z).sqrt();
            assert!((r - geometry.radius).abs() < 1e-4);
            assert!((p.y - 2.5).abs() < 1e-6);
        }
    }

    #[test]
    fn facing_points_front_face_outward() {
        let geometry = TowerGeometry::default();
        for x in [0, 3, 8, 13] {
            let outward = geometry.cube_facing(x) * Vec3::Z;
            let p = geometry.cube_position(x, 0);
            let radial = Vec3::new(p.x, 0.0, p.z).normalize();
            assert!((outward - radial).length() < 1e-4, "column {x}");
        }
    }

    #[test]
    fn scenario_has_one_row_per_level_with_sweeping_schedule() {
        let geometry = TowerGeometry {
            columns: 4,
            ..Default::default()
        };
        let options = ScenarioOptions {
            stagger_ms: 50.0,
            stagger_jitter: 0.0,
            row_delay_ms: 100.0,
            quality: QualityTier::Low,
        };
        let rows = build_line_scenario(&geometry, &[1, 5], &options, 0.0, &mut FixedRandom(0.5));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].level, 5);
        assert_eq!(rows[1].quality, QualityTier::Low);
        assert!(rows.iter().all(|row| row.columns == 4));
        let times: Vec<f64> = rows[1].explosions.iter().map(|s| s.start_time_ms).collect();
        assert_eq!(times, vec![100.0, 150.0, 200.0, 250.0]);
        assert!(rows[0].cubes.iter().all(|c| c.grid_y == 1 && c.color.is_some()));
    }

    #[test]
    fn queue_registers_rows_at_current_clock() {
        let mut state = DestructionSimulationState::default();
        state.clock_ms = 1000.0;
        let options = ScenarioOptions {
            stagger_jitter: 0.0,
            ..Default::default()
        };
        let queued = queue_line_clear(
            &mut state,
            &TowerGeometry::default(),
            &[0],
            &options,
            &mut FixedRandom(0.5),
        );
        assert_eq!(queued, 1);
        assert_eq!(state.rows[&0].explosions[0].start_time_ms, 1000.0);
        assert!(!state.is_finished());
    }
}
