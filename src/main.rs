use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::env;
use std::time::Duration;

use shardfall::constants::DEMO_TICK_MS;
use shardfall::plugin::{publish_render_data, DestructionRenderData, DestructionSimulation};
use shardfall::{DestructionPlugin, LineClearFinished, LineClearRequest};

/// Give up if the line clear has not finished after this many frames.
const MAX_DEMO_FRAMES: u32 = 3000;

/// Cleared board levels for this run.
#[derive(Resource, Debug, Clone)]
struct DemoLevels(Vec<u32>);

#[derive(Resource, Debug, Default)]
struct DemoStats {
    frames: u32,
    peak_fragments: usize,
    peak_batches: usize,
}

/// Parse `SHARDFALL_LEVELS` (comma-separated levels).  Falls back to level 0.
fn parse_levels(raw: Option<&str>) -> Vec<u32> {
    let levels: Vec<u32> = raw
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            match s.parse() {
                Ok(level) => Some(level),
                Err(_) => {
                    eprintln!("⚠ Ignoring invalid level {s:?}");
                    None
                }
            }
        })
        .collect();
    if levels.is_empty() {
        vec![0]
    } else {
        levels
    }
}

fn request_demo_line_clear(levels: Res<DemoLevels>, mut requests: MessageWriter<LineClearRequest>) {
    requests.write(LineClearRequest::new(levels.0.clone()));
}

fn track_demo_stats(
    sim: Res<DestructionSimulation>,
    render: Res<DestructionRenderData>,
    mut stats: ResMut<DemoStats>,
    mut exit: MessageWriter<AppExit>,
) {
    stats.frames += 1;
    stats.peak_fragments = stats.peak_fragments.max(sim.state.fragment_count());
    stats.peak_batches = stats.peak_batches.max(render.batches.len());

    if stats.frames % 30 == 0 {
        debug!(
            "t={:.0} ms: {} active cubes, {} fragments, {} hidden cells",
            sim.state.clock_ms,
            sim.state.active_cubes.len(),
            sim.state.fragment_count(),
            render.hidden_cube_ids.len()
        );
    }
    if stats.frames >= MAX_DEMO_FRAMES {
        warn!("Line clear still running after {} frames; stopping", stats.frames);
        exit.write(AppExit::from_code(1));
    }
}

fn finish_demo(
    mut finished: MessageReader<LineClearFinished>,
    stats: Res<DemoStats>,
    mut exit: MessageWriter<AppExit>,
) {
    for done in finished.read() {
        info!(
            "Line clear done: {} rows in {:.0} ms ({} frames, peak {} fragments in {} batches)",
            done.rows, done.duration_ms, stats.frames, stats.peak_fragments, stats.peak_batches
        );
        exit.write(AppExit::Success);
    }
}

fn main() {
    // Levels to clear, e.g. SHARDFALL_LEVELS=0,1,2
    let levels = parse_levels(env::var("SHARDFALL_LEVELS").ok().as_deref());
    println!("Running line clear for levels {:?}", levels);

    App::new()
        .add_plugins((MinimalPlugins, LogPlugin::default()))
        // Fixed frame time so runs are comparable regardless of host speed.
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(
            DEMO_TICK_MS,
        )))
        .add_plugins(DestructionPlugin::default())
        .insert_resource(DemoLevels(levels))
        .init_resource::<DemoStats>()
        .add_systems(Startup, request_demo_line_clear)
        .add_systems(
            Update,
            (track_demo_stats, finish_demo)
                .chain()
                .after(publish_render_data),
        )
        .run();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_parse_from_env_string() {
        assert_eq!(parse_levels(Some("0, 2,5")), vec![0, 2, 5]);
        assert_eq!(parse_levels(Some("3,x,")), vec![3]);
        assert_eq!(parse_levels(None), vec![0]);
        assert_eq!(parse_levels(Some("")), vec![0]);
    }
}
