//! Runtime destruction configuration loaded from `assets/destruction.toml`.
//!
//! [`DestructionConfig`] is a Bevy [`Resource`] collecting every tunable of a
//! line clear.  At startup, [`load_destruction_config`] reads
//! `assets/destruction.toml` and overwrites the defaults with any values
//! present in the file.  Missing keys fall back to the compile-time defaults
//! in [`crate::constants`], so a minimal TOML can override just the knobs you
//! care about:
//!
//! ```toml
//! quality = "Low"
//! seed = 42
//!
//! [physics]
//! linear_drag = 0.5
//!
//! [physics.radius_limit.response]
//! mode = "damp"
//! radial_damping = 0.6
//! ```
//!
//! Keep `src/constants.rs` in sync: it remains the authoritative default
//! source used by `DestructionConfig::default()`.

use bevy::log::{info, warn};
use bevy::prelude::{ResMut, Resource};
use serde::{Deserialize, Serialize};

use crate::constants::{COVERAGE_RESOLUTION, MIN_COVERED_FRACTION};
use crate::error::DestructionResult;
use crate::physics::FragmentPhysicsConfig;
use crate::preset::QualityTier;
use crate::scenario::{ScenarioOptions, TowerGeometry};
use crate::shards::generator::ShardGenerationOptions;

pub const DESTRUCTION_CONFIG_PATH: &str = "assets/destruction.toml";

/// Runtime-tunable destruction configuration.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DestructionConfig {
    /// Quality tier used for rows queued without an explicit tier.
    pub quality: QualityTier,
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub physics: FragmentPhysicsConfig,
    pub shards: ShardGenerationOptions,
    pub coverage_resolution: u32,
    pub min_covered_fraction: f32,
    pub scenario: ScenarioOptions,
    pub tower: TowerGeometry,
}

impl Default for DestructionConfig {
    fn default() -> Self {
        Self {
            quality: QualityTier::default(),
            seed: None,
            physics: FragmentPhysicsConfig::default(),
            shards: ShardGenerationOptions::default(),
            coverage_resolution: COVERAGE_RESOLUTION,
            min_covered_fraction: MIN_COVERED_FRACTION,
            scenario: ScenarioOptions::default(),
            tower: TowerGeometry::default(),
        }
    }
}

impl DestructionConfig {
    /// Scenario options with the top-level quality tier applied.
    pub fn scenario_options(&self) -> ScenarioOptions {
        ScenarioOptions {
            quality: self.quality,
            ..self.scenario
        }
    }

    pub fn validate(&self) -> DestructionResult<()> {
        self.shards.validate()?;
        self.quality.preset().validate()
    }
}

pub fn parse_destruction_config(contents: &str) -> Result<DestructionConfig, toml::de::Error> {
    toml::from_str(contents)
}

/// Startup system: attempt to load `assets/destruction.toml` and overwrite
/// the `DestructionConfig` resource with any values present in the file.
///
/// Parse errors and configs that fail validation are logged and the defaults
/// kept.  A missing file is not an error.
pub fn load_destruction_config(mut config: ResMut<DestructionConfig>) {
    let path = DESTRUCTION_CONFIG_PATH;
    match std::fs::read_to_string(path) {
        Ok(contents) => match parse_destruction_config(&contents) {
            Ok(loaded) => match loaded.validate() {
                Ok(()) => {
                    *config = loaded;
                    info!("Loaded destruction config from {path}");
                }
                Err(e) => warn!("Rejected {path}: {e}; using defaults"),
            },
            Err(e) => warn!("Failed to parse {path}: {e}; using defaults"),
        },
        Err(_) => info!("No {path} found; using compiled defaults"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::RadiusResponse;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(parse_destruction_config("").unwrap(), DestructionConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = parse_destruction_config(
            r#"
            quality = "Low"
            seed = 42

            [physics]
            linear_drag = 0.5

            [physics.radius_limit]
            max_radius = 6.0

            [physics.radius_limit.response]
            mode = "damp"
            radial_damping = 0.6
            "#,
        )
        .unwrap();

        assert_eq!(config.quality, QualityTier::Low);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.physics.linear_drag, 0.5);
        assert_eq!(
            config.physics.angular_drag,
            FragmentPhysicsConfig::default().angular_drag
        );
        let limit = config.physics.radius_limit.unwrap();
        assert_eq!(limit.max_radius, 6.0);
        assert_eq!(
            limit.response,
            RadiusResponse::Damp {
                radial_damping: 0.6
            }
        );
        assert_eq!(config.shards, ShardGenerationOptions::default());
        assert_eq!(config.scenario_options().quality, QualityTier::Low);
    }

    #[test]
    fn kill_response_parses() {
        let config = parse_destruction_config(
            r#"
            [physics.radius_limit.response]
            mode = "kill"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.physics.radius_limit.map(|l| l.response),
            Some(RadiusResponse::Kill)
        );
    }

    #[test]
    fn quality_is_only_set_at_the_top_level() {
        let config = parse_destruction_config(
            r#"
            quality = "Low"

            [scenario]
            stagger_ms = 20.0
            "#,
        )
        .unwrap();
        assert_eq!(config.scenario.stagger_ms, 20.0);
        assert_eq!(config.scenario_options().quality, QualityTier::Low);

        let nested = parse_destruction_config(
            r#"
            [scenario]
            quality = "Low"
            "#,
        );
        assert!(nested.is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(parse_destruction_config("quality = 3").is_err());
    }

    #[test]
    fn invalid_shard_options_fail_validation() {
        let mut config = DestructionConfig::default();
        config.shards.front_shards.min = 0;
        assert!(config.validate().is_err());
        assert!(DestructionConfig::default().validate().is_ok());
    }
}
