//! Line-clear destruction engine for a cylindrical falling-block tower.
//!
//! Cleared rows break apart cube by cube: each cube is carved into irregular
//! shard templates, the shards and some dust are launched outward, and a small
//! numeric integrator carries the debris until it fades out.
//!
//! The core ([`orchestrator::DestructionSimulationState`]) is plain Rust and
//! advances only when ticked; [`plugin::DestructionPlugin`] wires it into a
//! Bevy app.

pub mod allocator;
pub mod config;
pub mod constants;
pub mod error;
pub mod fragment;
pub mod lifecycle;
pub mod orchestrator;
pub mod physics;
pub mod plugin;
pub mod preset;
pub mod random;
pub mod render_batch;
pub mod scenario;
pub mod shards;
pub mod velocity;

pub use error::{DestructionError, DestructionResult};
pub use orchestrator::DestructionSimulationState;
pub use plugin::{DestructionPlugin, LineClearFinished, LineClearRequest};
