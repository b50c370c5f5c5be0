//! Destruction-specific error types.
//!
//! Two families of failure exist:
//!
//! - **Configuration errors** (bad ranges, zero totals, all-zero weights) are
//!   raised at construction time.  They indicate a preset or option object that
//!   should have been validated up front and are never retried.
//! - **Missing-data errors** (no explosion slot, cube index out of range, empty
//!   template set, unknown template id) abort the operation that hit them.
//!
//! Physics integration never produces an error: degenerate inputs are
//! normalised or clamped instead.
//!
//! ## Usage
//!
//! ```rust
//! use shardfall::error::{DestructionError, DestructionResult};
//!
//! fn checked_count(total: u32) -> DestructionResult<u32> {
//!     if total == 0 {
//!         return Err(DestructionError::NonPositiveTotal { total });
//!     }
//!     Ok(total)
//! }
//! assert!(checked_count(0).is_err());
//! ```

use std::fmt;

/// Top-level error enum for the destruction engine.
#[derive(Debug, Clone, PartialEq)]
pub enum DestructionError {
    /// A generic `[min, max]` range had `max < min`, a negative bound, or a
    /// non-finite value.
    InvalidRange {
        /// Name of the range (for logging).
        name: &'static str,
        min: f32,
        max: f32,
    },

    /// Angular speed range rejected by `generate_angular_velocity`.
    InvalidAngularSpeedRange { min: f32, max: f32 },

    /// Lifetime range rejected by `generate_lifetime_ms`.
    InvalidLifetimeRange { min_ms: f32, max_ms: f32 },

    /// `allocate_fragment_counts` was asked to split a zero budget.
    NonPositiveTotal { total: u32 },

    /// Allocation weights were empty, negative, non-finite, or all zero.
    InvalidWeights {
        /// Human-readable description of what was wrong.
        reason: &'static str,
    },

    /// No explosion slot is scheduled for the requested cube.
    MissingExplosionSlot { level: u32, cube_index: usize },

    /// Cube index does not address a cube in the row.
    CubeIndexOutOfRange {
        level: u32,
        cube_index: usize,
        cube_count: usize,
    },

    /// The shard template set handed to the fragment builder was empty.
    NoShardTemplates,

    /// A template id was looked up that the volume map does not know about.
    ShardGeometryNotFound { template_id: u32 },

    /// A row was addressed by a level that has no destruction in flight.
    UnknownRow { level: u32 },
}

impl fmt::Display for DestructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestructionError::InvalidRange { name, min, max } => write!(
                f,
                "invalid {} range [{}, {}]: bounds must be finite, non-negative and min <= max",
                name, min, max
            ),
            DestructionError::InvalidAngularSpeedRange { min, max } => write!(
                f,
                "invalid angular speed range [{}, {}]: bounds must be non-negative and min <= max",
                min, max
            ),
            DestructionError::InvalidLifetimeRange { min_ms, max_ms } => write!(
                f,
                "invalid lifetime range [{} ms, {} ms]: bounds must be non-negative and min <= max",
                min_ms, max_ms
            ),
            DestructionError::NonPositiveTotal { total } => {
                write!(f, "fragment total must be positive, got {}", total)
            }
            DestructionError::InvalidWeights { reason } => {
                write!(f, "invalid fragment weights: {}", reason)
            }
            DestructionError::MissingExplosionSlot { level, cube_index } => write!(
                f,
                "no explosion slot scheduled for cube {} in row {}",
                cube_index, level
            ),
            DestructionError::CubeIndexOutOfRange {
                level,
                cube_index,
                cube_count,
            } => write!(
                f,
                "cube index {} out of range for row {} ({} cubes)",
                cube_index, level, cube_count
            ),
            DestructionError::NoShardTemplates => {
                write!(f, "no shard templates available to build fragments from")
            }
            DestructionError::ShardGeometryNotFound { template_id } => {
                write!(f, "shard geometry not found for template {}", template_id)
            }
            DestructionError::UnknownRow { level } => {
                write!(f, "no destruction row registered for level {}", level)
            }
        }
    }
}

impl std::error::Error for DestructionError {}

/// Convenience alias: a `Result` using `DestructionError` as the error type.
pub type DestructionResult<T> = Result<T, DestructionError>;

// ── Validation helpers ────────────────────────────────────────────────────────

/// Returns an error unless `min` and `max` are finite, non-negative and ordered.
pub fn validate_range(name: &'static str, min: f32, max: f32) -> DestructionResult<()> {
    if !min.is_finite() || !max.is_finite() || min < 0.0 || max < min {
        Err(DestructionError::InvalidRange { name, min, max })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_range_accepts_ordered_bounds() {
        assert!(validate_range("speed", 0.0, 0.0).is_ok());
        assert!(validate_range("speed", 1.0, 3.0).is_ok());
    }

    #[test]
    fn validate_range_rejects_inverted_negative_and_nan() {
        assert!(validate_range("speed", 3.0, 2.0).is_err());
        assert!(validate_range("speed", -1.0, 2.0).is_err());
        assert!(validate_range("speed", f32::NAN, 2.0).is_err());
    }

    #[test]
    fn display_names_the_offending_cube() {
        let err = DestructionError::CubeIndexOutOfRange {
            level: 3,
            cube_index: 12,
            cube_count: 10,
        };
        let text = err.to_string();
        assert!(text.contains("12"));
        assert!(text.contains("row 3"));
    }
}
