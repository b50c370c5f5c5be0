//! Largest-remainder split of a fragment budget across weighted buckets.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_FRAGMENT_WEIGHTS;
use crate::error::{DestructionError, DestructionResult};

/// Relative share of each fragment kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FragmentWeights {
    pub face_shards: f32,
    pub edge_shards: f32,
    pub dust: f32,
}

impl Default for FragmentWeights {
    fn default() -> Self {
        let [face_shards, edge_shards, dust] = DEFAULT_FRAGMENT_WEIGHTS;
        Self {
            face_shards,
            edge_shards,
            dust,
        }
    }
}

impl FragmentWeights {
    pub fn as_array(&self) -> [f32; 3] {
        [self.face_shards, self.edge_shards, self.dust]
    }

    pub fn validate(&self) -> DestructionResult<()> {
        check_weights(&self.as_array())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FragmentCounts {
    pub face_shards: u32,
    pub edge_shards: u32,
    pub dust: u32,
}

impl FragmentCounts {
    pub fn total(&self) -> u32 {
        self.face_shards + self.edge_shards + self.dust
    }
}

/// Split `total` across `weights`.  The result always sums to `total`.
///
/// Each bucket gets the floor of its ideal share; the leftover units go one
/// at a time to the largest fractional remainders, earlier buckets first on
/// ties.
pub fn allocate_counts(total: u32, weights: &[f32]) -> DestructionResult<Vec<u32>> {
    if total == 0 {
        return Err(DestructionError::NonPositiveTotal { total });
    }
    check_weights(weights)?;
    let sum: f64 = weights.iter().map(|&w| w as f64).sum();

    let ideal: Vec<f64> = weights
        .iter()
        .map(|&w| total as f64 * w as f64 / sum)
        .collect();
    let mut counts: Vec<u32> = ideal.iter().map(|x| x.floor() as u32).collect();
    let assigned: u32 = counts.iter().sum();
    let leftover = total.saturating_sub(assigned) as usize;

    let mut order: Vec<usize> = (0..weights.len()).collect();
    // Stable sort keeps declaration order on equal remainders.
    order.sort_by(|&a, &b| {
        let ra = ideal[a] - ideal[a].floor();
        let rb = ideal[b] - ideal[b].floor();
        rb.total_cmp(&ra)
    });
    for &i in order.iter().cycle().take(leftover) {
        counts[i] += 1;
    }
    Ok(counts)
}

fn check_weights(weights: &[f32]) -> DestructionResult<()> {
    if weights.is_empty() {
        return Err(DestructionError::InvalidWeights {
            reason: "no buckets",
        });
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(DestructionError::InvalidWeights {
            reason: "weights must be finite and non-negative",
        });
    }
    if weights.iter().all(|&w| w == 0.0) {
        return Err(DestructionError::InvalidWeights {
            reason: "all weights are zero",
        });
    }
    Ok(())
}

pub fn allocate_fragment_counts(
    total: u32,
    weights: &FragmentWeights,
) -> DestructionResult<FragmentCounts> {
    let counts = allocate_counts(total, &weights.as_array())?;
    Ok(FragmentCounts {
        face_shards: counts[0],
        edge_shards: counts[1],
        dust: counts[2],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_split_twenty() {
        let counts = allocate_fragment_counts(20, &FragmentWeights::default()).unwrap();
        assert_eq!(
            counts,
            FragmentCounts {
                face_shards: 10,
                edge_shards: 6,
                dust: 4
            }
        );
    }

    #[test]
    fn equal_weights_favour_earlier_buckets() {
        let weights = FragmentWeights {
            face_shards: 1.0,
            edge_shards: 1.0,
            dust: 1.0,
        };
        let counts = allocate_fragment_counts(7, &weights).unwrap();
        assert_eq!((counts.face_shards, counts.edge_shards, counts.dust), (3, 2, 2));
    }

    #[test]
    fn counts_always_sum_to_total() {
        let weight_sets: [&[f32]; 4] = [
            &[0.5, 0.3, 0.2],
            &[0.1, 0.0, 0.9],
            &[3.0, 7.0],
            &[0.33, 0.33, 0.33, 0.01],
        ];
        for weights in weight_sets {
            for total in 1..=97 {
                let counts = allocate_counts(total, weights).unwrap();
                assert_eq!(counts.iter().sum::<u32>(), total, "{weights:?} {total}");
            }
        }
    }

    #[test]
    fn zero_weight_bucket_stays_empty() {
        let counts = allocate_counts(10, &[1.0, 0.0, 1.0]).unwrap();
        assert_eq!(counts, vec![5, 0, 5]);
    }

    #[test]
    fn rejects_zero_total_and_zero_weights() {
        assert_eq!(
            allocate_fragment_counts(0, &FragmentWeights::default()),
            Err(DestructionError::NonPositiveTotal { total: 0 })
        );
        let zero = FragmentWeights {
            face_shards: 0.0,
            edge_shards: 0.0,
            dust: 0.0,
        };
        assert!(matches!(
            allocate_fragment_counts(5, &zero),
            Err(DestructionError::InvalidWeights { .. })
        ));
        assert!(allocate_counts(5, &[1.0, f32::NAN]).is_err());
    }
}
