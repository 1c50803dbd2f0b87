//! Quartile binning over a metric column
//!
//! Edges are the 0, 25, 50, 75 and 100 percent quantiles of the values,
//! linearly interpolated between neighbouring sorted values. Bucket `k`
//! (1..=4) holds the values in `(edge[k-1], edge[k]]`; the first bucket also
//! holds `edge[0]`. Equal values always land in the same bucket, so a metric
//! dominated by one value can collapse two edges into one. That is reported
//! as an error instead of silently merging buckets.

use thiserror::Error;

/// Number of buckets produced by [`quartile_bins`]
pub const QUARTILES: usize = 4;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuartileError {
    #[error("need at least 4 values to form quartiles, got {0}")]
    TooFewValues(usize),

    #[error("quartile edges are not unique (edge {edge} repeats); the distribution is too concentrated")]
    DuplicateEdges { edge: f64 },
}

/// Assign each value its quartile ordinal, 1 (lowest) through 4 (highest).
///
/// Output order matches input order.
pub fn quartile_bins(values: &[f64]) -> Result<Vec<u8>, QuartileError> {
    if values.len() < QUARTILES {
        return Err(QuartileError::TooFewValues(values.len()));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let edges = quartile_edges(&sorted);
    if let Some(pair) = edges.windows(2).find(|w| w[0] >= w[1]) {
        return Err(QuartileError::DuplicateEdges { edge: pair[1] });
    }

    Ok(values.iter().map(|&v| bucket_of(v, &edges)).collect())
}

/// 1-based ranks where ties are broken by position, so every value gets a
/// distinct rank.
pub fn rank_first(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    // sort_by is stable: equal values keep their input order
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    for (rank, idx) in order.into_iter().enumerate() {
        ranks[idx] = (rank + 1) as f64;
    }
    ranks
}

fn quartile_edges(sorted: &[f64]) -> [f64; QUARTILES + 1] {
    let mut edges = [0.0; QUARTILES + 1];
    for (k, edge) in edges.iter_mut().enumerate() {
        *edge = interpolate(sorted, k as f64 / QUARTILES as f64);
    }
    edges
}

fn interpolate(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let frac = pos - lo as f64;
    if frac == 0.0 || lo + 1 >= sorted.len() {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[lo + 1] - sorted[lo]) * frac
    }
}

fn bucket_of(value: f64, edges: &[f64; QUARTILES + 1]) -> u8 {
    edges[1..]
        .iter()
        .position(|&edge| value <= edge)
        .map_or(QUARTILES as u8, |i| i as u8 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket_sizes(bins: &[u8]) -> [usize; QUARTILES] {
        let mut sizes = [0; QUARTILES];
        for &b in bins {
            sizes[b as usize - 1] += 1;
        }
        sizes
    }

    #[test]
    fn test_four_values_one_per_bucket() {
        let bins = quartile_bins(&[40.0, 10.0, 30.0, 20.0]).unwrap();
        assert_eq!(bins, vec![4, 1, 3, 2]);
    }

    #[test]
    fn test_distinct_values_are_balanced() {
        for n in 4..=41 {
            let values: Vec<f64> = (0..n)
                .map(|i| if i % 2 == 0 { i } else { 2 * n - i })
                .map(|v| v as f64 * 1.5)
                .collect();
            let sizes = bucket_sizes(&quartile_bins(&values).unwrap());
            let (lo, hi) = (n / QUARTILES, n.div_ceil(QUARTILES));
            for size in sizes {
                assert!(
                    (lo..=hi).contains(&size),
                    "n={n}: bucket sizes {sizes:?} are not balanced"
                );
            }
        }
    }

    #[test]
    fn test_too_few_values() {
        assert_eq!(
            quartile_bins(&[1.0, 2.0, 3.0]),
            Err(QuartileError::TooFewValues(3))
        );
        assert_eq!(quartile_bins(&[]), Err(QuartileError::TooFewValues(0)));
    }

    #[test]
    fn test_concentrated_values_fail() {
        // Edges 1, 1, 1, 1, 2: the lower edges collapse
        let result = quartile_bins(&[1.0, 1.0, 1.0, 1.0, 2.0]);
        assert!(matches!(result, Err(QuartileError::DuplicateEdges { .. })));
    }

    #[test]
    fn test_ties_share_a_bucket() {
        let values = [5.0, 1.0, 5.0, 2.0, 9.0, 3.0, 5.0, 8.0];
        let bins = quartile_bins(&values).unwrap();
        assert_eq!(bins[0], bins[2]);
        assert_eq!(bins[0], bins[6]);
    }

    #[test]
    fn test_rank_first_breaks_ties_by_position() {
        let ranks = rank_first(&[1.0, 1.0, 3.0, 1.0, 2.0]);
        assert_eq!(ranks, vec![1.0, 2.0, 5.0, 3.0, 4.0]);
    }

    #[test]
    fn test_ranked_constant_column_is_balanced() {
        let values = vec![1.0; 10];
        let bins = quartile_bins(&rank_first(&values)).unwrap();
        assert_eq!(bucket_sizes(&bins), [3, 2, 2, 3]);
        // Earlier positions get lower buckets
        assert_eq!(bins, vec![1, 1, 1, 2, 2, 3, 3, 4, 4, 4]);
    }
}
