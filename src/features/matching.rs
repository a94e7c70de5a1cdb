//! Brute-force descriptor matching.
//!
//! Float descriptors are compared with the Euclidean distance, binary
//! descriptors with the Hamming distance. Ties resolve to the lower train
//! index so results are deterministic.

use crate::features::{BinaryDescriptor, DescriptorMatch, Descriptors};
use crate::util::{ScreenMatchError, ScreenMatchResult};

/// Returns up to `k` nearest train descriptors for every query descriptor,
/// closest first.
pub fn knn_match(
    query: &Descriptors,
    train: &Descriptors,
    k: usize,
) -> ScreenMatchResult<Vec<Vec<DescriptorMatch>>> {
    let pair = DescriptorPair::new(query, train)?;
    let mut row = Vec::with_capacity(train.len());
    let mut out = Vec::with_capacity(query.len());
    for query_idx in 0..query.len() {
        pair.distances(query_idx, &mut row);
        let mut best: Vec<DescriptorMatch> = Vec::with_capacity(k + 1);
        for (train_idx, &distance) in row.iter().enumerate() {
            let pos = best.partition_point(|m| m.distance <= distance);
            if pos < k {
                best.insert(
                    pos,
                    DescriptorMatch {
                        query_idx,
                        train_idx,
                        distance,
                    },
                );
                best.truncate(k);
            }
        }
        out.push(best);
    }
    Ok(out)
}

/// Keeps query/train pairs that are each other's nearest neighbour.
pub fn cross_check_match(
    query: &Descriptors,
    train: &Descriptors,
) -> ScreenMatchResult<Vec<DescriptorMatch>> {
    let pair = DescriptorPair::new(query, train)?;
    if query.is_empty() || train.is_empty() {
        return Ok(Vec::new());
    }

    let mut row = Vec::with_capacity(train.len());
    let mut best_for_query = Vec::with_capacity(query.len());
    let mut best_for_train = vec![(f32::INFINITY, usize::MAX); train.len()];
    for q in 0..query.len() {
        pair.distances(q, &mut row);
        let mut best = (f32::INFINITY, 0usize);
        for (t, &d) in row.iter().enumerate() {
            if d < best.0 {
                best = (d, t);
            }
            if d < best_for_train[t].0 {
                best_for_train[t] = (d, q);
            }
        }
        best_for_query.push(best);
    }

    Ok(best_for_query
        .into_iter()
        .enumerate()
        .filter(|&(q, (_, t))| best_for_train[t].1 == q)
        .map(|(query_idx, (distance, train_idx))| DescriptorMatch {
            query_idx,
            train_idx,
            distance,
        })
        .collect())
}

/// Number of differing bits between two binary descriptors.
pub fn hamming(a: &BinaryDescriptor, b: &BinaryDescriptor) -> u32 {
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
}

fn l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Query and train sets of the same descriptor kind.
enum DescriptorPair<'a> {
    Binary(&'a [BinaryDescriptor], &'a [BinaryDescriptor]),
    Float {
        dim: usize,
        query: &'a [f32],
        train: &'a [f32],
    },
}

impl<'a> DescriptorPair<'a> {
    fn new(query: &'a Descriptors, train: &'a Descriptors) -> ScreenMatchResult<Self> {
        match (query, train) {
            (Descriptors::Binary(q), Descriptors::Binary(t)) => Ok(Self::Binary(q, t)),
            (
                Descriptors::Float { dim: qd, data: q },
                Descriptors::Float { dim: td, data: t },
            ) => {
                if qd != td || *qd == 0 {
                    return Err(ScreenMatchError::InvalidInput(
                        "float descriptors must share a non-zero dimension",
                    ));
                }
                Ok(Self::Float {
                    dim: *qd,
                    query: q,
                    train: t,
                })
            }
            _ => Err(ScreenMatchError::InvalidInput(
                "cannot match binary descriptors against float descriptors",
            )),
        }
    }

    /// Fills `out` with the distances from query `q` to every train descriptor.
    fn distances(&self, q: usize, out: &mut Vec<f32>) {
        out.clear();
        match self {
            Self::Binary(query, train) => {
                let a = &query[q];
                out.extend(train.iter().map(|b| hamming(a, b) as f32));
            }
            Self::Float { dim, query, train } => {
                let a = &query[q * dim..(q + 1) * dim];
                out.extend(train.chunks_exact(*dim).map(|b| l2(a, b)));
            }
        }
    }
}
