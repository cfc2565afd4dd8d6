//! Exact nearest-neighbor search over an in-memory set of vectors.
//!
//! The index is a flat, row-major matrix compared by brute force using
//! squared Euclidean distance. It is built once from the full document set
//! and never mutated afterwards, so a shared reference can serve any number
//! of concurrent searches.

#[cfg(test)]
mod tests;

use std::cmp::Ordering;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("cannot build an index from zero vectors")]
    Empty,

    #[error("vectors must have at least one dimension")]
    ZeroDimension,

    #[error("vector {position} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        position: usize,
        expected: usize,
        found: usize,
    },

    #[error("query has dimension {found}, index expects {expected}")]
    QueryDimension { expected: usize, found: usize },
}

/// One search hit: the position of a stored vector and its squared L2 distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f32,
}

#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Build an index from document vectors. Position in `vectors` becomes the
    /// document index reported by [`FlatIndex::search`].
    #[inline]
    pub fn build(vectors: &[Vec<f32>]) -> Result<Self, IndexError> {
        let first = vectors.first().ok_or(IndexError::Empty)?;
        let dimension = first.len();
        if dimension == 0 {
            return Err(IndexError::ZeroDimension);
        }

        let mut data = Vec::with_capacity(dimension * vectors.len());
        for (position, vector) in vectors.iter().enumerate() {
            if vector.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    position,
                    expected: dimension,
                    found: vector.len(),
                });
            }
            data.extend_from_slice(vector);
        }

        debug!(
            "Built flat index of {} vectors with {} dimensions",
            vectors.len(),
            dimension
        );

        Ok(Self { dimension, data })
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Vector stored at `index`, if any
    #[inline]
    pub fn vector(&self, index: usize) -> Option<&[f32]> {
        self.data.chunks_exact(self.dimension).nth(index)
    }

    /// Return up to `k` nearest vectors, nearest first.
    ///
    /// Ties are broken by the lower index. Asking for more neighbors than
    /// stored vectors returns every vector.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::QueryDimension {
                expected: self.dimension,
                found: query.len(),
            });
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(index, vector)| Neighbor {
                index,
                distance: squared_l2(query, vector),
            })
            .collect();

        let k = k.min(neighbors.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        if k < neighbors.len() {
            neighbors.select_nth_unstable_by(k - 1, compare_neighbors);
            neighbors.truncate(k);
        }
        neighbors.sort_unstable_by(compare_neighbors);

        Ok(neighbors)
    }
}

fn compare_neighbors(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.index.cmp(&b.index))
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}
