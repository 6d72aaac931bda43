//! Flat vector index with exact nearest-neighbor search
//!
//! Brute-force squared-L2 scan over all stored vectors. At knowledge-base
//! scale this is exact, allocation-light and faster than any graph index.

use serde::{Deserialize, Serialize};

/// A single nearest-neighbor hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Position of the stored vector, in insertion order
    pub index: usize,
    /// Squared Euclidean distance to the query (lower is closer)
    pub distance: f32,
}

/// Exhaustive vector index over squared Euclidean distance
#[derive(Debug, Default)]
pub struct FlatIndex {
    /// Fixed by the first batch of vectors added
    dimension: Option<usize>,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored vectors
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Check if the index holds no vectors
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Dimension of stored vectors, if any have been added
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Add vectors to the index
    ///
    /// The first batch fixes the index dimension; later batches must match it.
    pub fn add(&mut self, vectors: Vec<Vec<f32>>) -> anyhow::Result<()> {
        for vector in vectors {
            match self.dimension {
                None => self.dimension = Some(vector.len()),
                Some(dim) if dim != vector.len() => {
                    anyhow::bail!(
                        "Vector dimension mismatch: index holds {}-dim vectors, got {}",
                        dim,
                        vector.len()
                    );
                }
                Some(_) => {}
            }
            self.vectors.push(vector);
        }
        Ok(())
    }

    /// Find the `k` nearest stored vectors to `query`, closest first
    ///
    /// Returns fewer than `k` hits when the index is smaller than `k`, and
    /// no hits at all for an empty index or a dimension-mismatched query.
    /// Ties on distance break toward the earlier-inserted vector.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        if self.vectors.is_empty() || k == 0 {
            return Vec::new();
        }

        if self.dimension != Some(query.len()) {
            tracing::warn!(
                "Query dimension {} does not match index dimension {:?}",
                query.len(),
                self.dimension
            );
            return Vec::new();
        }

        let mut hits: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(index, stored)| Neighbor {
                index,
                distance: squared_l2(query, stored),
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.index.cmp(&b.index)));
        hits.truncate(k);
        hits
    }
}

/// Squared Euclidean distance between two equal-length vectors
fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> FlatIndex {
        let mut index = FlatIndex::new();
        index
            .add(vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
            ])
            .unwrap();
        index
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = sample_index();

        let hits = index.search(&[0.0, 0.9, 0.1], 3);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].index, 1);
        assert!(hits[0].distance < hits[1].distance);
        assert!(hits[1].distance <= hits[2].distance);
    }

    #[test]
    fn test_search_exact_distances() {
        let mut index = FlatIndex::new();
        index.add(vec![vec![0.0, 0.0], vec![3.0, 4.0]]).unwrap();

        let hits = index.search(&[0.0, 0.0], 2);
        assert_eq!(hits[0].distance, 0.0);
        // Squared L2, not the Euclidean 5.0
        assert_eq!(hits[1].distance, 25.0);
    }

    #[test]
    fn test_search_truncates_to_k() {
        let index = sample_index();

        assert_eq!(index.search(&[1.0, 0.0, 0.0], 2).len(), 2);
        assert_eq!(index.search(&[1.0, 0.0, 0.0], 10).len(), 3);
        assert!(index.search(&[1.0, 0.0, 0.0], 0).is_empty());
    }

    #[test]
    fn test_search_empty_index() {
        let index = FlatIndex::new();
        assert!(index.search(&[1.0, 2.0], 5).is_empty());
    }

    #[test]
    fn test_search_dimension_mismatch() {
        let index = sample_index();
        assert!(index.search(&[1.0, 0.0], 2).is_empty());
    }

    #[test]
    fn test_add_dimension_mismatch() {
        let mut index = FlatIndex::new();
        index.add(vec![vec![1.0, 2.0]]).unwrap();

        let result = index.add(vec![vec![1.0, 2.0, 3.0]]);
        assert!(result.is_err());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_tie_breaks_by_insertion_order() {
        let mut index = FlatIndex::new();
        index
            .add(vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]])
            .unwrap();

        let hits = index.search(&[1.0, 0.0], 3);
        assert_eq!(hits[0].index, 0);
        assert_eq!(hits[1].index, 1);
        assert_eq!(hits[2].index, 2);
    }
}
