//! Flat (brute-force) nearest-neighbour index over squared Euclidean distance.

use crate::error::OrchestrationError;
use crate::Result;

/// Exact L2 index. Positions are insertion order, starting at 0.
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatL2Index {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn add(&mut self, vector: Vec<f32>) -> Result<usize> {
        self.check_dimension(&vector)?;
        self.vectors.push(vector);
        Ok(self.vectors.len() - 1)
    }

    /// Up to `k` `(position, squared distance)` pairs, nearest first.
    /// Equal distances keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        self.check_dimension(query)?;

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| (position, squared_l2(query, vector)))
            .collect();

        // sort_by is stable, so ties stay in insertion order
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        Ok(scored)
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(OrchestrationError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
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

    #[test]
    fn test_search_orders_by_distance() {
        let mut index = FlatL2Index::new(2);
        index.add(vec![3.0, 0.0]).unwrap();
        index.add(vec![1.0, 0.0]).unwrap();
        index.add(vec![2.0, 0.0]).unwrap();

        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        assert_eq!(hits, vec![(1, 1.0), (2, 4.0), (0, 9.0)]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut index = FlatL2Index::new(2);
        index.add(vec![0.0, 1.0]).unwrap();
        index.add(vec![1.0, 0.0]).unwrap();
        index.add(vec![0.0, -1.0]).unwrap();

        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        let positions: Vec<usize> = hits.iter().map(|(p, _)| *p).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_k_larger_than_index_returns_all() {
        let mut index = FlatL2Index::new(1);
        index.add(vec![0.5]).unwrap();

        let hits = index.search(&[0.0], 10).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut index = FlatL2Index::new(3);
        let err = index.add(vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            OrchestrationError::DimensionMismatch { expected: 3, actual: 2 }
        ));
        assert!(index.search(&[1.0], 1).is_err());
    }
}
