//! Detector layer map.
//!
//! Layers are the distinct z coordinates observed in a dataset, sorted
//! ascending and numbered densely from zero. Equality is exact: two z values
//! share a layer only if their bit patterns are identical. Sorting uses the
//! IEEE total order, so `-0.0` and `0.0` are two adjacent layers.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sorted distinct layer positions with a value-to-index lookup.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LayerMap {
    positions: Vec<f64>,
}

impl LayerMap {
    /// Derives the layer set from every z value in the dataset.
    #[must_use]
    pub fn from_positions(z: &[f64]) -> Self {
        let mut positions = z.to_vec();
        positions.sort_unstable_by(f64::total_cmp);
        positions.dedup_by(|a, b| a.to_bits() == b.to_bits());
        positions.shrink_to_fit();
        Self { positions }
    }

    /// Number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if no layers were observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Sorted layer positions.
    #[must_use]
    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    /// Dense index of a z value, or `None` if it is not a known layer.
    #[inline]
    #[must_use]
    pub fn index_of(&self, z: f64) -> Option<usize> {
        self.positions
            .binary_search_by(|probe| probe.total_cmp(&z))
            .ok()
    }

    /// Column name for a layer index, `z_<L+1>_average_energy`.
    #[must_use]
    pub fn column_name(index: usize) -> String {
        format!("z_{}_average_energy", index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_distinct() {
        let map = LayerMap::from_positions(&[20.0, 10.0, 20.0, 15.5, 10.0]);
        assert_eq!(map.positions(), &[10.0, 15.5, 20.0]);
        assert_eq!(map.index_of(10.0), Some(0));
        assert_eq!(map.index_of(15.5), Some(1));
        assert_eq!(map.index_of(20.0), Some(2));
        assert_eq!(map.index_of(12.0), None);
    }

    #[test]
    fn test_no_epsilon_merging() {
        let z = 1.0_f64;
        let next = f64::from_bits(z.to_bits() + 1);
        let map = LayerMap::from_positions(&[next, z, z]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.index_of(z), Some(0));
        assert_eq!(map.index_of(next), Some(1));
    }

    #[test]
    fn test_signed_zero_layers() {
        let map = LayerMap::from_positions(&[0.0, -0.0]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.index_of(-0.0), Some(0));
        assert_eq!(map.index_of(0.0), Some(1));
    }

    #[test]
    fn test_nan_and_infinite_layers() {
        let neg_nan = -f64::NAN;
        let map = LayerMap::from_positions(&[
            f64::NAN,
            0.0,
            -0.0,
            neg_nan,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NAN,
        ]);
        assert_eq!(map.len(), 6);
        let bits: Vec<u64> = map.positions().iter().map(|z| z.to_bits()).collect();
        assert_eq!(
            bits,
            vec![
                neg_nan.to_bits(),
                f64::NEG_INFINITY.to_bits(),
                (-0.0_f64).to_bits(),
                0.0_f64.to_bits(),
                f64::INFINITY.to_bits(),
                f64::NAN.to_bits(),
            ]
        );
        assert_eq!(map.index_of(neg_nan), Some(0));
        assert_eq!(map.index_of(f64::NAN), Some(5));
        assert_eq!(map.index_of(f64::INFINITY), Some(4));
    }

    #[test]
    fn test_empty() {
        let map = LayerMap::from_positions(&[]);
        assert!(map.is_empty());
        assert_eq!(map.index_of(1.0), None);
    }

    #[test]
    fn test_column_name() {
        assert_eq!(LayerMap::column_name(0), "z_1_average_energy");
        assert_eq!(LayerMap::column_name(27), "z_28_average_energy");
    }
}
