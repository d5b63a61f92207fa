//! Equal-width 1D histograms.
//!
//! Binning matches `numpy.histogram` with an integer bin count: the range is
//! the finite min/max of the data, every bin is half-open except the last,
//! which also includes the upper edge.

use calolayer_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default bin count for the hits-per-event distribution.
pub const HITS_PER_EVENT_BINS: usize = 50;
/// Default bin count for the true-energy distribution.
pub const TRUE_ENERGY_BINS: usize = 30;

/// Binned counts with `bins + 1` edges.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Histogram1D {
    edges: Vec<f64>,
    counts: Vec<u64>,
}

impl Histogram1D {
    /// Bins `values` into `bins` equal-width bins over their finite range.
    ///
    /// Non-finite values are skipped. A degenerate range `[v, v]` is widened to
    /// `[v - 0.5, v + 0.5]`, and empty input is binned over `[0, 1]`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] if `bins` is 0.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn from_values(values: &[f64], bins: usize) -> Result<Self> {
        if bins == 0 {
            return Err(Error::invalid("histogram needs at least one bin"));
        }

        let (mut lo, mut hi) = values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .unwrap_or((0.0, 1.0));
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = hi - lo;
        let mut edges: Vec<f64> = (0..=bins)
            .map(|i| lo + width * (i as f64) / (bins as f64))
            .collect();
        edges[bins] = hi;

        let norm = bins as f64 / width;
        let mut counts = vec![0u64; bins];
        for &value in values.iter().filter(|v| v.is_finite()) {
            let mut index = (((value - lo) * norm) as usize).min(bins - 1);
            if index > 0 && value < edges[index] {
                index -= 1;
            } else if index + 1 < bins && value >= edges[index + 1] {
                index += 1;
            }
            counts[index] += 1;
        }

        Ok(Self { edges, counts })
    }

    /// Bins integer counts, such as hits per event.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] if `bins` is 0.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_counts(values: &[usize], bins: usize) -> Result<Self> {
        let values: Vec<f64> = values.iter().map(|&v| v as f64).collect();
        Self::from_values(&values, bins)
    }

    /// Number of bins.
    #[must_use]
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    /// Bin edges (`bins + 1` entries).
    #[must_use]
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Count per bin.
    #[must_use]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Total number of binned values.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Iterates `(low_edge, high_edge, count)` per bin.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64, u64)> + '_ {
        self.edges
            .windows(2)
            .zip(&self.counts)
            .map(|(edge, &count)| (edge[0], edge[1], count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn matches_numpy_integer_bins() {
        // numpy.histogram([1, 2, 2, 3, 4], bins=3)
        let hist = Histogram1D::from_values(&[1.0, 2.0, 2.0, 3.0, 4.0], 3).unwrap();
        assert_eq!(hist.edges(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(hist.counts(), &[1, 2, 2]);
    }

    #[test]
    fn upper_edge_is_closed() {
        let hist = Histogram1D::from_values(&[0.0, 10.0], 5).unwrap();
        assert_eq!(hist.counts(), &[1, 0, 0, 0, 1]);
        assert_eq!(hist.total(), 2);
    }

    #[test]
    fn degenerate_range_is_widened() {
        // numpy.histogram([5, 5, 5], bins=2)
        let hist = Histogram1D::from_values(&[5.0, 5.0, 5.0], 2).unwrap();
        assert_relative_eq!(hist.edges()[0], 4.5);
        assert_relative_eq!(hist.edges()[2], 5.5);
        assert_eq!(hist.counts(), &[0, 3]);
    }

    #[test]
    fn empty_input_uses_unit_range() {
        let hist = Histogram1D::from_values(&[], 4).unwrap();
        assert_eq!(hist.edges(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(hist.total(), 0);
    }

    #[test]
    fn non_finite_values_skipped() {
        let hist = Histogram1D::from_values(&[1.0, f64::NAN, 2.0, f64::INFINITY], 1).unwrap();
        assert_eq!(hist.counts(), &[2]);
    }

    #[test]
    fn hits_per_event_counts() {
        let hist = Histogram1D::from_counts(&[10, 20, 20, 30], 2).unwrap();
        assert_eq!(hist.counts(), &[1, 3]);
        let bins: Vec<_> = hist.iter().collect();
        assert_eq!(bins[0], (10.0, 20.0, 1));
        assert_eq!(bins[1], (20.0, 30.0, 3));
    }

    #[test]
    fn zero_bins_rejected() {
        assert!(Histogram1D::from_values(&[1.0], 0).is_err());
    }
}
