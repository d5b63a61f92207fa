//! Dense per-event, per-layer average-energy table.

use crate::layer::LayerMap;
use crate::{Error, Result};
use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut2};
use std::mem::size_of;

/// Name of the leading event-index column.
pub const EVENT_COLUMN: &str = "event_no";

/// Average deposited energy per (event, layer).
///
/// Rows follow event order, columns follow the ascending layer order of the
/// attached [`LayerMap`]. Cells for (event, layer) pairs without hits are 0.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerEnergyTable {
    layers: LayerMap,
    values: Array2<f64>,
}

impl LayerEnergyTable {
    /// Allocates a zero-filled table for `n_events` rows.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] if `n_events * n_layers` overflows.
    pub fn zeros(n_events: usize, layers: LayerMap) -> Result<Self> {
        let n_layers = layers.len();
        let bytes = n_events
            .checked_mul(n_layers)
            .and_then(|cells| cells.checked_mul(size_of::<f64>()))
            .filter(|&bytes| isize::try_from(bytes).is_ok());
        if bytes.is_none() {
            return Err(Error::invalid(format!(
                "{n_events} events x {n_layers} layers exceeds addressable cells"
            )));
        }
        Ok(Self {
            layers,
            values: Array2::zeros((n_events, n_layers)),
        })
    }

    /// Number of rows (events).
    #[must_use]
    pub fn n_events(&self) -> usize {
        self.values.nrows()
    }

    /// Number of layer columns, excluding the event column.
    #[must_use]
    pub fn n_layers(&self) -> usize {
        self.values.ncols()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n_events() == 0
    }

    /// Layer map defining the column order.
    #[must_use]
    pub fn layers(&self) -> &LayerMap {
        &self.layers
    }

    /// Energy matrix, `n_events x n_layers`.
    #[must_use]
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Mutable energy matrix.
    pub fn values_mut(&mut self) -> ArrayViewMut2<'_, f64> {
        self.values.view_mut()
    }

    /// Layer map and mutable energy matrix, borrowed together.
    pub fn parts_mut(&mut self) -> (&LayerMap, ArrayViewMut2<'_, f64>) {
        (&self.layers, self.values.view_mut())
    }

    /// Single cell, or `None` when out of bounds.
    #[must_use]
    pub fn get(&self, event: usize, layer: usize) -> Option<f64> {
        self.values.get((event, layer)).copied()
    }

    /// Energy-vs-layer curve of one event.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] if `event` is out of range.
    pub fn row(&self, event: usize) -> Result<ArrayView1<'_, f64>> {
        if event >= self.n_events() {
            return Err(Error::invalid(format!(
                "event index {event} out of range for {} events",
                self.n_events()
            )));
        }
        Ok(self.values.row(event))
    }

    /// Event-index column, `0..n_events`.
    pub fn event_numbers(&self) -> impl Iterator<Item = usize> {
        0..self.n_events()
    }

    /// Column headers: `event_no` followed by one name per layer.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        std::iter::once(EVENT_COLUMN.to_string())
            .chain((0..self.n_layers()).map(LayerMap::column_name))
            .collect()
    }

    /// Rows with the event number prepended as the first value.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.values
            .rows()
            .into_iter()
            .enumerate()
            .map(|(event, row)| {
                let mut out = Vec::with_capacity(row.len() + 1);
                out.push(event as f64);
                out.extend(row.iter().copied());
                out
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_shape() {
        let layers = LayerMap::from_positions(&[1.0, 2.0, 3.0]);
        let table = LayerEnergyTable::zeros(4, layers).unwrap();
        assert_eq!(table.n_events(), 4);
        assert_eq!(table.n_layers(), 3);
        assert!(table.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_column_names() {
        let layers = LayerMap::from_positions(&[5.0, 1.0]);
        let table = LayerEnergyTable::zeros(1, layers).unwrap();
        assert_eq!(
            table.column_names(),
            vec!["event_no", "z_1_average_energy", "z_2_average_energy"]
        );
    }

    #[test]
    fn test_rows_with_event_column() {
        let layers = LayerMap::from_positions(&[1.0, 2.0]);
        let mut table = LayerEnergyTable::zeros(2, layers).unwrap();
        table.values_mut()[[1, 0]] = 8.0;
        assert_eq!(table.to_rows(), vec![vec![0.0, 0.0, 0.0], vec![1.0, 8.0, 0.0]]);
        assert_eq!(table.event_numbers().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_row_access() {
        let layers = LayerMap::from_positions(&[1.0]);
        let table = LayerEnergyTable::zeros(1, layers).unwrap();
        assert_eq!(table.row(0).unwrap().len(), 1);
        assert!(matches!(table.row(1), Err(Error::InvalidInput(_))));
        assert_eq!(table.get(0, 0), Some(0.0));
        assert_eq!(table.get(0, 1), None);
    }

    #[test]
    fn test_empty_table() {
        let table = LayerEnergyTable::zeros(0, LayerMap::default()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.column_names(), vec!["event_no"]);
        assert!(table.to_rows().is_empty());
    }

    #[test]
    fn test_cell_overflow_rejected() {
        let layers = LayerMap::from_positions(&[1.0, 2.0]);
        assert!(LayerEnergyTable::zeros(usize::MAX, layers).is_err());
    }
}
