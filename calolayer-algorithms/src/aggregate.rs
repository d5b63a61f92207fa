//! Ragged-to-dense per-layer energy aggregation.
//!
//! Every hit is assigned the linear address `event * n_layers + layer`, and
//! energies and hit counts are accumulated into flat buffers indexed by that
//! address. Dividing the sums by the floored counts gives the average-energy
//! table. The batched and parallel strategies run the same accumulation over
//! contiguous event windows against one global layer map. Each event's hits
//! are summed in file order, so all strategies produce bit-identical tables.

use crate::batching::{EventBatcher, EventWindow};
use calolayer_core::{
    EventOffsets, Error, LayerEnergyTable, LayerMap, Result, ShowerDataset,
};
use ndarray::parallel::prelude::*;
use ndarray::{s, ArrayViewMut2, Axis};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Execution strategy for [`LayerEnergyAggregator`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AggregationStrategy {
    /// Single accumulation pass over the whole dataset.
    #[default]
    Whole,
    /// Sequential event windows of at most `batch_size` events.
    Batched {
        /// Events per window.
        batch_size: usize,
    },
    /// Event windows processed on a dedicated thread pool.
    Parallel {
        /// Events per window.
        batch_size: usize,
        /// Worker threads.
        threads: usize,
    },
}

/// Builds the per-event, per-layer average-energy table.
#[derive(Clone, Debug, Default)]
pub struct LayerEnergyAggregator {
    strategy: AggregationStrategy,
    cancel_flag: Option<Arc<AtomicBool>>,
    require_events: bool,
}

impl LayerEnergyAggregator {
    /// Creates an aggregator with the given strategy.
    #[must_use]
    pub fn new(strategy: AggregationStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Whole-dataset aggregator.
    #[must_use]
    pub fn whole() -> Self {
        Self::new(AggregationStrategy::Whole)
    }

    /// Batched aggregator.
    #[must_use]
    pub fn batched(batch_size: usize) -> Self {
        Self::new(AggregationStrategy::Batched { batch_size })
    }

    /// Parallel batched aggregator.
    #[must_use]
    pub fn parallel(batch_size: usize, threads: usize) -> Self {
        Self::new(AggregationStrategy::Parallel {
            batch_size,
            threads,
        })
    }

    /// Attach a cancel flag, polled before each event window.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = Some(flag);
        self
    }

    /// Fail with [`Error::EmptyDataset`] instead of returning an empty table.
    #[must_use]
    pub fn with_require_events(mut self, require: bool) -> Self {
        self.require_events = require;
        self
    }

    /// Configured strategy.
    #[must_use]
    pub fn strategy(&self) -> AggregationStrategy {
        self.strategy
    }

    /// Aggregates a loaded dataset.
    ///
    /// # Errors
    /// See [`Self::aggregate`].
    pub fn aggregate_dataset(&self, dataset: &ShowerDataset) -> Result<LayerEnergyTable> {
        let hits = dataset.hits();
        self.aggregate(dataset.nhits(), &hits.z, &hits.energy)
    }

    /// Aggregates flat hit columns into the average-energy table.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] if the columns do not match `nhits`
    /// or the strategy parameters are zero, [`Error::EmptyDataset`] when
    /// events are required and there are none, and [`Error::Cancelled`] if
    /// the cancel flag was raised.
    pub fn aggregate(
        &self,
        nhits: &[usize],
        z: &[f64],
        energy: &[f64],
    ) -> Result<LayerEnergyTable> {
        let offsets = EventOffsets::from_counts(nhits)?;
        offsets.check_column("rechit_z", z.len())?;
        offsets.check_column("rechit_energy", energy.len())?;
        match self.strategy {
            AggregationStrategy::Whole => {}
            AggregationStrategy::Batched { batch_size } => check_batch_size(batch_size)?,
            AggregationStrategy::Parallel {
                batch_size,
                threads,
            } => {
                check_batch_size(batch_size)?;
                if threads == 0 {
                    return Err(Error::invalid("threads must be at least 1"));
                }
            }
        }
        if self.require_events && offsets.is_empty() {
            return Err(Error::EmptyDataset);
        }

        let layers = LayerMap::from_positions(z);
        log::debug!(
            "aggregating {} events, {} hits over {} layers ({:?})",
            offsets.n_events(),
            offsets.total_hits(),
            layers.len(),
            self.strategy
        );
        let mut table = LayerEnergyTable::zeros(nhits.len(), layers)?;

        match self.strategy {
            AggregationStrategy::Whole => {
                self.check_cancelled()?;
                let (layers, values) = table.parts_mut();
                accumulate_window(nhits, z, energy, layers, values);
            }
            AggregationStrategy::Batched { batch_size } => {
                self.run_batched(nhits, z, energy, batch_size, &mut table)?;
            }
            AggregationStrategy::Parallel {
                batch_size,
                threads,
            } => {
                self.run_parallel(nhits, z, energy, batch_size, threads, &mut table)?;
            }
        }

        Ok(table)
    }

    fn run_batched(
        &self,
        nhits: &[usize],
        z: &[f64],
        energy: &[f64],
        batch_size: usize,
        table: &mut LayerEnergyTable,
    ) -> Result<()> {
        let (layers, mut values) = table.parts_mut();
        for window in EventBatcher::new(nhits, batch_size)? {
            self.check_cancelled()?;
            log::trace!(
                "window events {:?} hits {:?}",
                window.events,
                window.hits
            );
            let rows = values.slice_mut(s![window.events.clone(), ..]);
            accumulate_in(&window, nhits, z, energy, layers, rows);
        }
        Ok(())
    }

    fn run_parallel(
        &self,
        nhits: &[usize],
        z: &[f64],
        energy: &[f64],
        batch_size: usize,
        threads: usize,
        table: &mut LayerEnergyTable,
    ) -> Result<()> {
        let windows: Vec<EventWindow> = EventBatcher::new(nhits, batch_size)?.collect();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| Error::ConfigError(format!("thread pool: {e}")))?;

        let (layers, mut values) = table.parts_mut();
        pool.install(|| {
            values
                .axis_chunks_iter_mut(Axis(0), batch_size)
                .into_par_iter()
                .zip(windows.par_iter())
                .try_for_each(|(rows, window)| {
                    self.check_cancelled()?;
                    accumulate_in(window, nhits, z, energy, layers, rows);
                    Ok(())
                })
        })
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel_flag {
            Some(flag) if flag.load(Ordering::SeqCst) => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Aggregates the whole dataset in one pass.
///
/// # Errors
/// Returns [`Error::InvalidInput`] if `z` or `energy` do not have
/// `sum(nhits)` entries.
pub fn aggregate_whole(nhits: &[usize], z: &[f64], energy: &[f64]) -> Result<LayerEnergyTable> {
    LayerEnergyAggregator::whole().aggregate(nhits, z, energy)
}

/// Aggregates in windows of at most `batch_size` events.
///
/// # Errors
/// Returns [`Error::InvalidInput`] on a length mismatch or if `batch_size` is 0.
pub fn aggregate_batched(
    nhits: &[usize],
    z: &[f64],
    energy: &[f64],
    batch_size: usize,
) -> Result<LayerEnergyTable> {
    LayerEnergyAggregator::batched(batch_size).aggregate(nhits, z, energy)
}

/// Aggregates windows of at most `batch_size` events on `threads` workers.
///
/// # Errors
/// Returns [`Error::InvalidInput`] on a length mismatch or if `batch_size`
/// or `threads` is 0.
pub fn aggregate_parallel(
    nhits: &[usize],
    z: &[f64],
    energy: &[f64],
    batch_size: usize,
    threads: usize,
) -> Result<LayerEnergyTable> {
    LayerEnergyAggregator::parallel(batch_size, threads).aggregate(nhits, z, energy)
}

fn check_batch_size(batch_size: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(Error::invalid("batch_size must be at least 1"));
    }
    Ok(())
}

fn accumulate_in(
    window: &EventWindow,
    nhits: &[usize],
    z: &[f64],
    energy: &[f64],
    layers: &LayerMap,
    rows: ArrayViewMut2<'_, f64>,
) {
    accumulate_window(
        &nhits[window.events.clone()],
        &z[window.hits.clone()],
        &energy[window.hits.clone()],
        layers,
        rows,
    );
}

/// Accumulates one window into `out`, whose rows are the window's events.
///
/// Event indices are window-local here; the caller hands in the row block
/// at the window's absolute offset.
#[allow(clippy::cast_precision_loss)]
fn accumulate_window(
    nhits: &[usize],
    z: &[f64],
    energy: &[f64],
    layers: &LayerMap,
    mut out: ArrayViewMut2<'_, f64>,
) {
    let n_layers = layers.len();
    let cells = nhits.len() * n_layers;
    debug_assert_eq!(out.len(), cells);

    let mut energy_sum = vec![0.0_f64; cells];
    let mut hit_count = vec![0_usize; cells];

    let event_of_hit = nhits
        .iter()
        .enumerate()
        .flat_map(|(event, &count)| std::iter::repeat(event).take(count));

    for ((event, &hit_z), &hit_energy) in event_of_hit.zip(z).zip(energy) {
        // The layer map is built from every z value, so the lookup cannot miss.
        let Some(layer) = layers.index_of(hit_z) else {
            continue;
        };
        let address = event * n_layers + layer;
        energy_sum[address] += hit_energy;
        hit_count[address] += 1;
    }

    for (cell, (&sum, &count)) in out.iter_mut().zip(energy_sum.iter().zip(&hit_count)) {
        *cell = sum / count.max(1) as f64;
    }
}
