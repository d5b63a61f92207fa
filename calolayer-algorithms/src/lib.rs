//! calolayer-algorithms: Aggregation and binning over ragged shower data.
//!
//! This crate provides:
//! - **Whole-dataset** aggregation - one accumulation pass over every hit
//! - **Batched** aggregation - bounded working set, one event window at a time
//! - **Parallel** aggregation - event windows spread over a rayon pool
//! - **Histograms** - equal-width 1D binning for distribution plots
//!
#![warn(missing_docs)]

mod aggregate;
pub mod batching;
mod histogram;

pub use aggregate::{
    aggregate_batched, aggregate_parallel, aggregate_whole, AggregationStrategy,
    LayerEnergyAggregator,
};
pub use batching::{EventBatcher, EventWindow};
pub use histogram::{Histogram1D, HITS_PER_EVENT_BINS, TRUE_ENERGY_BINS};

// Re-export core table types
pub use calolayer_core::{LayerEnergyTable, LayerMap};
