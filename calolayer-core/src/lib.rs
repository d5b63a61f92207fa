//! calolayer-core: Core types for calorimeter shower data.
//!
//! This crate provides the ragged event layout (per-event hit counts over
//! flat hit columns), the detector layer map, and the dense per-layer
//! average-energy table produced by the aggregation routines.
//!

pub mod error;
pub mod layer;
pub mod ragged;
pub mod soa;
pub mod table;

pub use error::{Error, Result};
pub use layer::LayerMap;
pub use ragged::{hit_counts_from_f64, hit_counts_from_i64, EventOffsets};
pub use soa::{EventView, HitColumns, ShowerDataset};
pub use table::{LayerEnergyTable, EVENT_COLUMN};
