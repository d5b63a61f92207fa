//! calolayer-io: File I/O for calolayer.
//!
//! This crate provides the HDF5 shower loader (feature `hdf5`), the JSON
//! directory config, CSV export of aggregation tables and histograms, and
//! memory-budget sizing for batched aggregation.
//!

pub mod config;
mod error;
#[cfg(feature = "hdf5")]
pub mod hdf5;
pub mod out_of_core;
mod writer;

pub use config::{PathsConfig, DEFAULT_CONFIG_FILE, DEFAULT_DATA_FILE};
pub use error::{Error, Result};
#[cfg(feature = "hdf5")]
pub use hdf5::{dataset_names, read_shower_hdf5, write_shower_hdf5};
pub use out_of_core::OutOfCoreConfig;
pub use writer::CsvWriter;
