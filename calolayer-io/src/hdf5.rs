//! HDF5 shower dataset I/O.
//!
//! Datasets live at the file root as flat 1D arrays: `nhits` (one entry per
//! event), the hit columns `rechit_x`, `rechit_y`, `rechit_z` and
//! `rechit_energy` (one entry per hit), and an optional per-event `target`
//! holding the true shower energy. Numeric types are converted to `f64` on
//! read.

use crate::{Error, Result};
use calolayer_core::{hit_counts_from_f64, HitColumns, ShowerDataset};
use hdf5::types::H5Type;
use hdf5::{File, Group};
use ndarray::ArrayView1;
use std::path::Path;

/// Per-event hit counts.
pub const NHITS: &str = "nhits";
/// Hit x coordinates.
pub const RECHIT_X: &str = "rechit_x";
/// Hit y coordinates.
pub const RECHIT_Y: &str = "rechit_y";
/// Hit z coordinates (layer positions).
pub const RECHIT_Z: &str = "rechit_z";
/// Hit energies.
pub const RECHIT_ENERGY: &str = "rechit_energy";
/// True energy per event.
pub const TARGET: &str = "target";

/// Reads a shower dataset from an HDF5 file.
///
/// # Errors
/// Returns an error if HDF5 I/O fails, a required dataset is missing, or the
/// columns do not match the hit counts.
pub fn read_shower_hdf5<P: AsRef<Path>>(path: P) -> Result<ShowerDataset> {
    let file = File::open(path.as_ref())?;

    let nhits = hit_counts_from_f64(&read_dataset_vec::<f64>(&file, NHITS)?)?;
    let hits = HitColumns {
        x: read_dataset_vec(&file, RECHIT_X)?,
        y: read_dataset_vec(&file, RECHIT_Y)?,
        z: read_dataset_vec(&file, RECHIT_Z)?,
        energy: read_dataset_vec(&file, RECHIT_ENERGY)?,
    };
    let target = read_dataset_vec_opt::<f64>(&file, TARGET)?;

    log::info!(
        "loaded {} events, {} hits from {}",
        nhits.len(),
        hits.len(),
        path.as_ref().display()
    );
    Ok(ShowerDataset::new(nhits, hits, target)?)
}

/// Writes a shower dataset in the layout read by [`read_shower_hdf5`].
///
/// # Errors
/// Returns an error if HDF5 I/O fails.
#[allow(clippy::cast_possible_truncation)]
pub fn write_shower_hdf5<P: AsRef<Path>>(path: P, dataset: &ShowerDataset) -> Result<()> {
    let file = File::create(path)?;
    let nhits: Vec<u64> = dataset.nhits().iter().map(|&n| n as u64).collect();
    write_dataset(&file, NHITS, &nhits)?;

    let hits = dataset.hits();
    write_dataset(&file, RECHIT_X, &hits.x)?;
    write_dataset(&file, RECHIT_Y, &hits.y)?;
    write_dataset(&file, RECHIT_Z, &hits.z)?;
    write_dataset(&file, RECHIT_ENERGY, &hits.energy)?;
    if let Some(target) = dataset.target() {
        write_dataset(&file, TARGET, target)?;
    }
    Ok(())
}

/// Lists the dataset names at the root of a file.
///
/// # Errors
/// Returns an error if HDF5 I/O fails.
pub fn dataset_names<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let file = File::open(path)?;
    Ok(file.member_names()?)
}

fn write_dataset<T: H5Type>(group: &Group, name: &str, data: &[T]) -> Result<()> {
    let dataset = group.new_dataset::<T>().shape((data.len(),)).create(name)?;
    if !data.is_empty() {
        dataset.write(ArrayView1::from(data))?;
    }
    Ok(())
}

fn read_dataset_vec<T: H5Type>(group: &Group, name: &str) -> Result<Vec<T>> {
    let dataset = group
        .dataset(name)
        .map_err(|e| Error::InvalidFormat(format!("missing dataset '{name}': {e}")))?;
    if dataset.ndim() > 1 {
        return Err(Error::InvalidFormat(format!(
            "dataset '{name}' has {} dimensions, expected 1",
            dataset.ndim()
        )));
    }
    Ok(dataset.read_raw::<T>()?)
}

fn read_dataset_vec_opt<T: H5Type>(group: &Group, name: &str) -> Result<Option<Vec<T>>> {
    if group.link_exists(name) {
        read_dataset_vec(group, name).map(Some)
    } else {
        Ok(None)
    }
}
