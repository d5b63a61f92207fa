//! Structure of Arrays (`SoA`) types for shower hits.
//!
//! Hits are stored in parallel columns rather than an array of structs, which
//! matches the on-disk layout and keeps the aggregation loops streaming over
//! contiguous memory.

use crate::ragged::EventOffsets;
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Flat hit columns, concatenated event by event.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HitColumns {
    /// Transverse x coordinate (cm).
    pub x: Vec<f64>,
    /// Transverse y coordinate (cm).
    pub y: Vec<f64>,
    /// Longitudinal coordinate (cm); identifies the detector layer.
    pub z: Vec<f64>,
    /// Deposited energy (MIP).
    pub energy: Vec<f64>,
}

impl HitColumns {
    /// Creates empty columns with the given capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            z: Vec::with_capacity(capacity),
            energy: Vec::with_capacity(capacity),
        }
    }

    /// Number of hits, taken from the z column.
    #[must_use]
    pub fn len(&self) -> usize {
        self.z.len()
    }

    /// Returns true if there are no hits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    /// Pushes a single hit.
    pub fn push(&mut self, x: f64, y: f64, z: f64, energy: f64) {
        self.x.push(x);
        self.y.push(y);
        self.z.push(z);
        self.energy.push(energy);
    }

    fn check_aligned(&self) -> Result<()> {
        let n = self.z.len();
        for (name, len) in [
            ("rechit_x", self.x.len()),
            ("rechit_y", self.y.len()),
            ("rechit_energy", self.energy.len()),
        ] {
            if len != n {
                return Err(Error::invalid(format!(
                    "{name} has {len} entries but rechit_z has {n}"
                )));
            }
        }
        Ok(())
    }
}

/// A full shower dataset: per-event hit counts, hit columns and optional
/// true energies.
#[derive(Debug, Clone, PartialEq)]
pub struct ShowerDataset {
    nhits: Vec<usize>,
    offsets: EventOffsets,
    hits: HitColumns,
    target: Option<Vec<f64>>,
}

impl ShowerDataset {
    /// Validates and assembles a dataset.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] if the hit columns are not aligned, do
    /// not sum to the hit counts, or `target` does not have one entry per event.
    pub fn new(nhits: Vec<usize>, hits: HitColumns, target: Option<Vec<f64>>) -> Result<Self> {
        let offsets = EventOffsets::from_counts(&nhits)?;
        hits.check_aligned()?;
        offsets.check_column("rechit_z", hits.len())?;
        if let Some(target) = &target {
            if target.len() != nhits.len() {
                return Err(Error::invalid(format!(
                    "target has {} entries for {} events",
                    target.len(),
                    nhits.len()
                )));
            }
        }
        Ok(Self {
            nhits,
            offsets,
            hits,
            target,
        })
    }

    /// Per-event hit counts.
    #[must_use]
    pub fn nhits(&self) -> &[usize] {
        &self.nhits
    }

    /// Event boundaries.
    #[must_use]
    pub fn offsets(&self) -> &EventOffsets {
        &self.offsets
    }

    /// Hit columns.
    #[must_use]
    pub fn hits(&self) -> &HitColumns {
        &self.hits
    }

    /// True energy per event (GeV), if present in the source file.
    #[must_use]
    pub fn target(&self) -> Option<&[f64]> {
        self.target.as_deref()
    }

    /// Number of events.
    #[must_use]
    pub fn n_events(&self) -> usize {
        self.nhits.len()
    }

    /// Total number of hits.
    #[must_use]
    pub fn total_hits(&self) -> usize {
        self.hits.len()
    }

    /// Borrows the hits of a single event.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] if `index` is out of range.
    pub fn event(&self, index: usize) -> Result<EventView<'_>> {
        let range = self.offsets.range(index)?;
        Ok(EventView {
            index,
            x: &self.hits.x[range.clone()],
            y: &self.hits.y[range.clone()],
            z: &self.hits.z[range.clone()],
            energy: &self.hits.energy[range],
            true_energy: self.target.as_ref().map(|t| t[index]),
        })
    }
}

/// Borrowed view of one event's hits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventView<'a> {
    /// Event number.
    pub index: usize,
    /// x coordinates.
    pub x: &'a [f64],
    /// y coordinates.
    pub y: &'a [f64],
    /// z coordinates.
    pub z: &'a [f64],
    /// Deposited energies.
    pub energy: &'a [f64],
    /// True shower energy, if known.
    pub true_energy: Option<f64>,
}

impl EventView<'_> {
    /// Number of hits in the event.
    #[must_use]
    pub fn len(&self) -> usize {
        self.z.len()
    }

    /// Returns true if the event has no hits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    /// Sum of deposited energies.
    #[must_use]
    pub fn total_energy(&self) -> f64 {
        self.energy.iter().sum()
    }
}
