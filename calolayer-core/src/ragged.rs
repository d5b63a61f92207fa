//! Ragged event layout.
//!
//! Hits from all events are concatenated into flat columns, and each event
//! is described only by its hit count. Event `k` owns the half-open hit
//! range `[offsets[k], offsets[k + 1])` where `offsets` is the exclusive
//! prefix sum of the counts.

use crate::{Error, Result};
use std::ops::Range;

/// Largest integer an `f64` represents exactly.
const MAX_EXACT_F64: f64 = 9_007_199_254_740_992.0;

/// Validated prefix sums over per-event hit counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOffsets {
    /// `n_events + 1` monotone offsets, starting at 0.
    offsets: Vec<usize>,
}

impl EventOffsets {
    /// Builds offsets from per-event hit counts.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] if the total hit count overflows `usize`.
    pub fn from_counts(nhits: &[usize]) -> Result<Self> {
        let mut offsets = Vec::with_capacity(nhits.len() + 1);
        let mut cursor = 0usize;
        offsets.push(cursor);
        for (event, &count) in nhits.iter().enumerate() {
            cursor = cursor.checked_add(count).ok_or_else(|| {
                Error::invalid(format!("total hit count overflows at event {event}"))
            })?;
            offsets.push(cursor);
        }
        Ok(Self { offsets })
    }

    /// Number of events.
    #[must_use]
    pub fn n_events(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Total number of hits across all events.
    #[must_use]
    pub fn total_hits(&self) -> usize {
        self.offsets[self.offsets.len() - 1]
    }

    /// Returns true when there are no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n_events() == 0
    }

    /// Hit range of a single event.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] if `event` is out of bounds.
    pub fn range(&self, event: usize) -> Result<Range<usize>> {
        if event >= self.n_events() {
            return Err(Error::invalid(format!(
                "event index {event} out of range for {} events",
                self.n_events()
            )));
        }
        Ok(self.offsets[event]..self.offsets[event + 1])
    }

    /// Raw offsets (`n_events + 1` entries).
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.offsets
    }

    /// Checks that a flat hit column has exactly `total_hits` entries.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] on a length mismatch.
    pub fn check_column(&self, name: &str, len: usize) -> Result<()> {
        if len != self.total_hits() {
            return Err(Error::invalid(format!(
                "{name} has {len} entries but nhits sums to {}",
                self.total_hits()
            )));
        }
        Ok(())
    }
}

/// Converts signed hit counts, rejecting negative entries.
///
/// # Errors
/// Returns [`Error::InvalidInput`] for a negative count.
pub fn hit_counts_from_i64(nhits: &[i64]) -> Result<Vec<usize>> {
    nhits
        .iter()
        .enumerate()
        .map(|(event, &count)| {
            usize::try_from(count).map_err(|_| {
                Error::invalid(format!("event {event} has invalid hit count {count}"))
            })
        })
        .collect()
}

/// Converts floating-point hit counts as stored by some simulation files.
///
/// # Errors
/// Returns [`Error::InvalidInput`] for negative, fractional or non-finite counts.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn hit_counts_from_f64(nhits: &[f64]) -> Result<Vec<usize>> {
    nhits
        .iter()
        .enumerate()
        .map(|(event, &count)| {
            if !count.is_finite() || count < 0.0 || count.fract() != 0.0 || count > MAX_EXACT_F64
            {
                return Err(Error::invalid(format!(
                    "event {event} has invalid hit count {count}"
                )));
            }
            usize::try_from(count as u64)
                .map_err(|_| Error::invalid(format!("event {event} hit count {count} too large")))
        })
        .collect()
}
