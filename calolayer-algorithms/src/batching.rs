//! Contiguous event windows over ragged hit data.

use calolayer_core::{Error, EventOffsets, Result};
use std::ops::Range;

/// A contiguous block of events and the flat hit range they own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventWindow {
    /// Absolute event (row) range.
    pub events: Range<usize>,
    /// Absolute range into the flat hit columns.
    pub hits: Range<usize>,
}

impl EventWindow {
    /// Number of events in the window.
    #[must_use]
    pub fn n_events(&self) -> usize {
        self.events.len()
    }

    /// Number of hits in the window.
    #[must_use]
    pub fn n_hits(&self) -> usize {
        self.hits.len()
    }
}

/// Splits events into windows of at most `batch_size` events.
///
/// The hit range of each window starts at a running cursor that advances by
/// the window's own hit count, so consecutive windows tile the flat hit
/// columns without gaps or overlap.
pub struct EventBatcher<'a> {
    nhits: &'a [usize],
    batch_size: usize,
    next_event: usize,
    hit_cursor: usize,
}

impl<'a> EventBatcher<'a> {
    /// Creates a batcher over per-event hit counts.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] if `batch_size` is 0 or the total hit
    /// count overflows `usize`.
    pub fn new(nhits: &'a [usize], batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::invalid("batch_size must be at least 1"));
        }
        // Every window's hit range stays in bounds once the total fits.
        EventOffsets::from_counts(nhits)?;
        Ok(Self {
            nhits,
            batch_size,
            next_event: 0,
            hit_cursor: 0,
        })
    }

    /// Hits consumed by the windows yielded so far.
    #[must_use]
    pub fn hit_cursor(&self) -> usize {
        self.hit_cursor
    }
}

impl Iterator for EventBatcher<'_> {
    type Item = EventWindow;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_event >= self.nhits.len() {
            return None;
        }
        let start = self.next_event;
        let end = start.saturating_add(self.batch_size).min(self.nhits.len());
        let window_hits: usize = self.nhits[start..end].iter().sum();

        let hits = self.hit_cursor..self.hit_cursor + window_hits;
        self.hit_cursor = hits.end;
        self.next_event = end;

        Some(EventWindow {
            events: start..end,
            hits,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.nhits.len() - self.next_event).div_ceil(self.batch_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for EventBatcher<'_> {}
