//! Memory-budget sizing for batched aggregation.
//!
//! Converts a byte budget (explicit, or a fraction of available system
//! memory) into an event-window size for the batched and parallel
//! aggregation strategies.

use crate::Result;
use calolayer_algorithms::AggregationStrategy;
use calolayer_core::Error as CoreError;
use std::mem::size_of;
use sysinfo::System;

const MEMORY_OVERHEAD_FACTOR: f64 = 1.2;

/// Configuration for out-of-core aggregation.
#[derive(Clone, Debug)]
pub struct OutOfCoreConfig {
    /// Fraction of available system memory to target (0.0 < fraction <= 1.0).
    pub memory_fraction: f64,
    /// Explicit memory budget override (bytes). If set, `memory_fraction` is ignored.
    pub memory_budget_bytes: Option<usize>,
    /// Optional number of worker threads for parallel window processing.
    pub parallelism: Option<usize>,
}

impl Default for OutOfCoreConfig {
    fn default() -> Self {
        Self {
            memory_fraction: 0.5,
            memory_budget_bytes: None,
            parallelism: None,
        }
    }
}

impl OutOfCoreConfig {
    /// Set the fraction of available system memory to target.
    #[must_use]
    pub fn with_memory_fraction(mut self, fraction: f64) -> Self {
        self.memory_fraction = fraction;
        self
    }

    /// Set an explicit memory budget in bytes.
    #[must_use]
    pub fn with_memory_budget_bytes(mut self, bytes: usize) -> Self {
        self.memory_budget_bytes = Some(bytes);
        self
    }

    /// Set the number of worker threads.
    ///
    /// Values less than 1 are clamped to 1. Use [`Self::try_with_parallelism`]
    /// to surface invalid values as an error instead.
    #[must_use]
    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads.max(1));
        self
    }

    /// Fallible variant of [`Self::with_parallelism`].
    ///
    /// # Errors
    /// Returns an error if `threads` is 0.
    pub fn try_with_parallelism(mut self, threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(
                CoreError::ConfigError("parallelism must be at least 1".to_string()).into(),
            );
        }
        self.parallelism = Some(threads);
        Ok(self)
    }

    /// Return the configured worker thread count, clamped to at least 1.
    #[must_use]
    pub fn effective_parallelism(&self) -> usize {
        self.parallelism.unwrap_or(1).max(1)
    }

    /// Resolve the target memory budget in bytes.
    ///
    /// # Errors
    /// Returns an error if the memory fraction is invalid or system memory cannot be queried.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn resolve_budget_bytes(&self) -> Result<usize> {
        if let Some(bytes) = self.memory_budget_bytes {
            return Ok(bytes);
        }
        if !(0.0 < self.memory_fraction && self.memory_fraction <= 1.0) {
            return Err(
                CoreError::ConfigError("memory_fraction must be in (0.0, 1.0]".to_string()).into(),
            );
        }
        let mut system = System::new();
        system.refresh_memory();
        let available = system.available_memory();
        if available == 0 {
            return Err(
                CoreError::ConfigError("available system memory reported as 0".to_string()).into(),
            );
        }
        let budget = (available as f64 * self.memory_fraction).floor() as u64;
        Ok(usize::try_from(budget).unwrap_or(usize::MAX))
    }

    /// Events per window that keep every worker's working set inside the budget.
    ///
    /// The result is at least 1 and never more than `n_events` (unless the
    /// dataset is empty).
    ///
    /// # Errors
    /// Returns an error if the memory budget cannot be resolved.
    pub fn resolve_batch_size(
        &self,
        n_events: usize,
        total_hits: usize,
        n_layers: usize,
    ) -> Result<usize> {
        let budget = self.resolve_budget_bytes()? / self.effective_parallelism();
        let per_event = bytes_per_event(n_events, total_hits, n_layers);
        let batch_size = max_events_for_budget(budget, per_event).min(n_events.max(1));
        log::debug!(
            "memory budget {budget} bytes per worker, {per_event} bytes per event -> batch_size {batch_size}"
        );
        Ok(batch_size)
    }

    /// Picks the aggregation strategy for a dataset of the given shape.
    ///
    /// # Errors
    /// Returns an error if the memory budget cannot be resolved.
    pub fn strategy(
        &self,
        n_events: usize,
        total_hits: usize,
        n_layers: usize,
    ) -> Result<AggregationStrategy> {
        let batch_size = self.resolve_batch_size(n_events, total_hits, n_layers)?;
        let threads = self.effective_parallelism();
        Ok(if threads > 1 {
            AggregationStrategy::Parallel {
                batch_size,
                threads,
            }
        } else {
            AggregationStrategy::Batched { batch_size }
        })
    }
}

/// Working set of one event: a sum and a count per layer cell, plus the
/// average hit payload (z and energy).
fn bytes_per_event(n_events: usize, total_hits: usize, n_layers: usize) -> usize {
    let avg_hits = total_hits.div_ceil(n_events.max(1));
    n_layers
        .saturating_mul(size_of::<f64>() + size_of::<usize>())
        .saturating_add(avg_hits.saturating_mul(2 * size_of::<f64>()))
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn max_events_for_budget(budget_bytes: usize, bytes_per_event: usize) -> usize {
    let per_event = (bytes_per_event as f64 * MEMORY_OVERHEAD_FACTOR).ceil() as usize;
    let per_event = per_event.max(1);
    (budget_bytes / per_event).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_size_from_explicit_budget() {
        // 28 layers x 16 bytes + 10 hits x 16 bytes = 608 bytes, 730 with overhead.
        let per_event = bytes_per_event(100, 1000, 28);
        assert_eq!(per_event, 608);
        let config = OutOfCoreConfig::default().with_memory_budget_bytes(730 * 5);
        assert_eq!(config.resolve_batch_size(100, 1000, 28).unwrap(), 5);
    }

    #[test]
    fn batch_size_clamped() {
        let tiny = OutOfCoreConfig::default().with_memory_budget_bytes(1);
        assert_eq!(tiny.resolve_batch_size(10, 100, 4).unwrap(), 1);

        let huge = OutOfCoreConfig::default().with_memory_budget_bytes(usize::MAX);
        assert_eq!(huge.resolve_batch_size(10, 100, 4).unwrap(), 10);
        assert_eq!(huge.resolve_batch_size(0, 0, 0).unwrap(), 1);
    }

    #[test]
    fn budget_split_across_workers() {
        let config = OutOfCoreConfig::default()
            .with_memory_budget_bytes(730 * 8)
            .with_parallelism(4);
        assert_eq!(config.resolve_batch_size(100, 1000, 28).unwrap(), 2);
        assert_eq!(
            config.strategy(100, 1000, 28).unwrap(),
            AggregationStrategy::Parallel {
                batch_size: 2,
                threads: 4
            }
        );
    }

    #[test]
    fn single_thread_is_batched() {
        let config = OutOfCoreConfig::default().with_memory_budget_bytes(730 * 8);
        assert_eq!(
            config.strategy(100, 1000, 28).unwrap(),
            AggregationStrategy::Batched { batch_size: 8 }
        );
    }

    #[test]
    fn invalid_settings_rejected() {
        assert!(OutOfCoreConfig::default().try_with_parallelism(0).is_err());
        assert_eq!(
            OutOfCoreConfig::default()
                .with_parallelism(0)
                .effective_parallelism(),
            1
        );
        let config = OutOfCoreConfig::default().with_memory_fraction(1.5);
        assert!(config.resolve_budget_bytes().is_err());
    }
}
