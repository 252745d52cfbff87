//! Lock-free signal metering.

use std::sync::Arc;

use crate::analysis::FrequencyTracker;
use crate::histogram::{Histogram, SignalStats};
use crate::lockfree::AtomicFloat;
use crate::processor::{BlockProcessor, StereoBlock};

/// Lock-free storage for one [`SignalStats`] snapshot.
///
/// The three fields are stored separately, so a reader racing a writer may
/// see a mix of two consecutive snapshots.
#[derive(Debug, Default)]
pub struct AtomicSignalStats {
    min: AtomicFloat,
    max: AtomicFloat,
    average: AtomicFloat,
}

impl AtomicSignalStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self) -> SignalStats {
        SignalStats {
            min: self.min.get(),
            max: self.max.get(),
            average: self.average.get(),
        }
    }

    #[inline]
    pub fn set(&self, stats: SignalStats) {
        self.min.set(stats.min);
        self.max.set(stats.max);
        self.average.set(stats.average);
    }
}

/// Tracks recent absolute volume of the first channel and publishes it each block.
pub struct MeasurementProcessor {
    volume: Histogram,
    stats: Arc<AtomicSignalStats>,
    frequency: Option<Box<dyn FrequencyTracker>>,
}

impl MeasurementProcessor {
    pub fn new(window: usize, frequency: Option<Box<dyn FrequencyTracker>>) -> Self {
        Self {
            volume: Histogram::new(window),
            stats: Arc::new(AtomicSignalStats::new()),
            frequency,
        }
    }

    /// Published snapshot, for the control thread.
    pub fn stats(&self) -> &Arc<AtomicSignalStats> {
        &self.stats
    }

    pub fn measure(&mut self, samples: &[f32]) {
        self.volume.add_all(samples, true);
        if let Some(tracker) = self.frequency.as_mut() {
            tracker.record(samples);
        }
        self.stats.set(self.volume.stats());
    }
}

impl BlockProcessor for MeasurementProcessor {
    fn process_block(&mut self, block: &mut StereoBlock<'_>) {
        self.measure(block.left);
    }
}
