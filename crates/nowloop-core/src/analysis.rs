//! Boundary to an external frequency analyzer.
//!
//! The looper does not do spectral analysis itself. When a
//! [`FrequencyAnalyzer`] is installed on the graph, every input and track gets
//! its own tracker/reader pair: the tracker is fed on the audio thread, the
//! reader is queried from the control thread.

use std::sync::Arc;

/// Audio-thread half. Receives every measured block.
pub trait FrequencyTracker: Send {
    fn record(&mut self, samples: &[f32]);
}

/// Control-thread half. Publishes the tracker's latest result.
pub trait FrequencyReader: Send + Sync {
    /// Write the latest bins into `out`; bins past the analyzer's count are left as they are.
    fn latest(&self, out: &mut [f32]);
}

/// Creates tracker/reader pairs, one per measured signal.
pub trait FrequencyAnalyzer: Send + Sync {
    fn create(&self) -> (Box<dyn FrequencyTracker>, Arc<dyn FrequencyReader>);
}
