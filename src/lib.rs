//! # Nowloop - Live Looper Core
//!
//! Beat-quantized recording and sample-accurate loop playback, driven from a
//! host audio callback.
//!
//! ## Architecture
//!
//! Nowloop is an umbrella crate over:
//! - **nowloop-core** - clock, sample streams, inputs, tracks and the loop graph
//!
//! ## Quick Start
//!
//! ```ignore
//! use nowloop::prelude::*;
//!
//! let (graph, mut processor) = LoopGraph::builder()
//!     .beats_per_minute(120.0)
//!     .build()?;
//!
//! // Hand `processor` to the audio thread and call it once per callback:
//! // processor.process(&[input], &mut interleaved_stereo_output);
//!
//! let track = graph.create_recording_track(AudioInputId::new(0))?;
//! // ... later
//! graph.finish_recording(track)?;
//! ```

/// Re-export of nowloop-core for direct access
pub use nowloop_core as core;

mod error;
pub use error::{Error, Result};

// Graph
pub use nowloop_core::{
    GraphConfig, GraphContext, GraphInfo, GraphProcessor, GraphState, InputChannels, LoopGraph,
    LoopGraphBuilder,
};

// Inputs and tracks
pub use nowloop_core::{AudioInputId, Input, InputInfo, TrackId, TrackInfo, TrackState};

// Time
pub use nowloop_core::{
    AudioSample, Beat, Clock, ContinuousDuration, Duration, Interval, Second, Time, TimeInfo,
};

// Metering and analysis
pub use nowloop_core::{FrequencyAnalyzer, FrequencyReader, FrequencyTracker, SignalStats};

// Sample storage
pub use nowloop_core::{BufferAllocator, Slice, SliceStream};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{
        AudioInputId, ContinuousDuration, Duration, GraphConfig, GraphProcessor, GraphState, Input,
        InputChannels, LoopGraph, LoopGraphBuilder, SignalStats, Time, TrackId, TrackState,
    };
}
