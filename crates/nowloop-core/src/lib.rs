//! Real-time core of a live beat-quantized looper.
//!
//! # Primary API
//!
//! - [`LoopGraph`] / [`LoopGraphBuilder`]: control surface and entry point
//! - [`GraphProcessor`]: the half driven by the host audio callback
//! - [`Input`]: per-input monitoring, metering and track creation
//! - [`Clock`]: shared sample/beat timeline
//! - [`SliceStream`]: block-pooled append-only sample storage
//!
//! # Example
//!
//! ```ignore
//! use nowloop_core::{AudioInputId, LoopGraph};
//!
//! let (graph, mut processor) = LoopGraph::builder().beats_per_minute(120.0).build()?;
//!
//! // audio thread, once per host callback
//! processor.process(&[input_channel], &mut interleaved_output);
//!
//! // control thread
//! let track = graph.create_recording_track(AudioInputId::new(0))?;
//! graph.finish_recording(track)?;
//! ```

pub mod analysis;
pub mod clock;
pub mod config;
pub mod error;
pub mod graph;
pub mod histogram;
pub mod input;
pub(crate) mod lockfree;
pub mod metering;
pub mod processor;
pub mod spatial;
pub mod stream;
pub mod time;
pub mod track;

pub use analysis::{FrequencyAnalyzer, FrequencyReader, FrequencyTracker};
pub use clock::{Clock, TimeInfo};
pub use config::{GraphConfig, InputChannels};
pub use error::{Error, Result};
pub use graph::{GraphContext, GraphInfo, GraphProcessor, GraphState, LoopGraph, LoopGraphBuilder};
pub use histogram::{Histogram, SignalStats};
pub use input::{AudioInputId, Input, InputInfo};
pub use lockfree::{AtomicDouble, AtomicFlag, AtomicFloat};
pub use metering::{AtomicSignalStats, MeasurementProcessor};
pub use processor::{BlockProcessor, StereoBlock};
pub use spatial::StereoPanner;
pub use stream::{AudioBlock, BufferAllocator, Slice, SliceStream};
pub use time::{AudioSample, Beat, ContinuousDuration, Duration, Interval, Second, Time, Unit};
pub use track::{is_quantized, next_beat_duration, TrackId, TrackInfo, TrackState};
