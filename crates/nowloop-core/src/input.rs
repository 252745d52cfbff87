//! Live inputs.
//!
//! Each input reads one or two host channels. On the audio thread it keeps a
//! bounded history of what it heard (the source for pre-recording), meters
//! it, and optionally pans it onto the output bus so the performer hears
//! themselves. [`Input`] is the control-thread handle.

use core::fmt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::analysis::{FrequencyReader, FrequencyTracker};
use crate::config::InputChannels;
use crate::graph::{GraphContext, LoopGraph};
use crate::histogram::SignalStats;
use crate::lockfree::{AtomicFlag, AtomicFloat};
use crate::metering::{AtomicSignalStats, MeasurementProcessor};
use crate::processor::{BlockProcessor, StereoBlock};
use crate::spatial::StereoPanner;
use crate::stream::SliceStream;
use crate::time::Time;
use crate::track::TrackId;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AudioInputId(u32);

impl AudioInputId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AudioInputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "input {}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputInfo {
    pub channels: InputChannels,
    pub pan: f32,
    pub volume: f32,
    pub monitoring: bool,
}

pub(crate) struct InputShared {
    id: AudioInputId,
    channels: InputChannels,
    pan: Arc<AtomicFloat>,
    volume: Arc<AtomicFloat>,
    monitoring: AtomicFlag,
    stats: Arc<AtomicSignalStats>,
    frequency: Option<Arc<dyn FrequencyReader>>,
}

impl InputShared {
    pub(crate) fn id(&self) -> AudioInputId {
        self.id
    }

    pub(crate) fn channels(&self) -> InputChannels {
        self.channels
    }

    pub(crate) fn info(&self) -> InputInfo {
        InputInfo {
            channels: self.channels,
            pan: self.pan.get(),
            volume: self.volume.get(),
            monitoring: self.monitoring.get(),
        }
    }

    pub(crate) fn signal_stats(&self) -> SignalStats {
        self.stats.get()
    }

    pub(crate) fn get_frequencies(&self, out: &mut [f32]) {
        if let Some(reader) = &self.frequency {
            reader.latest(out);
        }
    }
}

/// Audio-thread half of an input.
pub(crate) struct InputProcessor {
    shared: Arc<InputShared>,
    indices: [usize; 2],
    channel_count: usize,
    history: Vec<SliceStream>,
    panner: StereoPanner,
    meter: MeasurementProcessor,
}

impl InputProcessor {
    pub(crate) fn new(
        id: AudioInputId,
        channels: InputChannels,
        context: &GraphContext,
        frequency: Option<(Box<dyn FrequencyTracker>, Arc<dyn FrequencyReader>)>,
    ) -> Self {
        let config = context.config();
        let (tracker, reader) = match frequency {
            Some((tracker, reader)) => (Some(tracker), Some(reader)),
            None => (None, None),
        };
        let panner = StereoPanner::new(config.initial_pan, config.initial_volume);
        let meter = MeasurementProcessor::new(context.volume_window(), tracker);
        let (indices, channel_count) = channels.indices();

        let history = (0..channel_count)
            .map(|_| {
                SliceStream::with_max_buffered_duration(
                    Time::new(0),
                    context.allocator().clone(),
                    context.input_history(),
                )
            })
            .collect();

        let shared = Arc::new(InputShared {
            id,
            channels,
            pan: panner.pan().clone(),
            volume: panner.volume().clone(),
            monitoring: AtomicFlag::new(config.monitor_inputs),
            stats: meter.stats().clone(),
            frequency: reader,
        });

        Self {
            shared,
            indices,
            channel_count,
            history,
            panner,
            meter,
        }
    }

    pub(crate) fn shared(&self) -> &Arc<InputShared> {
        &self.shared
    }

    /// Recent input, one stream per channel.
    pub(crate) fn history(&self) -> &[SliceStream] {
        &self.history
    }

    /// This input's channels out of the host's planar input.
    pub(crate) fn source<'a>(&self, host: &[&'a [f32]]) -> ([&'a [f32]; 2], usize) {
        (
            [host[self.indices[0]], host[self.indices[1]]],
            self.channel_count,
        )
    }

    /// Record and meter one block. Returns whether `left`/`right` should be mixed into the bus.
    pub(crate) fn process(&mut self, host: &[&[f32]], left: &mut [f32], right: &mut [f32]) -> bool {
        let (source, count) = self.source(host);
        for (stream, samples) in self.history.iter_mut().zip(&source[..count]) {
            stream.append(samples);
        }

        left.copy_from_slice(source[0]);
        if count == 2 {
            right.copy_from_slice(source[1]);
        }

        let mut block = StereoBlock::new(left, right, count);
        self.meter.process_block(&mut block);
        if !self.shared.monitoring.get() {
            return false;
        }
        self.panner.process_block(&mut block);
        true
    }
}

/// Control-thread handle to one input of a [`LoopGraph`].
#[derive(Clone)]
pub struct Input {
    shared: Arc<InputShared>,
    graph: LoopGraph,
}

impl Input {
    pub(crate) fn new(shared: Arc<InputShared>, graph: LoopGraph) -> Self {
        Self { shared, graph }
    }

    pub fn id(&self) -> AudioInputId {
        self.shared.id
    }

    pub fn channels(&self) -> InputChannels {
        self.shared.channels
    }

    pub fn info(&self) -> InputInfo {
        self.shared.info()
    }

    pub fn set_pan(&self, pan: f32) {
        self.shared.pan.set(pan.clamp(0.0, 1.0));
    }

    pub fn set_volume(&self, volume: f32) {
        self.shared.volume.set(volume.max(0.0));
    }

    /// Whether this input is heard on the output bus.
    pub fn set_monitoring(&self, monitoring: bool) {
        self.shared.monitoring.set(monitoring);
    }

    pub fn signal_info(&self) -> SignalStats {
        self.shared.signal_stats()
    }

    /// No-op unless the graph has a frequency analyzer.
    pub fn get_frequencies(&self, out: &mut [f32]) {
        self.shared.get_frequencies(out);
    }

    /// Start a new track recording from this input.
    pub fn create_recording_track(&self) -> Result<TrackId> {
        self.graph.create_recording_track(self.id())
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Input")
            .field("id", &self.shared.id)
            .field("info", &self.shared.info())
            .finish()
    }
}
