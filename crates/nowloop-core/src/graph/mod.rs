//! The loop graph: clock, inputs and tracks behind one control surface.
//!
//! [`LoopGraph::builder`] returns two halves. [`LoopGraph`] stays on the
//! control thread and may be cloned freely; [`GraphProcessor`] is moved to the
//! audio thread and driven once per host callback.

mod command;
mod control;
mod processor;
mod registry;

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

pub use control::{LoopGraph, LoopGraphBuilder};
pub use processor::GraphProcessor;

use crate::clock::Clock;
use crate::config::GraphConfig;
use crate::metering::AtomicSignalStats;
use crate::stream::BufferAllocator;
use crate::time::{AudioSample, ContinuousDuration, Duration};

/// Lifecycle of a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphState {
    /// Not built yet, or shut down.
    Uninitialized,
    /// Built, waiting for the first audio callback.
    Initialized,
    /// The audio thread has processed at least one block.
    Running,
    /// The host delivered audio the graph cannot process.
    InError,
}

impl GraphState {
    fn to_u8(self) -> u8 {
        match self {
            GraphState::Uninitialized => 0,
            GraphState::Initialized => 1,
            GraphState::Running => 2,
            GraphState::InError => 3,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            1 => GraphState::Initialized,
            2 => GraphState::Running,
            3 => GraphState::InError,
            _ => GraphState::Uninitialized,
        }
    }
}

/// Static facts about the graph plus the most recent callback length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphInfo {
    pub sample_rate_hz: u32,
    pub channel_count: usize,
    pub bits_per_sample: u32,
    pub latency_in_samples: u32,
    /// Frames in the last host callback; 0 before the first.
    pub samples_per_quantum: usize,
}

/// Graph-wide values written by the audio thread.
pub(crate) struct GraphShared {
    state: AtomicU8,
    samples_per_quantum: AtomicUsize,
    output_stats: Arc<AtomicSignalStats>,
}

impl GraphShared {
    pub(crate) fn new(state: GraphState, output_stats: Arc<AtomicSignalStats>) -> Self {
        Self {
            state: AtomicU8::new(state.to_u8()),
            samples_per_quantum: AtomicUsize::new(0),
            output_stats,
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> GraphState {
        GraphState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: GraphState) {
        self.state.store(state.to_u8(), Ordering::Release);
    }

    /// Swap `from` for `to`; false if the state had already moved on.
    pub(crate) fn transition(&self, from: GraphState, to: GraphState) -> bool {
        self.state
            .compare_exchange(from.to_u8(), to.to_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn samples_per_quantum(&self) -> usize {
        self.samples_per_quantum.load(Ordering::Acquire)
    }

    pub(crate) fn set_samples_per_quantum(&self, frames: usize) {
        self.samples_per_quantum.store(frames, Ordering::Release);
    }

    pub(crate) fn output_stats(&self) -> &Arc<AtomicSignalStats> {
        &self.output_stats
    }
}

/// What every input and track of one graph shares: configuration, clock and block pool.
#[derive(Debug, Clone)]
pub struct GraphContext {
    config: Arc<GraphConfig>,
    clock: Arc<Clock>,
    allocator: Arc<BufferAllocator>,
}

impl GraphContext {
    /// Builds the clock and pre-allocates the block pool. `config` must already be valid.
    pub(crate) fn new(config: GraphConfig) -> Self {
        let clock = Arc::new(Clock::new(
            config.sample_rate_hz,
            config.output_channel_count,
            config.beats_per_minute,
            config.beats_per_measure,
        ));
        let allocator = Arc::new(BufferAllocator::new(config.block_len, config.block_pool_size));
        Self {
            config: Arc::new(config),
            clock,
            allocator,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<Clock> {
        &self.clock
    }

    pub fn allocator(&self) -> &Arc<BufferAllocator> {
        &self.allocator
    }

    /// Input history copied into the start of every new track.
    pub fn pre_recording(&self) -> Duration<AudioSample> {
        self.clock
            .seconds_to_samples(ContinuousDuration::new(self.config.pre_recording_secs))
    }

    /// Look-back kept by each input channel.
    pub fn input_history(&self) -> Duration<AudioSample> {
        self.clock
            .seconds_to_samples(ContinuousDuration::new(self.config.input_history_secs))
            .max(Duration::new(1))
    }

    /// Samples in each volume meter window.
    pub fn volume_window(&self) -> usize {
        self.clock
            .seconds_to_samples(ContinuousDuration::new(self.config.recent_volume_secs))
            .value()
            .max(1) as usize
    }
}
